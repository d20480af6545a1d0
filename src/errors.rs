use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Goal not found: {id}")]
    GoalNotFound { id: i64 },

    #[error("No financial profile found for user {user_id}")]
    ProfileNotFound { user_id: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("A contribution with transaction id '{transaction_id}' already exists")]
    DuplicateTransaction { transaction_id: String },

    #[error("Upstream service error: {message}")]
    Upstream { message: String },

    #[error("Upstream service did not answer within {seconds}s")]
    UpstreamTimeout { seconds: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::Upstream`] with the given message.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
