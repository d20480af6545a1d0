//! Database configuration module for `GoalBuddy`.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{Expense, FinancialProfile, Goal, GoalContribution};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default database location when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/goal_buddy.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Creates the parent directory of a file-backed `SQLite` URL, if there is one.
fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    ensure_sqlite_parent_dir(&database_url)?;
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions, skipping those that already exist.
///
/// `goals` is created before `goal_contributions` so the foreign key can be resolved.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(Goal),
        schema.create_table_from_entity(GoalContribution),
        schema.create_table_from_entity(FinancialProfile),
        schema.create_table_from_entity(Expense),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ExpenseModel, FinancialProfileModel, GoalContributionModel, GoalModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<GoalModel> = Goal::find().limit(1).all(&db).await?;
        let _: Vec<GoalContributionModel> = GoalContribution::find().limit(1).all(&db).await?;
        let _: Vec<FinancialProfileModel> = FinancialProfile::find().limit(1).all(&db).await?;
        let _: Vec<ExpenseModel> = Expense::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let goals: Vec<GoalModel> = Goal::find().all(&db).await?;
        assert!(goals.is_empty());
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_parent_dir_ignores_memory_and_bare_files() -> Result<()> {
        ensure_sqlite_parent_dir("sqlite::memory:")?;
        ensure_sqlite_parent_dir("sqlite://plain.sqlite?mode=rwc")?;
        ensure_sqlite_parent_dir("postgres://user@host/db")?;
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_parent_dir_creates_directory() -> Result<()> {
        let root = std::env::temp_dir().join(format!("goal_buddy_test_{}", std::process::id()));
        let url = format!("sqlite://{}/nested/db.sqlite?mode=rwc", root.display());

        ensure_sqlite_parent_dir(&url)?;
        assert!(root.join("nested").is_dir());

        std::fs::remove_dir_all(&root)?;
        Ok(())
    }
}
