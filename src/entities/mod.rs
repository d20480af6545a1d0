//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod expense;
pub mod financial_profile;
pub mod goal;
pub mod goal_contribution;

// Re-export specific types to avoid conflicts
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use financial_profile::{
    Column as FinancialProfileColumn, Entity as FinancialProfile, Model as FinancialProfileModel,
};
pub use goal::{Column as GoalColumn, Entity as Goal, GoalStatus, Model as GoalModel};
pub use goal_contribution::{
    Column as GoalContributionColumn, Entity as GoalContribution, Model as GoalContributionModel,
    PaymentMethod,
};
