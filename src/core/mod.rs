//! Core module - Framework-agnostic business logic.
//! Nothing here knows about HTTP; handlers in `api` call into these functions
//! and external services are reached through the traits defined here.

pub mod budget;
pub mod contribution;
pub mod expense;
pub mod goal;
pub mod profile;
pub mod recommendation;
pub mod reconcile;
pub mod targets;
