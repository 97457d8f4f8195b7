//! SQLite persistence for load tracking.

pub mod db;
pub mod loads;

pub use db::{init_database, Database};
