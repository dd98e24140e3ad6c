//! Storage module for database and configuration.

pub mod config;
pub mod database;
pub mod schema;

pub use config::{load_settings, save_settings, ConfigError, Settings};
pub use database::{Database, DatabaseError};
