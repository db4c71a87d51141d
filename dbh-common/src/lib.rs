//! # DBH Common Library
//!
//! Shared code for the DBH track matcher:
//! - Error type used by configuration and database setup
//! - TOML bootstrap configuration and root folder resolution
//! - SQLite initialization (WAL mode, registry schema)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
