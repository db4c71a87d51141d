//! dbh-matcher library interface
//!
//! Resolves tracks from Spotify, YouTube or CSV exports to DAB catalog ids.
//! Resolutions are cached in a local SQLite registry so repeated conversions
//! of the same track never hit the network.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::engine::MatcherEngine;
pub use crate::error::{MatcherError, MatcherResult};
pub use crate::models::{MatchResult, MatchStatus, MatchingMode, TrackDescriptor};
pub use crate::services::MatchResolver;
