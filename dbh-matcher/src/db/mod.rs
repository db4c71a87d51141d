//! Database access for dbh-matcher

pub mod registry;

pub use registry::TrackRegistry;
