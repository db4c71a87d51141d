//! Data models for track resolution

pub mod candidate;
pub mod isrc;
pub mod match_result;
pub mod registry;
pub mod track;

pub use candidate::{AudioQuality, SearchCandidate};
pub use isrc::Isrc;
pub use match_result::{MatchResult, MatchSource, MatchStatus, MatchingMode};
pub use registry::{RegistryEntry, RegistryKey};
pub use track::{SourcePlatform, TrackDescriptor};
