//! Registry rows and lookup keys

use crate::models::{Isrc, SourcePlatform, TrackDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the three ways a registry row can be reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryKey {
    Spotify(String),
    Youtube(String),
    Isrc(Isrc),
}

impl RegistryKey {
    /// Key for a descriptor's own platform id, if that platform has a column
    pub fn for_source(platform: SourcePlatform, source_id: &str) -> Option<Self> {
        let source_id = source_id.trim();
        if source_id.is_empty() {
            return None;
        }

        match platform {
            SourcePlatform::Spotify => Some(RegistryKey::Spotify(source_id.to_string())),
            SourcePlatform::Youtube => Some(RegistryKey::Youtube(source_id.to_string())),
            SourcePlatform::Csv => None,
        }
    }

    /// Registry column holding this key type
    pub fn column(&self) -> &'static str {
        match self {
            RegistryKey::Spotify(_) => "spotify_id",
            RegistryKey::Youtube(_) => "youtube_id",
            RegistryKey::Isrc(_) => "isrc",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            RegistryKey::Spotify(id) | RegistryKey::Youtube(id) => id,
            RegistryKey::Isrc(isrc) => isrc.as_str(),
        }
    }
}

/// Persisted mapping, keyed by the destination catalog id
///
/// Empty strings mean "not known yet"; merges only ever fill them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub target_id: String,
    pub isrc: String,
    pub spotify_id: String,
    pub youtube_id: String,
    /// Set by the store on every write
    pub last_updated: Option<DateTime<Utc>>,
}

impl RegistryEntry {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            isrc: String::new(),
            spotify_id: String::new(),
            youtube_id: String::new(),
            last_updated: None,
        }
    }

    /// Entry carrying every identifier this descriptor can contribute
    pub fn for_track(target_id: impl Into<String>, track: &TrackDescriptor) -> Self {
        Self {
            target_id: target_id.into(),
            isrc: track.valid_isrc().map(String::from).unwrap_or_default(),
            spotify_id: track.source_id_for(SourcePlatform::Spotify).to_string(),
            youtube_id: track.source_id_for(SourcePlatform::Youtube).to_string(),
            last_updated: None,
        }
    }

    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = isrc.into();
        self
    }

    pub fn with_spotify_id(mut self, id: impl Into<String>) -> Self {
        self.spotify_id = id.into();
        self
    }

    pub fn with_youtube_id(mut self, id: impl Into<String>) -> Self {
        self.youtube_id = id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_source() {
        assert_eq!(
            RegistryKey::for_source(SourcePlatform::Spotify, "abc"),
            Some(RegistryKey::Spotify("abc".to_string()))
        );
        assert_eq!(RegistryKey::for_source(SourcePlatform::Youtube, "  "), None);
        assert_eq!(RegistryKey::for_source(SourcePlatform::Csv, "row-1"), None);
    }

    #[test]
    fn test_entry_for_youtube_track() {
        let track = TrackDescriptor::new("t", "a", SourcePlatform::Youtube, "yt1")
            .with_isrc("usum71921131");
        let entry = RegistryEntry::for_track("99", &track);

        assert_eq!(entry.target_id, "99");
        assert_eq!(entry.isrc, "USUM71921131");
        assert_eq!(entry.youtube_id, "yt1");
        assert_eq!(entry.spotify_id, "");
    }

    #[test]
    fn test_entry_for_csv_track_drops_invalid_isrc() {
        let track = TrackDescriptor::new("t", "a", SourcePlatform::Csv, "").with_isrc("???");
        let entry = RegistryEntry::for_track("7", &track);

        assert_eq!(entry.isrc, "");
        assert_eq!(entry.spotify_id, "");
        assert_eq!(entry.youtube_id, "");
    }
}
