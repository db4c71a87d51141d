//! Track descriptors supplied by the extractors

use crate::models::Isrc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform a track descriptor was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePlatform {
    Spotify,
    Youtube,
    Csv,
}

impl SourcePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourcePlatform::Spotify => "spotify",
            SourcePlatform::Youtube => "youtube",
            SourcePlatform::Csv => "csv",
        }
    }

    /// Video titles and spreadsheet rows rarely carry an ISRC, Spotify
    /// metadata usually does.
    pub fn typically_lacks_isrc(&self) -> bool {
        matches!(self, SourcePlatform::Youtube | SourcePlatform::Csv)
    }
}

impl fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourcePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spotify" => Ok(SourcePlatform::Spotify),
            "youtube" => Ok(SourcePlatform::Youtube),
            "csv" => Ok(SourcePlatform::Csv),
            other => Err(format!("Unsupported source platform: {}", other)),
        }
    }
}

/// The unit being resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub title: String,
    pub artist: String,
    /// Advisory only, never used for matching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Raw ISRC as extracted (may be malformed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(alias = "type")]
    pub source_platform: SourcePlatform,
    /// Platform-native id, empty for CSV-only rows
    #[serde(default)]
    pub source_id: String,
}

impl TrackDescriptor {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        source_platform: SourcePlatform,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            isrc: None,
            source_platform,
            source_id: source_id.into(),
        }
    }

    pub fn with_isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = Some(isrc.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// The ISRC if present and well-formed
    pub fn valid_isrc(&self) -> Option<Isrc> {
        self.isrc.as_deref().and_then(|raw| Isrc::parse(raw).ok())
    }

    /// Id for the given platform, empty when the descriptor came from elsewhere
    pub fn source_id_for(&self, platform: SourcePlatform) -> &str {
        if self.source_platform == platform {
            self.source_id.trim()
        } else {
            ""
        }
    }
}
