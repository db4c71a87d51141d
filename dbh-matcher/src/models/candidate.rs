//! Catalog-side search hits
//!
//! Every catalog adapter normalizes its own payload into `SearchCandidate`,
//! so scoring and quality selection never see catalog-specific shapes.

use serde::{Deserialize, Serialize};

/// Audio quality advertised by the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioQuality {
    /// Maximum sampling rate in kHz
    pub sampling_rate: f64,
    pub bit_depth: u32,
    pub is_hi_res: bool,
}

/// A catalog-side hit, used only transiently during matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Destination catalog id (numeric ids are stringified)
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub audio_quality: AudioQuality,
}

impl SearchCandidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_secs: None,
            audio_quality: AudioQuality::default(),
        }
    }

    pub fn with_quality(mut self, sampling_rate: f64, bit_depth: u32) -> Self {
        self.audio_quality = AudioQuality {
            sampling_rate,
            bit_depth,
            is_hi_res: sampling_rate > 48.0 || bit_depth > 16,
        };
        self
    }

    /// Whether the catalog returned a usable id
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Lower-cased `artist title`, the string fuzzy queries are scored against
    pub fn match_text(&self) -> String {
        format!("{} {}", self.artist.trim(), self.title.trim()).to_lowercase()
    }
}
