use serde::{Deserialize, Serialize};
use std::fmt;

// === API Request Models ===

/// The JSON body for a `POST /api/get-formats` request.
///
/// `url` is optional at the serde level so that a missing field reaches the
/// handler's own validation instead of being rejected by the extractor.
#[derive(Deserialize, Debug)]
pub struct FormatsRequest {
    pub url: Option<String>,
}

/// The JSON body for a `POST /api/download-selected-format` request.
#[derive(Deserialize, Debug)]
pub struct DownloadRequest {
    pub url: Option<String>,
    pub resolution: Option<Resolution>,
}

/// A requested resolution ceiling. Clients send either a bare number (720)
/// or a string ("720"); the value is passed through verbatim into the
/// format selector.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Resolution {
    Pixels(u64),
    Label(String),
}

impl Resolution {
    /// True when the value is effectively missing (zero, or a blank string).
    pub fn is_unset(&self) -> bool {
        match self {
            Resolution::Pixels(p) => *p == 0,
            Resolution::Label(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Pixels(p) => write!(f, "{}", p),
            Resolution::Label(s) => write!(f, "{}", s.trim()),
        }
    }
}

// === yt-dlp Ingest Models ===

/// Top-level metadata from `yt-dlp --dump-json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// One download option as reported by yt-dlp.
///
/// Every field except `format_id`/`ext` is lenient: format entries vary
/// wildly between extractors and most fields can be missing.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    /// Vertical pixel height; absent for audio-only and storyboard formats.
    #[serde(default)]
    pub height: Option<u32>,
    /// The literal string "none" marks an audio-only format.
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    /// Total bitrate in KBit/s.
    #[serde(default)]
    pub tbr: Option<f64>,
}

impl RawFormat {
    /// The exact size when known, otherwise the extractor's estimate.
    pub fn known_filesize(&self) -> Option<f64> {
        self.filesize.or(self.filesize_approx)
    }
}

// === API Response Models ===

/// One curated entry of the quality picker.
#[derive(Serialize, Debug)]
pub struct CuratedFormat {
    pub format_id: String,
    pub resolution: u32,
    pub ext: String,
    /// Human-readable size, "N/A" when the extractor reports none.
    pub filesize: String,
}

#[derive(Serialize, Debug)]
pub struct FormatsResponse {
    pub formats: Vec<CuratedFormat>,
    pub thumbnail_url: Option<String>,
}
