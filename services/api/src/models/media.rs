//! Asset model for the captioning session

use bytes::Bytes;
use chrono::{DateTime, Utc};
use common::{CaptionSet, MediaKind};
use media::MediaSource;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

static UNSAFE_ID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

/// Opaque asset identifier, unique for the lifetime of the session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Derive an identifier from the file name, its modification time and a random component
    pub fn generate(file_name: &str, last_modified: DateTime<Utc>) -> Self {
        let name = UNSAFE_ID_CHARS.replace_all(file_name, "_");
        Self(format!(
            "{}-{}-{:016x}",
            name,
            last_modified.timestamp_millis(),
            rand::random::<u64>()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Uploaded bytes persisted in the session directory
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

/// One uploaded image or video tracked by the session
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: AssetId,
    pub source: Arc<SourceFile>,
    pub media_kind: MediaKind,
    /// Extracted still frame (videos only; `None` when extraction failed)
    pub poster: Option<Bytes>,
    pub captions: Option<CaptionSet>,
}

impl Asset {
    pub fn new(
        id: AssetId,
        source: Arc<SourceFile>,
        media_kind: MediaKind,
        poster: Option<Bytes>,
    ) -> Self {
        Self {
            id,
            source,
            media_kind,
            poster,
            captions: None,
        }
    }

    pub fn preview_url(&self) -> String {
        format!("/assets/{}/preview", self.id)
    }

    /// Still-frame URL; falls back to the preview when no frame was extracted
    pub fn poster_url(&self) -> String {
        match self.poster {
            Some(_) => format!("/assets/{}/poster", self.id),
            None => self.preview_url(),
        }
    }

    /// Handle passed to the captioning client
    pub fn media_source(&self) -> MediaSource {
        MediaSource {
            path: self.source.path.clone(),
            file_name: self.source.file_name.clone(),
            mime_type: self.source.mime_type.clone(),
            kind: self.media_kind,
        }
    }
}
