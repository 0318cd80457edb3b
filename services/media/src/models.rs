use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use common::MediaKind;
use std::path::PathBuf;

/// Facts about a video read by ffprobe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoProbe {
    /// Duration in seconds
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A still frame encoded as JPEG
#[derive(Debug, Clone)]
pub struct Frame {
    pub jpeg: Bytes,
}

impl Frame {
    pub const MIME_TYPE: &'static str = "image/jpeg";

    /// Inline encoding used when submitting the frame to the model
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

/// A file on disk to be captioned
#[derive(Debug, Clone)]
pub struct MediaSource {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub kind: MediaKind,
}
