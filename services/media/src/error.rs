//! Error types for frame extraction and caption generation

use thiserror::Error;

/// Failure to produce a still frame from a video
#[derive(Error, Debug)]
pub enum FrameError {
    /// The external tool could not be started
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// ffprobe ran but its report could not be used
    #[error("Failed to probe video: {0}")]
    Probe(String),

    /// ffmpeg exited unsuccessfully
    #[error("FFmpeg failed with status {status}: {stderr}")]
    Ffmpeg { status: String, stderr: String },

    /// ffmpeg succeeded but produced no image data
    #[error("No frame could be decoded from the video")]
    EmptyFrame,
}

/// Failure of a single caption generation request
#[derive(Error, Debug)]
pub enum CaptionError {
    /// A video was submitted but no still frame could be produced for it
    #[error("Could not extract frame from video: {0}")]
    FrameExtraction(#[from] FrameError),

    /// The uploaded image could not be read back from disk
    #[error("Could not read source file: {0}")]
    SourceRead(#[source] std::io::Error),

    /// The request never produced an HTTP response
    #[error("Failed to reach the AI model: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("AI model request failed: {status} - {body}")]
    Service { status: u16, body: String },

    /// The response carried no text to parse
    #[error("AI model returned no captions: {0}")]
    EmptyResponse(String),

    /// The response text was not a complete caption object
    #[error("Failed to parse captions from the AI model: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}
