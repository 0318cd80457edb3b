//! Media library for the Kipton captioning service
//!
//! Still-frame extraction for videos (via `ffprobe`/`ffmpeg`) and the
//! captioning client that submits a still image to the generative model.

pub mod captioning;
pub mod error;
mod gemini;
pub mod metadata_extractor;
pub mod models;
pub mod thumbnail_generator;

pub use captioning::{Captioner, GeminiCaptioner, build_prompt};
pub use error::{CaptionError, FrameError};
pub use models::{Frame, MediaSource, VideoProbe};
pub use thumbnail_generator::{FrameExtractor, ThumbnailGenerator, seek_position};
