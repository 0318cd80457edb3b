//! Stand-ins for the frame extractor and captioner used by unit tests

use async_trait::async_trait;
use bytes::Bytes;
use common::{CaptionOptions, CaptionSet};
use media::{CaptionError, Captioner, Frame, FrameError, FrameExtractor, MediaSource};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::state::AppState;

pub const JPEG_STUB: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

/// Returns a fixed JPEG, or fails for every video when built with `failing`
pub struct StubFrames {
    fail: bool,
}

impl StubFrames {
    pub fn working() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl FrameExtractor for StubFrames {
    async fn extract_frame(&self, _video_path: &Path) -> Result<Frame, FrameError> {
        if self.fail {
            return Err(FrameError::EmptyFrame);
        }
        Ok(Frame {
            jpeg: Bytes::from_static(JPEG_STUB),
        })
    }
}

/// Captioner whose outcome and latency are scripted per file name
#[derive(Default)]
pub struct ScriptedCaptioner {
    failures: HashSet<String>,
    panics: HashSet<String>,
    delays: HashMap<String, Duration>,
    language_delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCaptioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, file_name: &str) -> Self {
        self.failures.insert(file_name.to_string());
        self
    }

    pub fn panic_on(mut self, file_name: &str) -> Self {
        self.panics.insert(file_name.to_string());
        self
    }

    pub fn delay_language(mut self, language: &str, delay: Duration) -> Self {
        self.language_delays.insert(language.to_string(), delay);
        self
    }

    pub fn delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Captioner for ScriptedCaptioner {
    async fn generate(
        &self,
        source: &MediaSource,
        options: &CaptionOptions,
    ) -> Result<CaptionSet, CaptionError> {
        self.calls.lock().unwrap().push(source.file_name.clone());

        let delay = self
            .delays
            .get(&source.file_name)
            .or_else(|| self.language_delays.get(&options.language));
        if let Some(delay) = delay {
            tokio::time::sleep(*delay).await;
        }
        if self.panics.contains(&source.file_name) {
            panic!("scripted panic for {}", source.file_name);
        }
        if self.failures.contains(&source.file_name) {
            return Err(CaptionError::FrameExtraction(FrameError::EmptyFrame));
        }

        Ok(CaptionSet::from_texts(
            format!("Title for {}", source.file_name),
            format!("Short {} caption", options.tone),
            format!("Long caption in {}", options.language),
            "#one #two #three",
        ))
    }
}

pub fn app_state(frames: StubFrames, captioner: Arc<ScriptedCaptioner>) -> AppState {
    AppState::new(Arc::new(frames), captioner).unwrap()
}
