use crate::error::FrameError;
use crate::models::VideoProbe;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error};

/// Reads container and stream facts from a video with `ffprobe`
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    ffprobe_path: String,
}

impl MetadataExtractor {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub async fn probe(&self, video_path: &Path) -> Result<VideoProbe, FrameError> {
        debug!("Probing video: {}", video_path.display());

        let output = Command::new(&self.ffprobe_path)
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(video_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FrameError::Spawn {
                tool: self.ffprobe_path.clone(),
                source,
            })?;

        if !output.status.success() {
            error!("ffprobe failed with status: {:?}", output.status);
            return Err(FrameError::Probe(format!(
                "ffprobe exited with {}",
                output.status
            )));
        }

        let ffprobe_data: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| FrameError::Probe(format!("unreadable ffprobe output: {}", e)))?;

        Ok(Self::parse_ffprobe_output(&ffprobe_data))
    }

    pub(crate) fn parse_ffprobe_output(ffprobe_data: &serde_json::Value) -> VideoProbe {
        let mut probe = VideoProbe::default();

        if let Some(format) = ffprobe_data.get("format") {
            probe.duration = format
                .get("duration")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d >= 0.0);
        }

        // First video stream wins; audio-only streams are ignored.
        if let Some(streams) = ffprobe_data.get("streams").and_then(|v| v.as_array()) {
            let video = streams
                .iter()
                .find(|s| s.get("codec_type").and_then(|v| v.as_str()) == Some("video"));

            if let Some(stream) = video {
                probe.width = stream
                    .get("width")
                    .and_then(|v| v.as_u64())
                    .map(|w| w as u32);
                probe.height = stream
                    .get("height")
                    .and_then(|v| v.as_u64())
                    .map(|h| h as u32);

                // Some containers only report duration per stream.
                if probe.duration.is_none() {
                    probe.duration = stream
                        .get("duration")
                        .and_then(|v| v.as_str())
                        .and_then(|s| s.parse::<f64>().ok())
                        .filter(|d| d.is_finite() && *d >= 0.0);
                }
            }
        }

        probe
    }
}
