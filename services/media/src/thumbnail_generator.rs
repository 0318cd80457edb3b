use crate::error::FrameError;
use crate::metadata_extractor::MetadataExtractor;
use crate::models::Frame;
use async_trait::async_trait;
use bytes::Bytes;
use common::config::FrameConfig;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Produces a representative still frame for a video
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frame(&self, video_path: &Path) -> Result<Frame, FrameError>;
}

/// Seek offset for a clip of the given duration.
///
/// Clips of unknown length are sampled at `preferred`. Known durations are
/// sampled at `preferred` or the midpoint, whichever is earlier, so the seek
/// always lands strictly inside the content.
pub fn seek_position(duration: Option<f64>, preferred: f64) -> f64 {
    match duration {
        Some(d) if d.is_finite() => preferred.min(d / 2.0).max(0.0),
        _ => preferred,
    }
}

/// Frame extractor backed by the `ffprobe` and `ffmpeg` executables
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    metadata: MetadataExtractor,
    ffmpeg_path: String,
    seek_seconds: f64,
}

impl ThumbnailGenerator {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            metadata: MetadataExtractor::new(config.ffprobe_path.clone()),
            ffmpeg_path: config.ffmpeg_path.clone(),
            seek_seconds: config.seek_seconds,
        }
    }

    fn ffmpeg_args(video_path: &Path, seek: f64) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format!("{:.3}", seek),
            "-i".to_string(),
            video_path.to_string_lossy().into_owned(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-vcodec".to_string(),
            "mjpeg".to_string(),
            "-".to_string(),
        ]
    }

    async fn render_frame(&self, video_path: &Path, seek: f64) -> Result<Bytes, FrameError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(Self::ffmpeg_args(video_path, seek))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FrameError::Spawn {
                tool: self.ffmpeg_path.clone(),
                source,
            })?;

        if !output.status.success() {
            error!("FFmpeg failed with status: {:?}", output.status);
            return Err(FrameError::Ffmpeg {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if output.stdout.is_empty() {
            return Err(FrameError::EmptyFrame);
        }

        Ok(Bytes::from(output.stdout))
    }
}

#[async_trait]
impl FrameExtractor for ThumbnailGenerator {
    async fn extract_frame(&self, video_path: &Path) -> Result<Frame, FrameError> {
        info!("Extracting still frame from video: {}", video_path.display());

        // A failed probe only costs us the clamp.
        let probe = match self.metadata.probe(video_path).await {
            Ok(probe) => probe,
            Err(e) => {
                warn!("Could not probe {}: {}", video_path.display(), e);
                Default::default()
            }
        };

        let seek = seek_position(probe.duration, self.seek_seconds);
        let jpeg = self.render_frame(video_path, seek).await?;

        if let (Some(width), Some(height)) = (probe.width, probe.height) {
            debug!("Extracted {}x{} frame at {:.3}s", width, height, seek);
        }

        Ok(Frame { jpeg })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_position_uses_preferred_for_long_clips() {
        assert_eq!(seek_position(Some(30.0), 1.0), 1.0);
        assert_eq!(seek_position(Some(2.0), 1.0), 1.0);
    }

    #[test]
    fn test_seek_position_stays_inside_clips_near_preferred() {
        assert_eq!(seek_position(Some(1.0), 1.0), 0.5);
        let seek = seek_position(Some(1.01), 1.0);
        assert!(seek < 1.0);
        assert!((seek - 0.505).abs() < 1e-9);
        assert!(seek_position(Some(1.5), 1.0) < 1.5);
    }

    #[test]
    fn test_seek_position_clamps_short_clips_to_midpoint() {
        assert_eq!(seek_position(Some(0.5), 1.0), 0.25);
        assert_eq!(seek_position(Some(0.0), 1.0), 0.0);
        assert_eq!(seek_position(Some(-3.0), 1.0), 0.0);
    }

    #[test]
    fn test_seek_position_unknown_duration() {
        assert_eq!(seek_position(None, 1.0), 1.0);
        assert_eq!(seek_position(Some(f64::NAN), 1.0), 1.0);
    }

    #[test]
    fn test_ffmpeg_args_pipe_a_single_jpeg() {
        let args = ThumbnailGenerator::ffmpeg_args(Path::new("/tmp/clip.mp4"), 0.25);
        let joined = args.join(" ");
        assert_eq!(
            joined,
            "-v error -ss 0.250 -i /tmp/clip.mp4 -frames:v 1 -f image2pipe -vcodec mjpeg -"
        );
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_reports_spawn_error() {
        let generator = ThumbnailGenerator::new(&FrameConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            seek_seconds: 1.0,
        });

        let result = generator.extract_frame(Path::new("/tmp/missing.mp4")).await;
        assert!(matches!(result, Err(FrameError::Spawn { .. })));
    }
}
