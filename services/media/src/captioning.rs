//! Captioning client for the Gemini generative model
//!
//! One call per asset: build a still-image payload, embed the generation
//! options in a natural-language instruction, and parse the structured JSON
//! reply into a complete [`CaptionSet`] with freshly minted identifiers.

use crate::error::CaptionError;
use crate::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
    RawCaptions, caption_response_schema,
};
use crate::models::{Frame, MediaSource};
use crate::thumbnail_generator::FrameExtractor;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::config::GeminiConfig;
use common::{CaptionOptions, CaptionSet, MediaKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Generates a caption set for one media file
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn generate(
        &self,
        source: &MediaSource,
        options: &CaptionOptions,
    ) -> Result<CaptionSet, CaptionError>;
}

/// Gemini-backed captioner
#[derive(Clone)]
pub struct GeminiCaptioner {
    http_client: reqwest::Client,
    config: GeminiConfig,
    frames: Arc<dyn FrameExtractor>,
}

impl GeminiCaptioner {
    pub fn new(config: GeminiConfig, frames: Arc<dyn FrameExtractor>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client for Gemini API: {}", e))?;

        Ok(Self {
            http_client,
            config,
            frames,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Inline image part for the request: the file itself, or a frame for videos
    async fn image_part(&self, source: &MediaSource) -> Result<InlineData, CaptionError> {
        match source.kind {
            MediaKind::Image => {
                let bytes = tokio::fs::read(&source.path)
                    .await
                    .map_err(CaptionError::SourceRead)?;
                Ok(InlineData {
                    mime_type: source.mime_type.clone(),
                    data: STANDARD.encode(bytes),
                })
            }
            MediaKind::Video => {
                let frame = self.frames.extract_frame(&source.path).await?;
                Ok(InlineData {
                    mime_type: Frame::MIME_TYPE.to_string(),
                    data: frame.to_base64(),
                })
            }
        }
    }
}

#[async_trait]
impl Captioner for GeminiCaptioner {
    async fn generate(
        &self,
        source: &MediaSource,
        options: &CaptionOptions,
    ) -> Result<CaptionSet, CaptionError> {
        info!("Generating captions for {}", source.file_name);

        let image = self.image_part(source).await?;
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData(image),
                    Part::Text(build_prompt(source.kind, options)),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: caption_response_schema(),
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini API call failed: {} - {}", status, body);
            return Err(CaptionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        let captions = parse_captions(&body)?;
        debug!("Captions generated for {}", source.file_name);
        Ok(captions)
    }
}

/// Instruction text embedding tone, length, language and hashtag policy
pub fn build_prompt(kind: MediaKind, options: &CaptionOptions) -> String {
    let subject = match kind {
        MediaKind::Image => "image",
        MediaKind::Video => "video still frame",
    };

    format!(
        "Analyze this {subject}. Generate a set of captions with the following characteristics:\n\
         - Tone: {tone}\n\
         - Length: {length}\n\
         - Language: {language}\n\
         \n\
         Provide one short caption (1-2 sentences), one long caption (3-4 sentences), \
         a list of {hashtags} relevant hashtags, and a concise SEO title.\n\
         The content is about: [the visual elements, mood, and subject of the image/video frame].\n\
         Structure your response strictly according to the provided JSON schema.",
        tone = options.tone,
        length = options.length,
        language = options.language,
        hashtags = options.hashtag_range(),
    )
}

/// Parse a model reply into a complete caption set; partial replies are errors
pub(crate) fn parse_captions(
    response: &GenerateContentResponse,
) -> Result<CaptionSet, CaptionError> {
    let text = response
        .text()
        .ok_or_else(|| CaptionError::EmptyResponse(response.empty_reason()))?;

    let raw: RawCaptions =
        serde_json::from_str(text.trim()).map_err(CaptionError::MalformedResponse)?;

    Ok(CaptionSet::from_texts(
        raw.seo_title.text,
        raw.short.text,
        raw.long.text,
        raw.hashtags.text,
    ))
}
