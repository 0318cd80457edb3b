//! Wire types for the Gemini `generateContent` endpoint

use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<Content>,
    pub(crate) generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Content {
    pub(crate) parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Part {
    Text(String),
    InlineData(InlineData),
}

/// Gemini inline data for images
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub(crate) mime_type: String,
    pub(crate) data: String, // base64-encoded
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub(crate) response_mime_type: String,
    pub(crate) response_schema: serde_json::Value,
    pub(crate) temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub(crate) content: Option<CandidateContent>,
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CandidatePart {
    pub(crate) text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub(crate) block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any
    pub(crate) fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }

    /// Why no text came back, for error reporting
    pub(crate) fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("prompt blocked: {}", reason);
        }
        match self.candidates.first() {
            None => "no candidates".to_string(),
            Some(candidate) => match candidate.finish_reason.as_deref() {
                Some(reason) => format!("finish reason {}", reason),
                None => "empty candidate".to_string(),
            },
        }
    }
}

/// Caption object the model is asked to return
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCaptions {
    pub(crate) short: RawCaption,
    pub(crate) long: RawCaption,
    pub(crate) hashtags: RawCaption,
    #[serde(rename = "seoTitle")]
    pub(crate) seo_title: RawCaption,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCaption {
    pub(crate) text: String,
}

/// Response schema requiring all four caption slots
pub(crate) fn caption_response_schema() -> serde_json::Value {
    let slot = |description: Option<&str>| {
        let mut text = json!({ "type": "STRING" });
        if let Some(description) = description {
            text["description"] = json!(description);
        }
        json!({
            "type": "OBJECT",
            "properties": { "text": text },
            "required": ["text"]
        })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "short": slot(None),
            "long": slot(None),
            "hashtags": slot(Some("A space-separated list of relevant hashtags, starting with #")),
            "seoTitle": slot(Some("A catchy, SEO-friendly title under 60 characters.")),
        },
        "required": ["short", "long", "hashtags", "seoTitle"]
    })
}
