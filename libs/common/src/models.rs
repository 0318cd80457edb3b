//! Caption domain model shared across services

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// MIME types accepted at the upload boundary
pub const SUPPORTED_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "video/mp4",
    "video/webm",
];

/// Kind of uploaded media
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type, returning `None` for anything not accepted
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if !SUPPORTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return None;
        }

        if mime_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            Some(MediaKind::Video)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// One of the four named caption fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaptionSlot {
    #[serde(alias = "seoTitle")]
    SeoTitle,
    Short,
    Long,
    Hashtags,
}

impl CaptionSlot {
    /// Slots in export order
    pub const ALL: [CaptionSlot; 4] = [
        CaptionSlot::SeoTitle,
        CaptionSlot::Short,
        CaptionSlot::Long,
        CaptionSlot::Hashtags,
    ];

    /// Prefix used when minting caption identifiers
    pub fn id_prefix(&self) -> &'static str {
        match self {
            CaptionSlot::SeoTitle => "seo",
            CaptionSlot::Short => "short",
            CaptionSlot::Long => "long",
            CaptionSlot::Hashtags => "hashtags",
        }
    }
}

/// A single generated caption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Caption {
    pub id: String,
    pub text: String,
}

impl Caption {
    /// Create a caption with a freshly minted identifier
    pub fn new(slot: CaptionSlot, text: impl Into<String>) -> Self {
        Self {
            id: format!("{}-{}", slot.id_prefix(), Uuid::new_v4()),
            text: text.into(),
        }
    }
}

/// A complete set of captions; all four slots are always present
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptionSet {
    pub seo_title: Caption,
    pub short: Caption,
    pub long: Caption,
    pub hashtags: Caption,
}

impl CaptionSet {
    /// Build a set from raw model output, assigning new identifiers to every slot
    pub fn from_texts(
        seo_title: impl Into<String>,
        short: impl Into<String>,
        long: impl Into<String>,
        hashtags: impl Into<String>,
    ) -> Self {
        Self {
            seo_title: Caption::new(CaptionSlot::SeoTitle, seo_title),
            short: Caption::new(CaptionSlot::Short, short),
            long: Caption::new(CaptionSlot::Long, long),
            hashtags: Caption::new(CaptionSlot::Hashtags, hashtags),
        }
    }

    pub fn get(&self, slot: CaptionSlot) -> &Caption {
        match slot {
            CaptionSlot::SeoTitle => &self.seo_title,
            CaptionSlot::Short => &self.short,
            CaptionSlot::Long => &self.long,
            CaptionSlot::Hashtags => &self.hashtags,
        }
    }

    /// Copy of this set with one slot's text replaced; ids are untouched
    pub fn with_text(&self, slot: CaptionSlot, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        let caption = match slot {
            CaptionSlot::SeoTitle => &mut next.seo_title,
            CaptionSlot::Short => &mut next.short,
            CaptionSlot::Long => &mut next.long,
            CaptionSlot::Hashtags => &mut next.hashtags,
        };
        caption.text = text.into();
        next
    }
}

/// Voice of the generated captions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Witty,
    Casual,
    Inspirational,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Friendly => "Friendly",
            Tone::Professional => "Professional",
            Tone::Witty => "Witty",
            Tone::Casual => "Casual",
            Tone::Inspirational => "Inspirational",
        };
        f.write_str(name)
    }
}

/// Requested caption length
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CaptionLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl fmt::Display for CaptionLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptionLength::Short => "Short",
            CaptionLength::Medium => "Medium",
            CaptionLength::Long => "Long",
        };
        f.write_str(name)
    }
}

/// Generation request parameters; not persisted with the asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptionOptions {
    pub tone: Tone,
    pub length: CaptionLength,
    pub language: String,
    pub include_hashtags: bool,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            tone: Tone::Friendly,
            length: CaptionLength::Medium,
            language: "English".to_string(),
            include_hashtags: true,
        }
    }
}

impl CaptionOptions {
    /// Hashtag count policy embedded in the instruction
    pub fn hashtag_range(&self) -> &'static str {
        if self.include_hashtags { "5-10" } else { "0" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("image/gif"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video/webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("VIDEO/MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("image/tiff"), None);
        assert_eq!(MediaKind::from_mime("video/quicktime"), None);
        assert_eq!(MediaKind::from_mime("application/pdf"), None);
    }

    #[test]
    fn test_caption_ids_unique_across_slots_and_generations() {
        let first = CaptionSet::from_texts("t", "s", "l", "#h");
        let second = CaptionSet::from_texts("t", "s", "l", "#h");

        let mut ids: Vec<&str> = CaptionSlot::ALL
            .iter()
            .flat_map(|slot| [first.get(*slot).id.as_str(), second.get(*slot).id.as_str()])
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert!(first.seo_title.id.starts_with("seo-"));
        assert!(first.hashtags.id.starts_with("hashtags-"));
    }

    #[test]
    fn test_with_text_touches_only_one_slot() {
        let set = CaptionSet::from_texts("Title", "Short", "Long", "#tag");
        let edited = set.with_text(CaptionSlot::Short, "New text");

        assert_eq!(edited.short.text, "New text");
        assert_eq!(edited.short.id, set.short.id);
        assert_eq!(edited.seo_title, set.seo_title);
        assert_eq!(edited.long, set.long);
        assert_eq!(edited.hashtags, set.hashtags);
    }

    #[test]
    fn test_caption_options_defaults_and_partial_json() {
        let options: CaptionOptions =
            serde_json::from_str(r#"{"tone":"Witty","include_hashtags":false}"#).unwrap();
        assert_eq!(options.tone, Tone::Witty);
        assert_eq!(options.length, CaptionLength::Medium);
        assert_eq!(options.language, "English");
        assert_eq!(options.hashtag_range(), "0");
        assert_eq!(CaptionOptions::default().hashtag_range(), "5-10");
    }

    #[test]
    fn test_slot_accepts_both_spellings() {
        let snake: CaptionSlot = serde_json::from_str(r#""seo_title""#).unwrap();
        let camel: CaptionSlot = serde_json::from_str(r#""seoTitle""#).unwrap();
        assert_eq!(snake, CaptionSlot::SeoTitle);
        assert_eq!(camel, CaptionSlot::SeoTitle);
    }
}
