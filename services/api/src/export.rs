//! Plain-text caption export

use common::CaptionSet;

/// Combined text block for clipboard or download
pub fn render_caption_text(captions: &CaptionSet) -> String {
    format!(
        "SEO Title: {}\n\nShort Caption:\n{}\n\nLong Caption:\n{}\n\nHashtags:\n{}",
        captions.seo_title.text, captions.short.text, captions.long.text, captions.hashtags.text
    )
    .trim()
    .to_string()
}

/// Download name: the uploaded file name up to its first `.`, plus `_captions.txt`
pub fn download_file_name(file_name: &str) -> String {
    let base = file_name.split('.').next().unwrap_or_default();
    format!("{}_captions.txt", base)
}

/// `Content-Disposition` value for the download
pub fn content_disposition(file_name: &str) -> String {
    let safe: String = download_file_name(file_name)
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() || !c.is_ascii() => '_',
            c => c,
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}
