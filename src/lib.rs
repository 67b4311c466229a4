pub mod config;
pub mod output;
pub mod pipeline;
pub mod summarize;
pub mod translate;
pub mod web;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

/// A single captioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Caption track as obtained for one video
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    pub segments: Vec<Segment>,
    pub language_code: String,
    pub was_translated: bool,
}

impl TranscriptResult {
    /// Whether the track has to go through the translator before summarizing
    pub fn needs_translation(&self) -> bool {
        needs_translation(&self.language_code)
    }
}

/// Language code used when a caption track does not report its own
pub const UNKNOWN_LANGUAGE: &str = "unknown";

pub fn needs_translation(language_code: &str) -> bool {
    language_code != "en" && language_code != UNKNOWN_LANGUAGE
}

static VIDEO_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // v=ID or /ID
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap(),
        // embed/ID
        Regex::new(r"embed/([0-9A-Za-z_-]{11})").unwrap(),
        // bare 11-character video ID
        Regex::new(r"^([0-9A-Za-z_-]{11})$").unwrap(),
    ]
});

/// Extract video ID from a YouTube URL or a bare ID.
///
/// Patterns are tried in a fixed order and the first hit wins.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_video_id() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_with_leading_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=a1-B2_c3D4e"),
            Some("a1-B2_c3D4e".to_string())
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_embed_without_scheme() {
        assert_eq!(extract_video_id("embed/_-abcdefghi"), Some("_-abcdefghi".to_string()));
    }

    #[test]
    fn test_shorts_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_not_a_url() {
        assert_eq!(extract_video_id("not a url"), None);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(extract_video_id("abc123"), None);
        assert_eq!(extract_video_id("https://youtu.be/abc"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_whitespace_trimming() {
        assert_eq!(extract_video_id("  dQw4w9WgXcQ  "), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_deterministic() {
        let input = "https://www.youtube.com/watch?v=abcdefghijk";
        assert_eq!(extract_video_id(input), extract_video_id(input));
    }

    #[test]
    fn test_needs_translation() {
        assert!(!needs_translation("en"));
        assert!(!needs_translation(UNKNOWN_LANGUAGE));
        assert!(needs_translation("de"));
    }
}
