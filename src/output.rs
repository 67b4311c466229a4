use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::debug;

use crate::Segment;
use crate::youtube::{sanitize_title, watch_url};

const RULE_WIDTH: usize = 80;

/// Everything persisted for one processed video
#[derive(Debug, Clone)]
pub struct SummaryArtifact {
    pub video_title: String,
    pub video_id: String,
    pub language_code: String,
    pub was_translated: bool,
    pub summary_text: String,
    pub full_text: String,
    pub created_at: DateTime<Local>,
}

/// Flatten segments into one text, separated by single spaces
pub fn format_transcript(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ")
}

/// `<title>_<YYYYMMDD_HHMMSS>.txt`
pub fn file_name(artifact: &SummaryArtifact) -> String {
    format!(
        "{}_{}.txt",
        sanitize_title(&artifact.video_title),
        artifact.created_at.format("%Y%m%d_%H%M%S")
    )
}

fn section(name: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{name}\n{rule}\n\n")
}

fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Render the saved file: metadata header, SUMMARY, FULL TRANSCRIPT
pub fn render_artifact(artifact: &SummaryArtifact) -> String {
    let mut out = String::new();
    out.push_str(&format!("YouTube Video: {}\n", artifact.video_title));
    out.push_str(&format!("Video ID: {}\n", artifact.video_id));
    out.push_str(&format!("URL: {}\n", watch_url(&artifact.video_id)));
    out.push_str(&format!("Original Language: {}\n", artifact.language_code));
    out.push_str(&format!("Translated to English: {}\n", flag(artifact.was_translated)));
    out.push_str(&format!(
        "Date Extracted: {}\n\n",
        artifact.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&section("SUMMARY"));
    out.push_str(&artifact.summary_text);
    out.push_str("\n\n");
    out.push_str(&section("FULL TRANSCRIPT"));
    out.push_str(&artifact.full_text);
    out
}

/// Write the artifact into `dir` (created if missing) and return the path.
/// I/O errors are returned to the caller untouched.
pub fn write_transcript(dir: &Path, artifact: &SummaryArtifact) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(artifact));
    std::fs::write(&path, render_artifact(artifact))?;
    debug!("Wrote transcript: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_artifact(title: &str) -> SummaryArtifact {
        SummaryArtifact {
            video_title: title.to_string(),
            video_id: "abcdefghijk".to_string(),
            language_code: "de".to_string(),
            was_translated: true,
            summary_text: "Key Points".to_string(),
            full_text: "Hello world This is a test".to_string(),
            created_at: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        }
    }

    #[test]
    fn test_format_transcript() {
        let segments = vec![
            Segment {
                text: "Hello world".to_string(),
                start: 0.0,
                duration: 1.5,
            },
            Segment {
                text: "This is a test".to_string(),
                start: 1.5,
                duration: 2.0,
            },
        ];
        assert_eq!(format_transcript(&segments), "Hello world This is a test");
    }

    #[test]
    fn test_format_transcript_empty() {
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(&sample_artifact("My Video")), "My Video_20240309_140507.txt");
    }

    #[test]
    fn test_render_layout() {
        let rule = "=".repeat(80);
        let expected = format!(
            "YouTube Video: My Video\n\
Video ID: abcdefghijk\n\
URL: https://www.youtube.com/watch?v=abcdefghijk\n\
Original Language: de\n\
Translated to English: True\n\
Date Extracted: 2024-03-09 14:05:07\n\n\
{rule}\nSUMMARY\n{rule}\n\n\
Key Points\n\n\
{rule}\nFULL TRANSCRIPT\n{rule}\n\n\
Hello world This is a test"
        );
        assert_eq!(render_artifact(&sample_artifact("My Video")), expected);
    }

    #[test]
    fn test_write_sanitizes_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out");

        let path = write_transcript(&target, &sample_artifact("Test<Video>")).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(!name.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
        assert!(name.starts_with("TestVideo_"));

        let content = std::fs::read_to_string(&path).unwrap();
        let summary_at = content.find("SUMMARY").unwrap();
        let full_at = content.find("FULL TRANSCRIPT").unwrap();
        assert!(summary_at < full_at);
    }

    #[test]
    fn test_write_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        assert!(write_transcript(&blocker, &sample_artifact("t")).is_err());
    }
}
