use std::sync::LazyLock;

use eyre::{Result, bail};
use log::{debug, warn};
use regex::Regex;

const SUMMARY_HEADER: &str = "Key Points from Transcript:";
const SUMMARY_FOOTER: &str = "(Note: Basic summary, no AI.)";

/// Fragments this short (in characters, after trimming) are not sentences
const MIN_SENTENCE_CHARS: usize = 20;

/// Up to this many sentences the summary is the whole text
const MAX_FULL_SENTENCES: usize = 10;

/// Characters of transcript sent to the LLM
const MAX_LLM_INPUT_CHARS: usize = 15_000;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that creates clear, structured summaries of video transcripts.";

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Split text into candidate sentences, dropping short fragments
fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .collect()
}

/// Pick the first 3, the 4 around the midpoint and the last 3 sentences.
/// Sentences are not deduplicated across windows.
fn key_sentences<'a>(sentences: &[&'a str]) -> Vec<&'a str> {
    let total = sentences.len();
    if total <= MAX_FULL_SENTENCES {
        return sentences.to_vec();
    }

    let mid = total / 2;
    sentences[..3]
        .iter()
        .chain(&sentences[mid - 2..mid + 2])
        .chain(&sentences[total - 3..])
        .copied()
        .collect()
}

/// Heuristic extractive summary: no AI, fully deterministic
pub fn summarize_basic(text: &str) -> String {
    let sentences = split_sentences(text);
    let summary = key_sentences(&sentences).join("\n\n");
    format!("{SUMMARY_HEADER}\n\n{summary}\n\n{SUMMARY_FOOTER}")
}

/// LLM summarizer using the OpenAI chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build from `OPENAI_API_KEY`
    pub fn from_env(client: reqwest::Client, model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| eyre::eyre!("OPENAI_API_KEY environment variable not set (required for OpenAI summarization)"))?;
        Ok(Self::new(client, api_key, model))
    }

    /// Summarize, falling back to the basic summary on any failure
    pub async fn summarize_or_basic(&self, text: &str) -> String {
        match self.summarize(text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("OpenAI summarization failed, using basic summary: {e}");
                summarize_basic(text)
            }
        }
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        debug!("Summarizing via OpenAI API with model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": build_prompt(text)
                }
            ],
            "max_tokens": 1000,
            "temperature": 0.7
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("OpenAI API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_openai_text(&json)
    }
}

fn build_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(MAX_LLM_INPUT_CHARS).collect();
    format!(
        "Analyze and summarize the following transcript. Provide:\n\n\
1. **Main Topic/Theme**: What is this video about?\n\n\
2. **Key Points**: List the main arguments, ideas, or information discussed (use bullet points)\n\n\
3. **Intentions/Purpose**: What is the speaker trying to achieve or communicate?\n\n\
4. **Important Details**: Any specific facts, examples, or data mentioned\n\n\
5. **Conclusion/Takeaways**: What should viewers remember?\n\n\
Transcript:\n{excerpt}\n"
    )
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }
    bail!("unexpected OpenAI API response format");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(i: usize) -> String {
        format!("This is sentence number {i} of the transcript")
    }

    fn text_of(count: usize) -> String {
        (0..count).map(|i| format!("{}. ", sentence(i))).collect()
    }

    fn body(summary: &str) -> Vec<String> {
        summary
            .strip_prefix(&format!("{SUMMARY_HEADER}\n\n"))
            .and_then(|s| s.strip_suffix(&format!("\n\n{SUMMARY_FOOTER}")))
            .unwrap()
            .split("\n\n")
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_short_text_keeps_all_sentences() {
        let summary = summarize_basic(&text_of(8));
        assert!(summary.starts_with(SUMMARY_HEADER));
        assert!(summary.ends_with(SUMMARY_FOOTER));
        assert_eq!(body(&summary), (0..8).map(sentence).collect::<Vec<_>>());
    }

    #[test]
    fn test_thirty_sentences_windows() {
        let summary = summarize_basic(&text_of(30));
        let expected: Vec<String> = [0, 1, 2, 13, 14, 15, 16, 27, 28, 29].into_iter().map(sentence).collect();
        assert_eq!(body(&summary), expected);
    }

    #[test]
    fn test_eleven_sentences_just_above_threshold() {
        let summary = summarize_basic(&text_of(11));
        let expected: Vec<String> = [0, 1, 2, 3, 4, 5, 6, 8, 9, 10].into_iter().map(sentence).collect();
        assert_eq!(body(&summary), expected);
    }

    #[test]
    fn test_short_fragments_dropped() {
        let text = "Short one. Yes! This sentence is long enough to keep?! Ok";
        let summary = summarize_basic(text);
        assert_eq!(body(&summary), vec!["This sentence is long enough to keep".to_string()]);
    }

    #[test]
    fn test_fragment_of_exactly_twenty_chars_dropped() {
        let twenty = "a".repeat(20);
        let twenty_one = "b".repeat(21);
        let text = format!("{twenty}. {twenty_one}.");
        let sentences = split_sentences(&text);
        assert_eq!(sentences, vec![twenty_one.as_str()]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(
            summarize_basic(""),
            format!("{SUMMARY_HEADER}\n\n\n\n{SUMMARY_FOOTER}")
        );
    }

    #[test]
    fn test_build_prompt_wording() {
        let expected = "Analyze and summarize the following transcript. Provide:

1. **Main Topic/Theme**: What is this video about?

2. **Key Points**: List the main arguments, ideas, or information discussed (use bullet points)

3. **Intentions/Purpose**: What is the speaker trying to achieve or communicate?

4. **Important Details**: Any specific facts, examples, or data mentioned

5. **Conclusion/Takeaways**: What should viewers remember?

Transcript:
hello there
";
        assert_eq!(build_prompt("hello there"), expected);
    }

    #[test]
    fn test_build_prompt_truncates() {
        let text = "x".repeat(20_000);
        let prompt = build_prompt(&text);
        assert!(prompt.contains(&"x".repeat(MAX_LLM_INPUT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_LLM_INPUT_CHARS + 1)));
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "Summary of the video."
                    }
                }
            ]
        });
        assert_eq!(extract_openai_text(&json).unwrap(), "Summary of the video.");
    }

    #[test]
    fn test_extract_openai_text_empty() {
        let json = serde_json::json!({"choices": []});
        assert!(extract_openai_text(&json).is_err());
    }
}
