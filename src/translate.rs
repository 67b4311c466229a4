use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, info, warn};

use crate::TranscriptResult;

/// Number of segments sent to the translator per request
pub const BATCH_SIZE: usize = 10;

/// Delimiter used to split a translated batch back into segments
const SEGMENT_DELIMITER: &str = ". ";

/// Text translation service
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Translator backed by the public Google Translate web endpoint
#[derive(Debug, Clone, Default)]
pub struct GoogleTranslator {
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let resp = self
            .client
            .get("https://translate.googleapis.com/translate_a/single")
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("translate endpoint returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_translation(&json)
    }
}

/// Join the translated chunks of a `translate_a/single` response
fn extract_translation(json: &serde_json::Value) -> Result<String> {
    if let Some(chunks) = json.get(0).and_then(|c| c.as_array()) {
        let text: String = chunks
            .iter()
            .filter_map(|chunk| chunk.get(0)?.as_str())
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected translate response format");
}

/// Outcome of a batch translation run.
///
/// Failures never abort the run; they only show up here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    pub batches: usize,
    pub failed_batches: usize,
    /// Segments left untranslated because the translated batch split into too few pieces
    pub misaligned_segments: usize,
    /// Translated pieces discarded because the batch split into too many pieces
    pub surplus_pieces: usize,
}

impl TranslationReport {
    pub fn is_degraded(&self) -> bool {
        self.failed_batches > 0 || self.misaligned_segments > 0 || self.surplus_pieces > 0
    }
}

/// Translate a transcript to English in place, batch by batch.
///
/// Returns `None` when the source is English or unresolvable. Otherwise
/// `was_translated` is set as soon as translation is attempted, even if
/// every batch fails. `on_progress` receives (segments processed, total).
pub async fn translate_transcript(
    translator: &dyn Translator,
    transcript: &mut TranscriptResult,
    mut on_progress: impl FnMut(usize, usize),
) -> Option<TranslationReport> {
    if !transcript.needs_translation() {
        return None;
    }

    let source = transcript.language_code.clone();
    let total = transcript.segments.len();
    let mut report = TranslationReport::default();
    let mut done = 0;

    for batch in transcript.segments.chunks_mut(BATCH_SIZE) {
        report.batches += 1;
        let combined = batch.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");

        match translator.translate(&combined, &source, "en").await {
            Ok(translated) => {
                let pieces: Vec<&str> = translated.split(SEGMENT_DELIMITER).collect();
                if pieces.len() < batch.len() {
                    report.misaligned_segments += batch.len() - pieces.len();
                } else {
                    report.surplus_pieces += pieces.len() - batch.len();
                }
                // Unmatched trailing segments keep their original text
                for (segment, piece) in batch.iter_mut().zip(pieces) {
                    segment.text = piece.to_string();
                }
            }
            Err(e) => {
                warn!("Translation batch {} failed, keeping original text: {e}", report.batches);
                report.failed_batches += 1;
            }
        }

        done += batch.len();
        info!("Translating: {done}/{total} lines");
        on_progress(done, total);
    }

    transcript.was_translated = true;
    debug!("Translation finished: {report:?}");
    Some(report)
}
