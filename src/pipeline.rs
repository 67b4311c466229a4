//! The single transcript pipeline shared by the console and web entry points.
//!
//! Stages run sequentially: video ID, title, captions, translation,
//! summary, file. Degraded outcomes (synthesized title, failed
//! translation batches) are reported in [`PipelineReport`]; terminal ones
//! are [`PipelineError`] variants.

use std::path::PathBuf;

use chrono::Local;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::output::{SummaryArtifact, format_transcript, write_transcript};
use crate::summarize::{OpenAiSummarizer, summarize_basic};
use crate::translate::{GoogleTranslator, TranslationReport, Translator, translate_transcript};
use crate::youtube::{TitleLookup, VideoSource, YouTube, fetch_transcript};
use crate::extract_video_id;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not extract video ID from: {input}")]
    NoVideoId { input: String },

    #[error("no transcript available for video {video_id}: {reason}")]
    NoTranscript { video_id: String, reason: String },

    #[error("failed to save transcript: {0}")]
    Persist(#[from] std::io::Error),
}

/// Stage notifications for whoever drives the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    FetchingTitle,
    Title(String),
    FetchingTranscript,
    Language(String),
    Translating { done: usize, total: usize },
    Summarizing,
}

pub type ProgressFn = Box<dyn Fn(Progress) + Send + Sync>;

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub artifact: SummaryArtifact,
    pub path: PathBuf,
    pub title: TitleLookup,
    /// `None` when no translation was needed
    pub translation: Option<TranslationReport>,
}

pub struct Pipeline {
    config: PipelineConfig,
    source: Box<dyn VideoSource>,
    translator: Box<dyn Translator>,
    summarizer: Option<OpenAiSummarizer>,
    progress: Option<ProgressFn>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, source: Box<dyn VideoSource>, translator: Box<dyn Translator>) -> Self {
        Self {
            config,
            source,
            translator,
            summarizer: None,
            progress: None,
        }
    }

    /// Pipeline backed by YouTube and Google Translate.
    ///
    /// When the config asks for OpenAI but no API key is set, the basic
    /// summarizer is used instead.
    pub fn youtube(config: PipelineConfig, client: reqwest::Client) -> Self {
        let summarizer = config
            .openai_model
            .as_deref()
            .and_then(|model| match OpenAiSummarizer::from_env(client.clone(), model) {
                Ok(summarizer) => Some(summarizer),
                Err(e) => {
                    warn!("{e}; falling back to basic summary");
                    None
                }
            });

        let pipeline = Self::new(
            config,
            Box::new(YouTube::new(client.clone())),
            Box::new(GoogleTranslator::new(client)),
        );
        match summarizer {
            Some(summarizer) => pipeline.with_summarizer(summarizer),
            None => pipeline,
        }
    }

    pub fn with_summarizer(mut self, summarizer: OpenAiSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn emit(&self, event: Progress) {
        if let Some(progress) = &self.progress {
            progress(event);
        }
    }

    pub async fn run(&self, input: &str) -> Result<PipelineReport, PipelineError> {
        let input = input.trim();
        let video_id = extract_video_id(input).ok_or_else(|| PipelineError::NoVideoId {
            input: input.to_string(),
        })?;
        debug!("Extracted video ID: {video_id}");

        self.emit(Progress::FetchingTitle);
        let title = self.source.lookup_title(&video_id).await;
        info!("Video title: {} ({title:?})", title.title());
        self.emit(Progress::Title(title.title().to_string()));

        self.emit(Progress::FetchingTranscript);
        let mut transcript = fetch_transcript(self.source.as_ref(), &video_id)
            .await
            .map_err(|e| PipelineError::NoTranscript {
                video_id: video_id.clone(),
                reason: format!("{e:#}"),
            })?;
        info!(
            "Fetched {} segments for {video_id}, lang={}",
            transcript.segments.len(),
            transcript.language_code
        );
        self.emit(Progress::Language(transcript.language_code.clone()));

        let translation = translate_transcript(self.translator.as_ref(), &mut transcript, |done, total| {
            self.emit(Progress::Translating { done, total })
        })
        .await;
        if let Some(report) = translation.as_ref().filter(|r| r.is_degraded()) {
            warn!("Translation of {video_id} is degraded: {report:?}");
        }

        self.emit(Progress::Summarizing);
        let full_text = format_transcript(&transcript.segments);
        let summary_text = match &self.summarizer {
            Some(summarizer) => summarizer.summarize_or_basic(&full_text).await,
            None => summarize_basic(&full_text),
        };

        let artifact = SummaryArtifact {
            video_title: title.title().to_string(),
            video_id,
            language_code: transcript.language_code,
            was_translated: transcript.was_translated,
            summary_text,
            full_text,
            created_at: Local::now(),
        };
        let path = write_transcript(&self.config.output_dir, &artifact)?;
        info!("Transcript saved to: {}", path.display());

        Ok(PipelineReport {
            artifact,
            path,
            title,
            translation,
        })
    }
}
