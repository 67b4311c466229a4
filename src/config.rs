use std::path::{Path, PathBuf};

use eyre::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub openai_model: Option<String>,
    pub use_openai: Option<bool>,
}

impl Config {
    /// Load config from `path` (usually `config_path()`) if it exists
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Like `load_from`, but an unreadable or invalid file only logs a warning
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            warn!("Ignoring config file {}: {e}", path.display());
            Config::default()
        })
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("transcripts")
}

/// Settings handed to the pipeline at construction time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    /// Model for the OpenAI summarizer; `None` selects the basic summary
    pub openai_model: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            openai_model: None,
        }
    }
}

impl PipelineConfig {
    /// Resolve against the config file. `Some` arguments win over file values.
    pub fn resolve(config: &Config, output_dir: Option<PathBuf>, use_openai: bool, model: Option<String>) -> Self {
        let output_dir = output_dir
            .or_else(|| config.output_dir.clone())
            .unwrap_or_else(default_output_dir);

        let use_openai = use_openai || config.use_openai.unwrap_or(false);
        let openai_model = use_openai.then(|| {
            model
                .or_else(|| config.openai_model.clone())
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())
        });

        Self {
            output_dir,
            openai_model,
        }
    }
}
