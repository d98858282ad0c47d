//! Pipeline settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files. Every field has a serde
//! default, so a partial `settings.toml` only overrides what it names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

/// Environment variable holding the Replicate API token.
pub const API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Preconditions that stop a run before any track is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API token in settings, CLI or environment.
    #[error("REPLICATE_API_TOKEN not set. Create .env or export the variable.")]
    MissingCredential,
}

// ---------------------------------------------------------------------------
// ReplicateConfig
// ---------------------------------------------------------------------------

/// Connection settings for the remote generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicateConfig {
    /// Base URL of the prediction API.
    pub base_url: String,
    /// API token. `None` means "look in the environment".
    pub api_token: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between polls of a prediction that is still running.
    pub poll_interval_ms: u64,
    /// Give up on a single prediction after this many seconds.
    pub max_wait_secs: u64,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com".into(),
            api_token: None,
            timeout_secs: 120,
            poll_interval_ms: 1_000,
            max_wait_secs: 600,
        }
    }
}

impl ReplicateConfig {
    /// The token from settings if non-empty, otherwise from
    /// [`API_TOKEN_ENV`] (which `main` may have populated from `.env`).
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        self.resolve_token_with(std::env::var(API_TOKEN_ENV).ok())
    }

    /// [`Self::resolve_token`] with the environment value passed in.
    /// Blank tokens count as missing.
    pub fn resolve_token_with(&self, env: Option<String>) -> Result<String, ConfigError> {
        self.api_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or(env)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Which model to call and how hard to retry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model name, optionally with a `:version` suffix.
    pub model: String,
    /// Attempts per track before giving up.
    pub retries: u32,
    /// Backoff unit in seconds; attempt `n` is followed by `n * backoff`.
    pub backoff_secs: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "lucataco/ace-step".into(),
            retries: 3,
            backoff_secs: 2.0,
        }
    }
}

impl GenerationConfig {
    /// Backoff unit as a [`Duration`]; negative or NaN values become zero.
    pub fn backoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.backoff_secs).unwrap_or(Duration::ZERO)
    }
}

// ---------------------------------------------------------------------------
// SnippetConfig
// ---------------------------------------------------------------------------

/// Snippet extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Snippet length in seconds.
    pub seconds: u32,
    /// Fade-in and fade-out length in milliseconds.
    pub fade_ms: u64,
    /// Selection method name (`"random"` or `"highest_rms"`).
    pub method: String,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            seconds: 15,
            fade_ms: 500,
            method: "random".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Where generated artefacts land.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Full generated tracks.
    pub audio_dir: PathBuf,
    /// Extracted snippets.
    pub snippet_dir: PathBuf,
    /// The CSV ledger.
    pub ledger_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let root = Path::new("outputs");
        Self {
            audio_dir: root.join("audio"),
            snippet_dir: root.join("snippets"),
            ledger_path: root.join("tracks.csv"),
        }
    }
}

impl OutputConfig {
    /// Outputs rooted at `root` instead of `./outputs`.
    pub fn under(root: &Path) -> Self {
        Self {
            audio_dir: root.join("audio"),
            snippet_dir: root.join("snippets"),
            ledger_path: root.join("tracks.csv"),
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Batch size and seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub num_tracks: usize,
    pub seed: u64,
    /// Regenerate everything and ignore the existing ledger.
    pub force: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_tracks: 30,
            seed: 42,
            force: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use ai_music_pipeline::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert!(config.run.num_tracks > 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub replicate: ReplicateConfig,
    pub generation: GenerationConfig,
    pub snippet: SnippetConfig,
    pub output: OutputConfig,
    pub run: RunConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
