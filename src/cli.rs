//! Command-line arguments.
//!
//! Every flag is optional; anything given on the command line overrides the
//! value loaded from `settings.toml`, which in turn falls back to built-in
//! defaults (30 tracks, seed 42, `lucataco/ace-step`, 15 s random snippets).

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, API_TOKEN_ENV};

#[derive(Parser, Debug, Default)]
#[command(name = "ai-music-pipeline")]
#[command(about = "Generate, analyse and excerpt a batch of AI music tracks")]
#[command(version)]
pub struct Args {
    /// Number of tracks to generate [default: 30]
    #[arg(long)]
    pub num_tracks: Option<usize>,

    /// Seed for prompt sampling and snippet placement [default: 42]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Model name, optionally pinned as owner/name:version [default: lucataco/ace-step]
    #[arg(long)]
    pub model: Option<String>,

    /// Regenerate every track, ignoring the existing ledger
    #[arg(long)]
    pub force: bool,

    /// Snippet length in seconds [default: 15]
    #[arg(long)]
    pub snippet_seconds: Option<u32>,

    /// How to pick the snippet: random or highest_rms [default: random]
    #[arg(long)]
    pub snippet_method: Option<String>,

    /// Settings file to use instead of the platform default
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replicate API token
    #[arg(long, env = API_TOKEN_ENV, hide_env_values = true)]
    pub api_token: Option<String>,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(n) = self.num_tracks {
            config.run.num_tracks = n;
        }
        if let Some(seed) = self.seed {
            config.run.seed = seed;
        }
        if let Some(model) = &self.model {
            config.generation.model = model.clone();
        }
        if self.force {
            config.run.force = true;
        }
        if let Some(secs) = self.snippet_seconds {
            config.snippet.seconds = secs;
        }
        if let Some(method) = &self.snippet_method {
            config.snippet.method = method.clone();
        }
        if let Some(token) = self.api_token.as_ref().filter(|t| !t.trim().is_empty()) {
            config.replicate.api_token = Some(token.clone());
        }
    }
}
