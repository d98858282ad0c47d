//! Pipeline orchestrator: drives N tracks through generate/reuse, analysis
//! and snippet extraction, then rewrites the ledger.
//!
//! # Flow per track
//!
//! ```text
//! CheckLedger ─┬─ row for song_NN.wav and file present ─▶ Reuse (recorded time)
//!              └─ otherwise ─▶ Generate: invoke model (timed) → acquire first locator
//!   ─▶ Analyze  (spawn_blocking(extract))
//!   ─▶ Snippet  (spawn_blocking(select), seed + index)
//!   ─▶ AppendRow
//! ```
//!
//! Tracks run strictly one after another. Blocking DSP is pushed onto
//! `tokio::task::spawn_blocking` and awaited immediately. Any error aborts
//! the run before the ledger is written; audio already saved stays on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::analysis::{extract, FeatureVector};
use crate::audio::{acquire, AudioError, AudioFetcher, FetchError};
use crate::config::{AppConfig, OutputConfig};
use crate::generation::{
    GenerationError, GenerationRequest, GenerationService, ModelInvoker, RetryPolicy,
};
use crate::prompts;
use crate::snippet::{select, Snippet, SnippetMethod};

use super::ledger::{Ledger, LedgerError, LedgerRow};
use super::state::{RunSummary, TrackPhase};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Anything that stops a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("output directory: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failure such as a panicked blocking task.
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// RunOptions
// ---------------------------------------------------------------------------

/// Everything a run needs besides the service and fetcher.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub model: String,
    pub num_tracks: usize,
    pub seed: u64,
    /// Ignore the existing ledger and regenerate every track.
    pub force: bool,
    pub retry: RetryPolicy,
    pub snippet_ms: u64,
    pub fade_ms: u64,
    pub snippet_method: SnippetMethod,
    pub output: OutputConfig,
}

impl RunOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.generation.model.clone(),
            num_tracks: config.run.num_tracks,
            seed: config.run.seed,
            force: config.run.force,
            retry: RetryPolicy {
                attempts: config.generation.retries,
                backoff: config.generation.backoff(),
            },
            snippet_ms: config.snippet.seconds as u64 * 1_000,
            fade_ms: config.snippet.fade_ms,
            snippet_method: SnippetMethod::parse(&config.snippet.method),
            output: config.output.clone(),
        }
    }

    /// `{audio_dir}/song_NN.wav` for 0-based `index`.
    pub fn audio_path(&self, index: usize) -> PathBuf {
        self.output.audio_dir.join(format!("song_{:02}.wav", index + 1))
    }

    /// `{snippet_dir}/song_NN_snippet.wav` for 0-based `index`.
    pub fn snippet_path(&self, index: usize) -> PathBuf {
        self.output
            .snippet_dir
            .join(format!("song_{:02}_snippet.wav", index + 1))
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn round_millis(secs: f64) -> f64 {
    (secs * 1_000.0).round() / 1_000.0
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Runs a batch against a [`GenerationService`] and an [`AudioFetcher`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ai_music_pipeline::audio::HttpFetcher;
/// use ai_music_pipeline::config::AppConfig;
/// use ai_music_pipeline::generation::ReplicateClient;
/// use ai_music_pipeline::pipeline::{PipelineOrchestrator, RunOptions};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let service = Arc::new(ReplicateClient::from_config(&config.replicate, "r8_..."));
/// let orchestrator = PipelineOrchestrator::new(
///     service,
///     Arc::new(HttpFetcher::new()),
///     RunOptions::from_config(&config),
/// );
/// let summary = orchestrator.run().await.unwrap();
/// println!("wrote {}", summary.ledger_path.display());
/// # }
/// ```
pub struct PipelineOrchestrator {
    invoker: ModelInvoker,
    fetcher: Arc<dyn AudioFetcher>,
    options: RunOptions,
}

/// Outcome of one track before it becomes a ledger row.
struct TrackOutcome {
    generation_time_seconds: f64,
    reused: bool,
}

impl PipelineOrchestrator {
    pub fn new(
        service: Arc<dyn GenerationService>,
        fetcher: Arc<dyn AudioFetcher>,
        options: RunOptions,
    ) -> Self {
        Self {
            invoker: ModelInvoker::new(service),
            fetcher,
            options,
        }
    }

    /// Process every track and rewrite the ledger.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let opts = &self.options;
        log::info!("pipeline: {}", TrackPhase::Init.label());

        std::fs::create_dir_all(&opts.output.audio_dir)?;
        std::fs::create_dir_all(&opts.output.snippet_dir)?;

        let previous = if opts.force {
            Ledger::new()
        } else {
            Ledger::load_or_empty(&opts.output.ledger_path)
        };
        let model_version = self
            .invoker
            .model_version(&opts.model)
            .await
            .unwrap_or_default();
        let prompts = prompts::sample(opts.num_tracks, opts.seed);

        let mut ledger = Ledger::new();
        let (mut generated, mut reused) = (0usize, 0usize);

        for (index, prompt) in prompts.iter().enumerate() {
            log::info!("track {}/{}: {prompt}", index + 1, prompts.len());
            let (row, outcome) = self
                .process_track(index, prompt, &previous, &model_version)
                .await?;
            if outcome.reused {
                reused += 1;
            } else {
                generated += 1;
            }
            ledger.push(row);
            log::debug!("track {}: {}", index + 1, TrackPhase::AppendRow.label());
        }

        log::info!("pipeline: {}", TrackPhase::FlushLedger.label());
        ledger.save(&opts.output.ledger_path)?;
        log::info!(
            "pipeline: {} ({} generated, {} reused)",
            TrackPhase::Done.label(),
            generated,
            reused
        );

        Ok(RunSummary {
            ledger_path: opts.output.ledger_path.clone(),
            rows: ledger.len(),
            generated,
            reused,
        })
    }

    async fn process_track(
        &self,
        index: usize,
        prompt: &str,
        previous: &Ledger,
        model_version: &str,
    ) -> Result<(LedgerRow, TrackOutcome), PipelineError> {
        let opts = &self.options;
        let audio_path = opts.audio_path(index);
        let audio_key = path_text(&audio_path);

        log::debug!("track {}: {}", index + 1, TrackPhase::CheckLedger.label());
        let outcome = match previous.find_by_audio_path(&audio_key) {
            Some(row) if audio_path.exists() => {
                log::info!(
                    "track {}: {} {}",
                    index + 1,
                    TrackPhase::Reuse.label(),
                    audio_key
                );
                TrackOutcome {
                    generation_time_seconds: row.generation_time_seconds,
                    reused: true,
                }
            }
            found => {
                if found.is_some() {
                    log::warn!(
                        "track {}: ledger lists {audio_key} but the file is missing; regenerating",
                        index + 1
                    );
                }
                log::info!("track {}: {}", index + 1, TrackPhase::Generate.label());
                let secs = self.generate(prompt, &audio_path).await?;
                TrackOutcome {
                    generation_time_seconds: round_millis(secs),
                    reused: false,
                }
            }
        };

        log::debug!("track {}: {}", index + 1, TrackPhase::Analyze.label());
        let features = self.analyze(&audio_path).await?;

        log::debug!("track {}: {}", index + 1, TrackPhase::Snippet.label());
        let snippet = self.snippet(&audio_path, index).await?;

        let row = LedgerRow {
            song_id: uuid::Uuid::new_v4().to_string(),
            prompt: prompt.to_string(),
            model: opts.model.clone(),
            model_version: model_version.to_string(),
            audio_path: audio_key,
            generation_time_seconds: outcome.generation_time_seconds,
            snippet_path: path_text(&snippet.path),
            snippet_method: snippet.method,
            snippet_length: snippet.duration_seconds,
            features,
        };
        Ok((row, outcome))
    }

    /// Invoke the model and save the first locator to `dest`. Returns the
    /// wall-clock seconds spent in the model call alone.
    async fn generate(&self, prompt: &str, dest: &Path) -> Result<f64, PipelineError> {
        let request = GenerationRequest::new(&self.options.model, prompt, self.options.retry);

        let started = Instant::now();
        let locators = self.invoker.invoke(&request).await?;
        let elapsed = started.elapsed().as_secs_f64();

        let first = locators.first().ok_or(GenerationError::NoLocators)?;
        log::debug!("model returned {} locator(s) in {elapsed:.2}s", locators.len());
        acquire(self.fetcher.as_ref(), first, dest).await?;
        Ok(elapsed)
    }

    async fn analyze(&self, audio_path: &Path) -> Result<FeatureVector, PipelineError> {
        let path = audio_path.to_path_buf();
        let features = tokio::task::spawn_blocking(move || extract(&path))
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))??;
        Ok(features)
    }

    async fn snippet(&self, audio_path: &Path, index: usize) -> Result<Snippet, PipelineError> {
        let opts = &self.options;
        let source = audio_path.to_path_buf();
        let target = opts.snippet_path(index);
        let (target_ms, fade_ms) = (opts.snippet_ms, opts.fade_ms);
        let method = opts.snippet_method.clone();
        let seed = opts.seed.wrapping_add(index as u64);

        let snippet = tokio::task::spawn_blocking(move || {
            select(&source, &target, target_ms, fade_ms, &method, seed)
        })
        .await
        .map_err(|e| PipelineError::Internal(e.to_string()))??;
        Ok(snippet)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
