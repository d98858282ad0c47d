//! Application entry point: AI music pipeline.
//!
//! # Startup sequence
//!
//! 1. Initialise logging and read `.env` into the environment.
//! 2. Parse command-line flags.
//! 3. Load [`AppConfig`] (explicit `--config` path or the platform default)
//!    and overlay the flags.
//! 4. Resolve the Replicate API token; its absence is fatal.
//! 5. Create a single-threaded [`tokio`] runtime.
//! 6. Build the Replicate client and HTTP fetcher.
//! 7. Run the [`PipelineOrchestrator`] and report the ledger path.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use ai_music_pipeline::{
    audio::HttpFetcher,
    cli::Args,
    config::AppConfig,
    generation::ReplicateClient,
    pipeline::{PipelineOrchestrator, RunOptions},
};

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("ignoring unreadable .env ({e})"),
    }

    // 2. Flags
    let args = Args::parse();

    // 3. Configuration
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    args.apply(&mut config);

    // 4. Credential
    let token = config.replicate.resolve_token()?;

    log::info!(
        "generating {} track(s) with {} (seed {})",
        config.run.num_tracks,
        config.generation.model,
        config.run.seed
    );

    // 5. Tokio runtime (single task, tracks run one at a time)
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 6. Service + fetcher
    let service = Arc::new(ReplicateClient::from_config(&config.replicate, token));
    let fetcher = Arc::new(HttpFetcher::new());
    let orchestrator =
        PipelineOrchestrator::new(service, fetcher, RunOptions::from_config(&config));

    // 7. Run
    let summary = rt.block_on(orchestrator.run())?;
    println!("Wrote CSV to {}", summary.ledger_path.display());
    Ok(())
}
