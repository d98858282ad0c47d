//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each pipeline
//! stage, `AppPaths` for the platform config directory, and TOML persistence
//! via `AppConfig::load` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, ConfigError, GenerationConfig, OutputConfig, ReplicateConfig, RunConfig,
    SnippetConfig, API_TOKEN_ENV,
};
