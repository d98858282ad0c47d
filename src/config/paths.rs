//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\ai-music-pipeline\
//!   macOS:   ~/Library/Application Support/ai-music-pipeline/
//!   Linux:   ~/.config/ai-music-pipeline/
//!
//! Generated audio, snippets and the ledger are written relative to the
//! working directory (see [`super::OutputConfig`]), not here.

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "ai-music-pipeline";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
