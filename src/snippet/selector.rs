//! Snippet extraction: loop, choose a window, fade, write.

use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio::{analysis_signal, decode_file, write_wav, AudioClip, AudioError, ANALYSIS_RATE};

use super::loudest::loudest_window_ms;
use super::SnippetMethod;

/// A written snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub path: PathBuf,
    /// Method name as requested, recognized or not.
    pub method: String,
    pub start_ms: u64,
    pub duration_seconds: f64,
}

/// Reproducible uniform start in `0..=max_start`.
pub fn random_start(max_start: u64, seed: u64) -> u64 {
    if max_start == 0 {
        return 0;
    }
    Pcg32::seed_from_u64(seed).gen_range(0..=max_start)
}

/// Choose the window start for `clip` (already looped to length).
pub fn choose_start(
    clip: &AudioClip,
    target_ms: u64,
    method: &SnippetMethod,
    seed: u64,
) -> Result<u64, AudioError> {
    let max_start = clip.duration_ms().saturating_sub(target_ms);
    let start = match method {
        SnippetMethod::HighestRms => {
            let signal = analysis_signal(clip)?;
            loudest_window_ms(&signal, ANALYSIS_RATE, target_ms)
        }
        SnippetMethod::Random | SnippetMethod::Other(_) => random_start(max_start, seed),
    };
    Ok(start.min(max_start))
}

/// Cut a `target_ms` snippet out of `source` and write it to `target`.
///
/// Clips shorter than the target are looped first. Both ends get a linear
/// fade of `fade_ms`.
pub fn select(
    source: &Path,
    target: &Path,
    target_ms: u64,
    fade_ms: u64,
    method: &SnippetMethod,
    seed: u64,
) -> Result<Snippet, AudioError> {
    let clip = decode_file(source)?.loop_to_length(target_ms);
    let start_ms = choose_start(&clip, target_ms, method, seed)?;

    let mut snippet = clip.slice_ms(start_ms, target_ms);
    snippet.apply_fades(fade_ms);
    write_wav(target, &snippet)?;

    log::info!(
        "snippet {} [{method}] {start_ms}..{} ms",
        target.display(),
        start_ms + target_ms
    );
    Ok(Snippet {
        path: target.to_path_buf(),
        method: method.label().to_string(),
        start_ms,
        duration_seconds: target_ms as f64 / 1_000.0,
    })
}
