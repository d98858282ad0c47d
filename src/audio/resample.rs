//! Channel mixing and sample-rate conversion.
//!
//! Analysis runs on **22 050 Hz mono `f32`**. This module provides the two
//! conversion steps:
//!
//! 1. [`downmix_to_mono`]: average any number of interleaved channels.
//! 2. [`resample_mono`]: convert a mono signal between rates with
//!    `rubato`'s polynomial `FastFixedIn` resampler.
//!
//! [`analysis_signal`] chains both for an [`AudioClip`].

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use super::{AudioClip, AudioError};

/// Sample rate every descriptor and the loudest-window scan work at.
pub const ANALYSIS_RATE: u32 = 22_050;

/// Zeros appended to the input so the resampler's output delay never eats
/// into the real signal. Covers the septic kernel at any supported ratio.
const FLUSH_PAD: usize = 64;

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * `channels == 1` copies the input unchanged.
/// * `channels == 0` yields an empty vector.
///
/// # Example
///
/// ```rust
/// use ai_music_pipeline::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_mono
// ---------------------------------------------------------------------------

/// Resample a mono signal from `source_rate` to `target_rate`.
///
/// The input plus a short run of trailing zeros is processed as one chunk,
/// the tail is flushed, and the resampler's output delay is trimmed so the
/// result is time-aligned with the input and exactly
/// `round(len * target / source)` samples long.
///
/// Equal rates and empty input return a copy without touching `rubato`.
pub fn resample_mono(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, AudioError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        samples.len() + FLUSH_PAD,
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let mut padded = Vec::with_capacity(samples.len() + FLUSH_PAD);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + FLUSH_PAD, 0.0);
    let wave_in = vec![padded];
    let mut out = resampler
        .process(&wave_in, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?
        .swap_remove(0);
    let tail = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?
        .swap_remove(0);
    out.extend_from_slice(&tail);

    let mut aligned: Vec<f32> = out.into_iter().skip(delay).take(expected).collect();
    aligned.resize(expected, 0.0);

    log::debug!(
        "resampled {} samples {source_rate}Hz -> {} samples {target_rate}Hz",
        samples.len(),
        aligned.len()
    );
    Ok(aligned)
}

/// Mono signal at [`ANALYSIS_RATE`] for `clip`.
pub fn analysis_signal(clip: &AudioClip) -> Result<Vec<f32>, AudioError> {
    resample_mono(&clip.to_mono(), clip.sample_rate(), ANALYSIS_RATE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
