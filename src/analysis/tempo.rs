//! Global tempo estimate from an onset-strength envelope.
//!
//! The envelope is the positive spectral flux of the log-mel spectrogram,
//! averaged over bands. Its autocorrelation is scored over lags covering
//! [`MIN_BPM`]..=[`MAX_BPM`], weighted by a log-normal prior around
//! [`PRIOR_BPM`], and the best lag is converted back to beats per minute.

use super::features::DescriptorError;

pub const MIN_BPM: f64 = 30.0;
pub const MAX_BPM: f64 = 300.0;
pub const PRIOR_BPM: f64 = 120.0;
/// Width of the tempo prior, in octaves.
const PRIOR_STD_OCTAVES: f64 = 1.0;

/// Onset strength per frame; frame 0 is always zero.
pub fn onset_envelope(log_mel: &[Vec<f32>]) -> Vec<f32> {
    let mut env = Vec::with_capacity(log_mel.len());
    if log_mel.is_empty() {
        return env;
    }
    env.push(0.0);
    for pair in log_mel.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let bands = cur.len().max(1) as f32;
        let flux: f32 = cur
            .iter()
            .zip(prev)
            .map(|(c, p)| (c - p).max(0.0))
            .sum();
        env.push(flux / bands);
    }
    env
}

fn lag_to_bpm(lag: usize, frame_rate: f64) -> f64 {
    60.0 * frame_rate / lag as f64
}

fn log_prior(bpm: f64) -> f64 {
    let z = (bpm / PRIOR_BPM).log2() / PRIOR_STD_OCTAVES;
    -0.5 * z * z
}

/// Best tempo for `envelope` sampled at `frame_rate` frames per second.
pub fn estimate_tempo(envelope: &[f32], frame_rate: f64) -> Result<f64, DescriptorError> {
    if envelope.iter().all(|&v| v <= 0.0) {
        return Err(DescriptorError::NoOnsets);
    }

    let min_lag = (60.0 * frame_rate / MAX_BPM).ceil().max(1.0) as usize;
    let max_lag = (60.0 * frame_rate / MIN_BPM).floor() as usize;
    let max_lag = max_lag.min(envelope.len().saturating_sub(1));
    if max_lag < min_lag {
        return Err(DescriptorError::TooShort {
            needed: min_lag + 1,
            got: envelope.len(),
        });
    }

    let autocorr = |lag: usize| -> f64 {
        envelope
            .iter()
            .zip(&envelope[lag..])
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum()
    };
    let energy = autocorr(0);

    let (best_lag, _) = (min_lag..=max_lag)
        .map(|lag| {
            let strength = (autocorr(lag) / energy).max(0.0);
            let score = (1e6 * strength).ln_1p() + log_prior(lag_to_bpm(lag, frame_rate));
            (lag, score)
        })
        .fold((min_lag, f64::NEG_INFINITY), |best, cand| {
            if cand.1 > best.1 {
                cand
            } else {
                best
            }
        });

    Ok(lag_to_bpm(best_lag, frame_rate))
}
