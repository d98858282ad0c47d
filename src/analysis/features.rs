//! [`FeatureVector`] extraction.
//!
//! Every descriptor is computed on its own. A descriptor that fails
//! (non-finite result, no onsets, signal too short) is logged and recorded
//! as `0.0` without affecting the others. Only failing to read the file at
//! all is an error.

use std::path::Path;

use thiserror::Error;

use crate::audio::{analysis_signal, decode_file, AudioError, ANALYSIS_RATE};

use super::spectrum::{
    bin_frequencies, dct_ortho, log_mel_spectrogram, magnitude_spectrogram, pad_centered,
    MelBank, PadMode, HOP, N_FFT, N_MELS, N_MFCC,
};
use super::tempo::{estimate_tempo, onset_envelope};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Six scalar descriptors of one track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureVector {
    pub duration_seconds: f64,
    pub tempo_bpm: f64,
    pub rms_mean: f64,
    pub spectral_centroid_mean: f64,
    pub zero_crossing_rate_mean: f64,
    pub mfcc1_mean: f64,
}

/// Why a single descriptor could not be computed.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("no onsets detected")]
    NoOnsets,

    #[error("signal too short: need {needed} frames, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("non-finite result")]
    NonFinite,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Decode `path`, downmix and resample it, then describe the result.
pub fn extract(path: &Path) -> Result<FeatureVector, AudioError> {
    let clip = decode_file(path)?;
    let signal = analysis_signal(&clip)?;
    log::debug!(
        "analysing {} ({} samples @ {ANALYSIS_RATE}Hz)",
        path.display(),
        signal.len()
    );
    Ok(describe(&signal))
}

/// Descriptors for a mono signal at [`ANALYSIS_RATE`].
///
/// An empty signal yields the all-zero vector.
pub fn describe(signal: &[f32]) -> FeatureVector {
    if signal.is_empty() {
        return FeatureVector::default();
    }

    let magnitudes = magnitude_spectrogram(signal);
    let bank = MelBank::new(ANALYSIS_RATE, N_MELS);
    let log_mel = log_mel_spectrogram(&magnitudes, &bank);

    FeatureVector {
        duration_seconds: signal.len() as f64 / ANALYSIS_RATE as f64,
        tempo_bpm: isolated("tempo_bpm", || tempo(&log_mel)),
        rms_mean: isolated("rms_mean", || Ok(rms_mean(signal))),
        spectral_centroid_mean: isolated("spectral_centroid_mean", || {
            Ok(centroid_mean(&magnitudes))
        }),
        zero_crossing_rate_mean: isolated("zero_crossing_rate_mean", || Ok(zcr_mean(signal))),
        mfcc1_mean: isolated("mfcc1_mean", || Ok(mfcc0_mean(&log_mel))),
    }
}

/// Run one descriptor, mapping any failure to `0.0`.
fn isolated<F>(name: &str, compute: F) -> f64
where
    F: FnOnce() -> Result<f64, DescriptorError>,
{
    match compute().and_then(finite) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("{name} unavailable ({e}); recording 0.0");
            0.0
        }
    }
}

fn finite(v: f64) -> Result<f64, DescriptorError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DescriptorError::NonFinite)
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn rms_mean(signal: &[f32]) -> f64 {
    let padded = pad_centered(signal, N_FFT, PadMode::Zero);
    mean(padded.windows(N_FFT).step_by(HOP).map(|frame| {
        let power: f64 = frame.iter().map(|&s| s as f64 * s as f64).sum::<f64>() / N_FFT as f64;
        power.sqrt()
    }))
}

fn zcr_mean(signal: &[f32]) -> f64 {
    let padded = pad_centered(signal, N_FFT, PadMode::Edge);
    mean(padded.windows(N_FFT).step_by(HOP).map(|frame| {
        let crossings = frame
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        crossings as f64 / N_FFT as f64
    }))
}

fn centroid_mean(magnitudes: &[Vec<f32>]) -> f64 {
    let freqs = bin_frequencies(ANALYSIS_RATE);
    mean(magnitudes.iter().map(|frame| {
        let total: f64 = frame.iter().map(|&m| m as f64).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = frame
            .iter()
            .zip(&freqs)
            .map(|(&m, &f)| m as f64 * f as f64)
            .sum();
        weighted / total
    }))
}

fn mfcc0_mean(log_mel: &[Vec<f32>]) -> f64 {
    mean(
        log_mel
            .iter()
            .map(|frame| dct_ortho(frame, N_MFCC)[0] as f64),
    )
}

fn tempo(log_mel: &[Vec<f32>]) -> Result<f64, DescriptorError> {
    let envelope = onset_envelope(log_mel);
    estimate_tempo(&envelope, ANALYSIS_RATE as f64 / HOP as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{write_wav, AudioClip};

    const SR: usize = ANALYSIS_RATE as usize;

    fn sine(freq: f32, secs: f32, amp: f32) -> Vec<f32> {
        (0..(secs * SR as f32) as usize)
            .map(|i| amp * (std::f32::consts::TAU * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    /// Short 1 kHz bursts every `period` samples over silence.
    fn clicks(period: usize, secs: f32) -> Vec<f32> {
        let len = (secs * SR as f32) as usize;
        let burst = sine(1_000.0, 0.02, 0.8);
        let mut out = vec![0.0_f32; len];
        for start in (period..len).step_by(period) {
            for (o, b) in out[start..].iter_mut().zip(&burst) {
                *o = *b;
            }
        }
        out
    }

    #[test]
    fn non_finite_descriptor_becomes_zero() {
        assert_eq!(isolated("nan", || Ok(f64::NAN)), 0.0);
        assert_eq!(isolated("inf", || Ok(f64::INFINITY)), 0.0);
        assert_eq!(isolated("short", || Err(DescriptorError::NoOnsets)), 0.0);
        assert_eq!(isolated("ok", || Ok(1.5)), 1.5);
    }

    #[test]
    fn very_short_clip_keeps_its_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.wav");
        write_wav(&path, &AudioClip::new(vec![0.3_f32; 3], 44_100, 1)).unwrap();

        let fv = extract(&path).unwrap();

        assert!(fv.rms_mean > 0.0, "rms_mean = {}", fv.rms_mean);
        assert!(fv.duration_seconds > 0.0);
    }

    #[test]
    fn empty_signal_is_all_zero() {
        assert_eq!(describe(&[]), FeatureVector::default());
    }

    #[test]
    fn silence_degrades_only_tempo() {
        let fv = describe(&vec![0.0_f32; SR * 2]);
        assert!((fv.duration_seconds - 2.0).abs() < 1e-9);
        assert_eq!(fv.tempo_bpm, 0.0);
        assert_eq!(fv.rms_mean, 0.0);
        assert_eq!(fv.spectral_centroid_mean, 0.0);
        assert_eq!(fv.zero_crossing_rate_mean, 0.0);
        assert!(fv.mfcc1_mean.is_finite());
    }

    #[test]
    fn sine_descriptors_are_plausible() {
        let fv = describe(&sine(440.0, 3.0, 0.5));

        assert!((fv.duration_seconds - 3.0).abs() < 1e-3);
        // Steady-state RMS of a 0.5 sine is ~0.354; edge frames pull it down.
        assert!(fv.rms_mean > 0.3 && fv.rms_mean < 0.36, "rms {}", fv.rms_mean);
        assert!(
            (fv.spectral_centroid_mean - 440.0).abs() < 120.0,
            "centroid {}",
            fv.spectral_centroid_mean
        );
        // Two crossings per cycle.
        let expected_zcr = 2.0 * 440.0 / SR as f64;
        assert!((fv.zero_crossing_rate_mean - expected_zcr).abs() < 0.01);
        assert!(fv.mfcc1_mean.is_finite() && fv.mfcc1_mean != 0.0);
    }

    #[test]
    fn click_track_tempo_is_recovered() {
        // 20 hops between clicks is ~129.2 BPM.
        let fv = describe(&clicks(20 * HOP, 12.0));
        let expected = 60.0 * ANALYSIS_RATE as f64 / (20 * HOP) as f64;
        assert!((fv.tempo_bpm - expected).abs() < 7.0, "tempo {}", fv.tempo_bpm);
    }

    #[test]
    fn extract_reads_and_resamples_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = sine(440.0, 2.0, 0.5)
            .into_iter()
            .flat_map(|s| [s, s])
            .collect();
        // Written at 22050 Hz stereo; resampling is a no-op, downmix is not.
        write_wav(&path, &AudioClip::new(samples, ANALYSIS_RATE, 2)).unwrap();

        let fv = extract(&path).unwrap();
        assert!((fv.duration_seconds - 2.0).abs() < 1e-3);
        assert!(fv.rms_mean > 0.3);
    }

    #[test]
    fn extract_missing_file_is_an_error() {
        assert!(extract(Path::new("/nonexistent/song.wav")).is_err());
    }
}
