//! Short-time spectra, mel filterbank and cepstral helpers.
//!
//! Framing is centred: the signal is padded by half a frame on each side so
//! frame `t` is centred on sample `t * hop`, giving `1 + len / hop` frames.

use rustfft::{num_complex::Complex, FftPlanner};

pub const N_FFT: usize = 2048;
pub const HOP: usize = 512;
pub const N_MELS: usize = 128;
pub const N_MFCC: usize = 13;
/// Dynamic range kept by [`power_to_db`].
pub const TOP_DB: f32 = 80.0;

const AMIN: f32 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    Zero,
    /// Repeat the first and last sample.
    Edge,
}

/// `samples` with `frame_len / 2` of padding on each side.
///
/// Iterate frames with `padded.windows(frame_len).step_by(hop)`.
pub fn pad_centered(samples: &[f32], frame_len: usize, mode: PadMode) -> Vec<f32> {
    let half = frame_len / 2;
    let (head, tail) = match mode {
        PadMode::Zero => (0.0, 0.0),
        PadMode::Edge => (
            samples.first().copied().unwrap_or(0.0),
            samples.last().copied().unwrap_or(0.0),
        ),
    };

    let mut padded = Vec::with_capacity(samples.len() + 2 * half);
    padded.resize(half, head);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + 2 * half, tail);
    padded
}

/// Periodic Hann window.
pub fn hann(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / len as f32).cos()))
        .collect()
}

/// Magnitude spectrogram, one `N_FFT / 2 + 1` bin vector per frame.
pub fn magnitude_spectrogram(samples: &[f32]) -> Vec<Vec<f32>> {
    let padded = pad_centered(samples, N_FFT, PadMode::Zero);
    let window = hann(N_FFT);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(N_FFT);
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); N_FFT];

    padded
        .windows(N_FFT)
        .step_by(HOP)
        .map(|frame| {
            for ((slot, &s), &w) in buffer.iter_mut().zip(frame).zip(&window) {
                *slot = Complex::new(s * w, 0.0);
            }
            fft.process(&mut buffer);
            buffer[..=N_FFT / 2].iter().map(|c| c.norm()).collect()
        })
        .collect()
}

/// Centre frequency of each spectrogram bin.
pub fn bin_frequencies(sample_rate: u32) -> Vec<f32> {
    (0..=N_FFT / 2)
        .map(|k| k as f32 * sample_rate as f32 / N_FFT as f32)
        .collect()
}

// ---------------------------------------------------------------------------
// Mel filterbank (Slaney scale, area-normalized)
// ---------------------------------------------------------------------------

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1_000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4_f32.ln() / 27.0
}

fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular filters stored sparsely as `(bin, weight)` pairs.
pub struct MelBank {
    filters: Vec<Vec<(usize, f32)>>,
}

impl MelBank {
    pub fn new(sample_rate: u32, n_mels: usize) -> Self {
        let freqs = bin_frequencies(sample_rate);
        let mel_max = hz_to_mel(sample_rate as f32 / 2.0);
        let points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, centre, hi) = (points[m], points[m + 1], points[m + 2]);
                let norm = 2.0 / (hi - lo);
                freqs
                    .iter()
                    .enumerate()
                    .filter_map(|(bin, &f)| {
                        let rising = (f - lo) / (centre - lo);
                        let falling = (hi - f) / (hi - centre);
                        let w = rising.min(falling);
                        (w > 0.0).then_some((bin, w * norm))
                    })
                    .collect()
            })
            .collect();

        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Mel energies for one power spectrum.
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .map(|&(bin, w)| power.get(bin).copied().unwrap_or(0.0) * w)
                    .sum()
            })
            .collect()
    }
}

/// Convert power frames to decibels in place, clamped to [`TOP_DB`] below
/// the global peak.
pub fn power_to_db(frames: &mut [Vec<f32>]) {
    let mut peak = f32::NEG_INFINITY;
    for v in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *v = 10.0 * v.max(AMIN).log10();
        peak = peak.max(*v);
    }
    let floor = peak - TOP_DB;
    for v in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *v = v.max(floor);
    }
}

/// Log-mel spectrogram (dB) from a magnitude spectrogram.
pub fn log_mel_spectrogram(magnitudes: &[Vec<f32>], bank: &MelBank) -> Vec<Vec<f32>> {
    let mut mel: Vec<Vec<f32>> = magnitudes
        .iter()
        .map(|frame| {
            let power: Vec<f32> = frame.iter().map(|m| m * m).collect();
            bank.apply(&power)
        })
        .collect();
    power_to_db(&mut mel);
    mel
}

/// First `count` coefficients of the orthonormal DCT-II of `values`.
pub fn dct_ortho(values: &[f32], count: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 {
        return vec![0.0; count];
    }
    (0..count)
        .map(|k| {
            let sum: f64 = values
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let angle = std::f64::consts::PI * k as f64 * (i as f64 + 0.5) / n as f64;
                    v as f64 * angle.cos()
                })
                .sum();
            let scale = if k == 0 { (1.0 / n as f64).sqrt() } else { (2.0 / n as f64).sqrt() };
            (sum * scale) as f32
        })
        .collect()
}
