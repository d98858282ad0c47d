//! Audio handling: decode, resample, encode and download.
//!
//! # Pipeline
//!
//! ```text
//! locator → AudioFetcher (bytes) → decode_bytes (symphonia) → AudioClip
//!         → write_wav (hound, 16-bit PCM)
//!
//! AudioClip → downmix_to_mono → resample_mono (rubato) → analysis signal
//! ```

pub mod clip;
pub mod decode;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod resample;

pub use clip::AudioClip;
pub use decode::{decode_bytes, decode_file};
pub use encode::{encode_wav, write_wav};
pub use error::AudioError;
pub use fetch::{acquire, AudioFetcher, FetchError, HttpFetcher};
pub use resample::{analysis_signal, downmix_to_mono, resample_mono, ANALYSIS_RATE};

#[cfg(test)]
pub use fetch::StaticFetcher;
