//! Acoustic descriptors.
//!
//! - [`spectrum`]: STFT, mel filterbank, dB conversion and DCT.
//! - [`tempo`]: onset envelope and autocorrelation tempo estimate.
//! - [`features`]: the [`FeatureVector`] and [`extract`].

pub mod features;
pub mod spectrum;
pub mod tempo;

pub use features::{describe, extract, DescriptorError, FeatureVector};
