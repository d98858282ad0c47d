//! Batch AI music generation: prompts → hosted model → WAV → descriptors →
//! snippet → CSV ledger.
//!
//! The binary in `main.rs` wires these modules together; everything here is
//! usable as a library.

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod config;
pub mod generation;
pub mod pipeline;
pub mod prompts;
pub mod snippet;
