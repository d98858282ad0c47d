//! Fixed-length listening snippets.
//!
//! ```text
//! source WAV → loop to length → choose window (random | highest_rms)
//!            → linear fades → 16-bit WAV
//! ```

pub mod loudest;
pub mod method;
pub mod selector;

pub use loudest::loudest_window_ms;
pub use method::SnippetMethod;
pub use selector::{choose_start, random_start, select, Snippet};
