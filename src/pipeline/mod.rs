//! Batch orchestration and the resumable ledger.
//!
//! # Architecture
//!
//! ```text
//! prompts::sample ─▶ PipelineOrchestrator::run
//!                      for each track:
//!                        Ledger lookup ─┬─ reuse
//!                                       └─ ModelInvoker ─▶ acquire
//!                        analysis::extract ─▶ snippet::select ─▶ LedgerRow
//!                    ─▶ Ledger::save (temp file + rename)
//! ```
//!
//! # Modules
//!
//! - [`ledger`]: CSV rows, quoting and atomic save.
//! - [`state`]: [`TrackPhase`] and [`RunSummary`].
//! - [`runner`]: [`PipelineOrchestrator`], [`RunOptions`], [`PipelineError`].

pub mod ledger;
pub mod runner;
pub mod state;

pub use ledger::{Ledger, LedgerError, LedgerRow, COLUMNS};
pub use runner::{PipelineError, PipelineOrchestrator, RunOptions};
pub use state::{RunSummary, TrackPhase};
