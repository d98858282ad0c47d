//! Run phases and the end-of-run summary.

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// TrackPhase
// ---------------------------------------------------------------------------

/// Where the orchestrator is in a run.
///
/// ```text
/// Init ─▶ [ CheckLedger ─▶ (Generate | Reuse) ─▶ Analyze ─▶ Snippet ─▶ AppendRow ] × N
///      ─▶ FlushLedger ─▶ Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPhase {
    /// Loading the existing ledger and resolving model provenance.
    Init,
    CheckLedger,
    /// Calling the model and downloading its audio.
    Generate,
    /// Using audio and timing from a previous run.
    Reuse,
    Analyze,
    Snippet,
    AppendRow,
    FlushLedger,
    Done,
}

impl TrackPhase {
    /// Short label for log lines.
    ///
    /// ```
    /// use ai_music_pipeline::pipeline::TrackPhase;
    ///
    /// assert_eq!(TrackPhase::Generate.label(), "generate");
    /// assert_eq!(TrackPhase::FlushLedger.label(), "flush-ledger");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            TrackPhase::Init => "init",
            TrackPhase::CheckLedger => "check-ledger",
            TrackPhase::Generate => "generate",
            TrackPhase::Reuse => "reuse",
            TrackPhase::Analyze => "analyze",
            TrackPhase::Snippet => "snippet",
            TrackPhase::AppendRow => "append-row",
            TrackPhase::FlushLedger => "flush-ledger",
            TrackPhase::Done => "done",
        }
    }
}

impl Default for TrackPhase {
    fn default() -> Self {
        TrackPhase::Init
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// What a completed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ledger_path: PathBuf,
    pub rows: usize,
    pub generated: usize,
    pub reused: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_init() {
        assert_eq!(TrackPhase::default(), TrackPhase::Init);
    }

    #[test]
    fn labels_are_distinct() {
        let all = [
            TrackPhase::Init,
            TrackPhase::CheckLedger,
            TrackPhase::Generate,
            TrackPhase::Reuse,
            TrackPhase::Analyze,
            TrackPhase::Snippet,
            TrackPhase::AppendRow,
            TrackPhase::FlushLedger,
            TrackPhase::Done,
        ];
        let labels: std::collections::HashSet<_> = all.iter().map(|p| p.label()).collect();
        assert_eq!(labels.len(), all.len());
    }
}
