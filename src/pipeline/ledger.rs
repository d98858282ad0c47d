//! The CSV ledger: one row per track, used both as output and as resume
//! state.
//!
//! Rows are written with RFC-4180 quoting (fields containing a comma, quote
//! or line break are quoted, embedded quotes doubled) and read back with a
//! quote-aware parser. Columns are matched by header name on read.
//!
//! [`Ledger::save`] writes a sibling temp file and renames it into place, so
//! an interrupted run never leaves a half-written ledger behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analysis::FeatureVector;

/// Column order of the CSV.
pub const COLUMNS: [&str; 15] = [
    "song_id",
    "prompt",
    "model",
    "model_version",
    "audio_path",
    "generation_time_seconds",
    "snippet_path",
    "snippet_method",
    "snippet_length",
    "duration_seconds",
    "tempo_bpm",
    "rms_mean",
    "spectral_centroid_mean",
    "zero_crossing_rate_mean",
    "mfcc1_mean",
];

// ---------------------------------------------------------------------------
// LedgerError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ledger at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

// ---------------------------------------------------------------------------
// LedgerRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub song_id: String,
    pub prompt: String,
    pub model: String,
    /// Empty when the service could not report a version.
    pub model_version: String,
    pub audio_path: String,
    pub generation_time_seconds: f64,
    pub snippet_path: String,
    pub snippet_method: String,
    pub snippet_length: f64,
    pub features: FeatureVector,
}

impl LedgerRow {
    fn to_fields(&self) -> Vec<String> {
        let f = &self.features;
        vec![
            self.song_id.clone(),
            self.prompt.clone(),
            self.model.clone(),
            self.model_version.clone(),
            self.audio_path.clone(),
            fmt_float(self.generation_time_seconds),
            self.snippet_path.clone(),
            self.snippet_method.clone(),
            fmt_float(self.snippet_length),
            fmt_float(f.duration_seconds),
            fmt_float(f.tempo_bpm),
            fmt_float(f.rms_mean),
            fmt_float(f.spectral_centroid_mean),
            fmt_float(f.zero_crossing_rate_mean),
            fmt_float(f.mfcc1_mean),
        ]
    }

    fn from_record(
        columns: &HashMap<&str, usize>,
        record: &[String],
        line: usize,
    ) -> Result<Self, LedgerError> {
        let text = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .cloned()
                .unwrap_or_default()
        };
        let number = |name: &str| -> Result<f64, LedgerError> {
            let raw = text(name);
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(0.0);
            }
            raw.parse().map_err(|_| LedgerError::Malformed {
                line,
                reason: format!("{name} is not a number: {raw:?}"),
            })
        };

        Ok(Self {
            song_id: text("song_id"),
            prompt: text("prompt"),
            model: text("model"),
            model_version: text("model_version"),
            audio_path: text("audio_path"),
            generation_time_seconds: number("generation_time_seconds")?,
            snippet_path: text("snippet_path"),
            snippet_method: text("snippet_method"),
            snippet_length: number("snippet_length")?,
            features: FeatureVector {
                duration_seconds: number("duration_seconds")?,
                tempo_bpm: number("tempo_bpm")?,
                rms_mean: number("rms_mean")?,
                spectral_centroid_mean: number("spectral_centroid_mean")?,
                zero_crossing_rate_mean: number("zero_crossing_rate_mean")?,
                mfcc1_mean: number("mfcc1_mean")?,
            },
        })
    }
}

/// Whole numbers keep one decimal so `15.0` does not read back as an
/// integer column.
fn fmt_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

// ---------------------------------------------------------------------------
// CSV text
// ---------------------------------------------------------------------------

pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Split CSV text into records. Quoted fields may contain commas, doubled
/// quotes and line breaks. Blank lines are skipped.
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>, LedgerError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            '"' => {
                return Err(LedgerError::Malformed {
                    line,
                    reason: "quote inside unquoted field".into(),
                })
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(LedgerError::Malformed {
            line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Ordered ledger rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: LedgerRow) {
        self.rows.push(row);
    }

    /// First row recorded for `audio_path`.
    pub fn find_by_audio_path(&self, audio_path: &str) -> Option<&LedgerRow> {
        self.rows.iter().find(|r| r.audio_path == audio_path)
    }

    /// Parse ledger CSV text. The header must name an `audio_path` column.
    pub fn parse(text: &str) -> Result<Self, LedgerError> {
        let mut records = parse_records(text)?.into_iter();
        let Some(header) = records.next() else {
            return Ok(Self::new());
        };
        let columns: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();
        if !columns.contains_key("audio_path") {
            return Err(LedgerError::Malformed {
                line: 1,
                reason: "header has no audio_path column".into(),
            });
        }

        let rows = records
            .enumerate()
            .map(|(i, record)| LedgerRow::from_record(&columns, &record, i + 2))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Load `path` if it exists. An unreadable or malformed ledger is
    /// logged and treated as empty.
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }
        match Self::load(path) {
            Ok(ledger) => {
                log::info!("loaded {} ledger row(s) from {}", ledger.len(), path.display());
                ledger
            }
            Err(e) => {
                log::warn!("ignoring unreadable ledger {}: {e}", path.display());
                Self::new()
            }
        }
    }

    pub fn to_csv(&self) -> String {
        let mut out = COLUMNS.join(",");
        out.push('\n');
        for row in &self.rows {
            let fields: Vec<String> = row.to_fields().iter().map(|f| csv_escape(f)).collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// Replace `path` with this ledger via a sibling temp file.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(path);
        std::fs::write(&tmp, self.to_csv())?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(n: u32, prompt: &str) -> LedgerRow {
        LedgerRow {
            song_id: format!("00000000-0000-4000-8000-00000000000{n}"),
            prompt: prompt.into(),
            model: "lucataco/ace-step".into(),
            model_version: String::new(),
            audio_path: format!("outputs/audio/song_{n:02}.wav"),
            generation_time_seconds: 12.345,
            snippet_path: format!("outputs/snippets/song_{n:02}_snippet.wav"),
            snippet_method: "random".into(),
            snippet_length: 15.0,
            features: FeatureVector {
                duration_seconds: 30.0,
                tempo_bpm: 117.45383522727273,
                rms_mean: 0.1,
                spectral_centroid_mean: 1834.5,
                zero_crossing_rate_mean: 0.05,
                mfcc1_mean: -210.75,
            },
        }
    }

    #[test]
    fn escape_quotes_only_when_needed() {
        assert_eq!(csv_escape("hello"), "hello");
        assert_eq!(csv_escape("a, b"), "\"a, b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn header_matches_column_order() {
        let csv = Ledger::new().to_csv();
        assert_eq!(
            csv.trim_end(),
            "song_id,prompt,model,model_version,audio_path,generation_time_seconds,\
             snippet_path,snippet_method,snippet_length,duration_seconds,tempo_bpm,\
             rms_mean,spectral_centroid_mean,zero_crossing_rate_mean,mfcc1_mean"
        );
    }

    #[test]
    fn whole_numbers_keep_a_decimal() {
        assert_eq!(fmt_float(15.0), "15.0");
        assert_eq!(fmt_float(0.0), "0.0");
        assert_eq!(fmt_float(12.345), "12.345");
    }

    #[test]
    fn quoted_prompts_survive_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("tracks.csv");
        let mut ledger = Ledger::new();
        ledger.push(row(1, "Lo-fi hip hop, mellow \"vinyl\" crackle"));
        ledger.push(row(2, "Line one\nline two"));

        ledger.save(&path).unwrap();
        let loaded = Ledger::load(&path).unwrap();

        assert_eq!(loaded, ledger);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn columns_are_matched_by_name() {
        let text = "audio_path,generation_time_seconds,extra\n\
                    outputs/audio/song_01.wav,4.5,x\n";
        let ledger = Ledger::parse(text).unwrap();
        let r = ledger.find_by_audio_path("outputs/audio/song_01.wav").unwrap();
        assert_eq!(r.generation_time_seconds, 4.5);
        assert_eq!(r.prompt, "");
        assert!(ledger.find_by_audio_path("outputs/audio/song_02.wav").is_none());
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let text = "audio_path,generation_time_seconds\r\n\r\na.wav,1.0\r\n";
        let ledger = Ledger::parse(text).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.rows()[0].audio_path, "a.wav");
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert!(matches!(
            Ledger::parse("prompt\n\"unterminated\n"),
            Err(LedgerError::Malformed { .. })
        ));
        assert!(matches!(
            Ledger::parse("prompt,model\nfoo,bar\n"),
            Err(LedgerError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            Ledger::parse("audio_path,generation_time_seconds\na.wav,fast\n"),
            Err(LedgerError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn unreadable_ledger_loads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        assert!(Ledger::load_or_empty(&path).is_empty());

        std::fs::write(&path, "garbage \"here\n").unwrap();
        assert!(Ledger::load_or_empty(&path).is_empty());
    }
}
