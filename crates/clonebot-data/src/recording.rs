//! Recording file access and `--data` pattern expansion.

use std::{fs::File, io::BufReader, path::PathBuf};

use serde::Deserialize;
use serde_json::Value;

/// A recording file: a `frames` collection plus whatever metadata the
/// recorder wrote alongside it (ignored here).
///
/// Frames stay as raw JSON values so one malformed frame fails on its own
/// during extraction instead of poisoning the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct Recording {
    pub frames: Vec<Value>,
}

/// Why a recording file could not be read.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RecordingError {
    #[display("cannot open: {_0}")]
    Open(std::io::Error),
    #[display("cannot parse: {_0}")]
    Parse(serde_json::Error),
}

impl Recording {
    /// Opens and parses one recording file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened, is not JSON, or has
    /// no `frames` collection. Callers treat this as a per-file skip.
    pub fn open(path: &std::path::Path) -> Result<Self, RecordingError> {
        let file = File::open(path).map_err(RecordingError::Open)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(RecordingError::Parse)
    }
}

/// Expands the trainer's `--data` argument into concrete file paths.
///
/// A plain path is returned as-is; anything with glob metacharacters goes
/// through glob expansion. Unreadable directory entries during expansion are
/// dropped silently, matching glob-expansion semantics in a shell.
///
/// # Errors
///
/// Returns an error only for a syntactically invalid glob pattern.
pub fn expand_data_pattern(pattern: &str) -> Result<Vec<PathBuf>, glob::PatternError> {
    if !pattern.contains(['*', '?', '[']) {
        return Ok(vec![PathBuf::from(pattern)]);
    }
    let mut paths: Vec<PathBuf> = glob::glob(pattern)?.filter_map(Result::ok).collect();
    paths.sort();
    Ok(paths)
}
