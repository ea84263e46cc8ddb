//! JSON export of picking results.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::Picks;

/// Errors raised while writing picks to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: no picks available")]
    NoPicks,
    #[error("Failed to serialize picks: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// On-disk layout of an exported pick file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicksExport {
    pub source: PathBuf,
    pub dt_ms: f32,
    pub picks: Vec<TracePickRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePickRecord {
    pub trace: usize,
    pub sample: usize,
    pub time_ms: f32,
    pub confidence: f32,
}

impl PicksExport {
    pub fn from_picks(source: &Path, picks: &Picks) -> Self {
        let records = picks
            .samples
            .iter()
            .zip(picks.times_ms())
            .zip(picks.confidence.iter())
            .enumerate()
            .map(|(trace, ((&sample, time_ms), &confidence))| TracePickRecord {
                trace,
                sample,
                time_ms,
                confidence,
            })
            .collect();
        Self {
            source: source.to_path_buf(),
            dt_ms: picks.dt_ms,
            picks: records,
        }
    }
}

/// Write `picks` as pretty JSON to `dest`, replacing it atomically.
pub fn write_picks_json(dest: &Path, source: &Path, picks: &Picks) -> Result<(), ExportError> {
    if picks.is_empty() {
        return Err(ExportError::NoPicks);
    }
    let body = serde_json::to_vec_pretty(&PicksExport::from_picks(source, picks))?;
    let write_error = |source: std::io::Error| ExportError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let parent = dest
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent).map_err(write_error)?;
    tmp.write_all(&body).map_err(write_error)?;
    tmp.flush().map_err(write_error)?;
    tmp.persist(dest).map_err(|err| write_error(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picks() -> Picks {
        Picks {
            samples: vec![10, 12],
            confidence: vec![0.9, 0.4],
            dt_ms: 2.0,
        }
    }

    #[test]
    fn writes_one_record_per_trace() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("picks.json");
        write_picks_json(&dest, Path::new("/data/line.sgy"), &picks()).unwrap();

        let parsed: PicksExport =
            serde_json::from_slice(&std::fs::read(&dest).unwrap()).unwrap();
        assert_eq!(parsed.source, PathBuf::from("/data/line.sgy"));
        assert_eq!(parsed.picks.len(), 2);
        assert_eq!(
            parsed.picks[1],
            TracePickRecord {
                trace: 1,
                sample: 12,
                time_ms: 24.0,
                confidence: 0.4,
            }
        );
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("picks.json");
        std::fs::write(&dest, "stale").unwrap();
        write_picks_json(&dest, Path::new("line.sgy"), &picks()).unwrap();
        assert!(std::fs::read_to_string(&dest).unwrap().contains("\"time_ms\""));
    }

    #[test]
    fn empty_picks_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let empty = Picks {
            samples: Vec::new(),
            confidence: Vec::new(),
            dt_ms: 1.0,
        };
        let err = write_picks_json(&dir.path().join("picks.json"), Path::new("x"), &empty)
            .unwrap_err();
        assert!(matches!(err, ExportError::NoPicks));
    }
}
