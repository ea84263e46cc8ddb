//! Seismic trace data and the reader seam used to load it.

pub mod segy;

use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2, s};
use thiserror::Error;

pub use segy::SegyReader;

/// A loaded trace file: samples laid out as `(num_samples, num_traces)`.
#[derive(Clone, Debug)]
pub struct TraceSet {
    pub path: PathBuf,
    pub data: Array2<f32>,
    /// Sample interval in milliseconds.
    pub dt_ms: f32,
}

impl TraceSet {
    pub fn new(path: PathBuf, data: Array2<f32>, dt_ms: f32) -> Self {
        Self { path, data, dt_ms }
    }

    pub fn num_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_traces(&self) -> usize {
        self.data.ncols()
    }

    /// Number of gathers when traces are grouped `traces_per_gather` at a time.
    pub fn gather_count(&self, traces_per_gather: usize) -> usize {
        if traces_per_gather == 0 {
            return 0;
        }
        self.num_traces().div_ceil(traces_per_gather)
    }

    /// View of gather `index`; the final gather may be narrower than the rest.
    pub fn gather(&self, index: usize, traces_per_gather: usize) -> Option<ArrayView2<'_, f32>> {
        let start = index.checked_mul(traces_per_gather)?;
        if traces_per_gather == 0 || start >= self.num_traces() {
            return None;
        }
        let end = (start + traces_per_gather).min(self.num_traces());
        Some(self.data.slice(s![.., start..end]))
    }
}

/// Errors raised while reading a trace file.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is too short to hold a SEG-Y header ({len} bytes)")]
    Truncated { path: PathBuf, len: usize },
    #[error("Unsupported sample format code {code} in {path}")]
    UnsupportedFormat { path: PathBuf, code: i16 },
    #[error("Invalid trace layout in {path}: {reason}")]
    Layout { path: PathBuf, reason: String },
}

impl TraceError {
    /// Short category label shown as the warning dialog title.
    pub fn category(&self) -> &'static str {
        match self {
            TraceError::Io { .. } => "IoError",
            TraceError::Truncated { .. } => "TruncatedFileError",
            TraceError::UnsupportedFormat { .. } => "UnsupportedFormatError",
            TraceError::Layout { .. } => "LayoutError",
        }
    }
}

/// Reads a trace file into memory.
pub trait TraceReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<TraceSet, TraceError>;
}
