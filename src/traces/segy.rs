//! Minimal big-endian SEG-Y reader.
//!
//! Reads the binary file header for the sample interval, sample count and
//! sample format, then decodes every trace body into one column of the
//! returned [`TraceSet`]. Trace headers are skipped.

use std::path::Path;

use ndarray::Array2;
use tracing::debug;

use super::{TraceError, TraceReader, TraceSet};

const TEXT_HEADER_BYTES: usize = 3200;
const BINARY_HEADER_BYTES: usize = 400;
const TRACE_HEADER_BYTES: usize = 240;
const FILE_HEADER_BYTES: usize = TEXT_HEADER_BYTES + BINARY_HEADER_BYTES;

const BIN_SAMPLE_INTERVAL: usize = TEXT_HEADER_BYTES + 16;
const BIN_SAMPLES_PER_TRACE: usize = TEXT_HEADER_BYTES + 20;
const BIN_FORMAT_CODE: usize = TEXT_HEADER_BYTES + 24;
const BIN_EXTENDED_HEADERS: usize = TEXT_HEADER_BYTES + 304;
const TRACE_SAMPLE_COUNT: usize = 114;
const TRACE_SAMPLE_INTERVAL: usize = 116;

/// Sample encodings supported by the reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SampleFormat {
    IbmFloat,
    Int32,
    Int16,
    IeeeFloat,
    Int8,
}

impl SampleFormat {
    fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::IbmFloat),
            2 => Some(Self::Int32),
            3 => Some(Self::Int16),
            5 => Some(Self::IeeeFloat),
            8 => Some(Self::Int8),
            _ => None,
        }
    }

    fn bytes(self) -> usize {
        match self {
            Self::IbmFloat | Self::Int32 | Self::IeeeFloat => 4,
            Self::Int16 => 2,
            Self::Int8 => 1,
        }
    }

    fn decode(self, bytes: &[u8]) -> f32 {
        match self {
            Self::IbmFloat => ibm_to_f32(be_u32(bytes)),
            Self::Int32 => be_u32(bytes) as i32 as f32,
            Self::Int16 => i16::from_be_bytes([bytes[0], bytes[1]]) as f32,
            Self::IeeeFloat => f32::from_bits(be_u32(bytes)),
            Self::Int8 => bytes[0] as i8 as f32,
        }
    }
}

/// Default [`TraceReader`] for `.sgy` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegyReader;

impl TraceReader for SegyReader {
    fn read(&self, path: &Path) -> Result<TraceSet, TraceError> {
        let bytes = std::fs::read(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(path, &bytes)
    }
}

fn parse(path: &Path, bytes: &[u8]) -> Result<TraceSet, TraceError> {
    if bytes.len() < FILE_HEADER_BYTES {
        return Err(TraceError::Truncated {
            path: path.to_path_buf(),
            len: bytes.len(),
        });
    }
    let layout_error = |reason: String| TraceError::Layout {
        path: path.to_path_buf(),
        reason,
    };

    let code = be_i16(&bytes[BIN_FORMAT_CODE..]);
    let format = SampleFormat::from_code(code).ok_or_else(|| TraceError::UnsupportedFormat {
        path: path.to_path_buf(),
        code,
    })?;
    let extended = be_i16(&bytes[BIN_EXTENDED_HEADERS..]).max(0) as usize;
    let data_start = FILE_HEADER_BYTES + extended * TEXT_HEADER_BYTES;
    if bytes.len() < data_start + TRACE_HEADER_BYTES {
        return Err(layout_error("no traces after file headers".to_string()));
    }

    let first_trace = &bytes[data_start..];
    let mut num_samples = be_u16(&bytes[BIN_SAMPLES_PER_TRACE..]) as usize;
    if num_samples == 0 {
        num_samples = be_u16(&first_trace[TRACE_SAMPLE_COUNT..]) as usize;
    }
    let mut interval_us = be_u16(&bytes[BIN_SAMPLE_INTERVAL..]);
    if interval_us == 0 {
        interval_us = be_u16(&first_trace[TRACE_SAMPLE_INTERVAL..]);
    }
    if num_samples == 0 {
        return Err(layout_error("sample count is zero".to_string()));
    }
    if interval_us == 0 {
        return Err(layout_error("sample interval is zero".to_string()));
    }

    let sample_bytes = format.bytes();
    let trace_bytes = TRACE_HEADER_BYTES + num_samples * sample_bytes;
    let body = &bytes[data_start..];
    if body.len() % trace_bytes != 0 {
        return Err(layout_error(format!(
            "{} trailing bytes do not form whole traces of {trace_bytes} bytes",
            body.len() % trace_bytes
        )));
    }
    let num_traces = body.len() / trace_bytes;

    let mut data = Array2::<f32>::zeros((num_samples, num_traces));
    for (trace_idx, trace) in body.chunks_exact(trace_bytes).enumerate() {
        let samples = &trace[TRACE_HEADER_BYTES..];
        for (sample_idx, raw) in samples.chunks_exact(sample_bytes).enumerate() {
            data[[sample_idx, trace_idx]] = format.decode(raw);
        }
    }
    debug!(
        "Read {} traces x {} samples ({:?}) from {}",
        num_traces,
        num_samples,
        format,
        path.display()
    );
    Ok(TraceSet::new(
        path.to_path_buf(),
        data,
        interval_us as f32 / 1000.0,
    ))
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn be_i16(bytes: &[u8]) -> i16 {
    i16::from_be_bytes([bytes[0], bytes[1]])
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// IBM System/360 single precision: sign, base-16 exponent biased by 64, 24-bit fraction.
fn ibm_to_f32(bits: u32) -> f32 {
    let fraction = bits & 0x00ff_ffff;
    if fraction == 0 {
        return 0.0;
    }
    let sign = if bits >> 31 == 0 { 1.0 } else { -1.0 };
    let exponent = ((bits >> 24) & 0x7f) as i32 - 64;
    let mantissa = fraction as f64 / 16_777_216.0;
    (sign * mantissa * 16f64.powi(exponent)) as f32
}
