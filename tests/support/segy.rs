use std::path::Path;

const TEXT_HEADER_BYTES: usize = 3200;
const BINARY_HEADER_BYTES: usize = 400;
const TRACE_HEADER_BYTES: usize = 240;

/// Write `traces` (one Vec per trace) as a big-endian IEEE-float SEG-Y file.
pub fn write_test_segy(path: &Path, traces: &[Vec<f32>], interval_us: u16) {
    let num_samples = traces.first().map_or(0, Vec::len) as u16;
    let mut bytes = vec![0u8; TEXT_HEADER_BYTES + BINARY_HEADER_BYTES];
    bytes[3216..3218].copy_from_slice(&interval_us.to_be_bytes());
    bytes[3220..3222].copy_from_slice(&num_samples.to_be_bytes());
    bytes[3224..3226].copy_from_slice(&5i16.to_be_bytes());
    for trace in traces {
        assert_eq!(trace.len(), num_samples as usize, "ragged test traces");
        bytes.extend(std::iter::repeat_n(0u8, TRACE_HEADER_BYTES));
        for sample in trace {
            bytes.extend_from_slice(&sample.to_be_bytes());
        }
    }
    std::fs::write(path, bytes).expect("write test segy");
}

/// Quiet noise followed by a strong alternating signal from `onset` on.
pub fn onset_trace(num_samples: usize, onset: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|idx| {
            let amplitude = if idx >= onset { 1.0 } else { 0.01 };
            if idx % 2 == 0 { amplitude } else { -amplitude }
        })
        .collect()
}
