//! Reference engine: short-term / long-term energy ratio onset picker.
//!
//! Its "weights" file is a JSON parameter set, so it can stand in for a
//! trained network behind the same [`ModelLoader`] seam and the same
//! fingerprint pinning.

use std::path::Path;
use std::sync::Arc;

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::model::{ModelError, ModelHandle, ModelLoader, PickingModel, TracePick};

const ENERGY_FLOOR: f64 = 1e-12;

/// Window lengths and trigger level read from the weights file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergyRatioParams {
    #[serde(default = "default_sta_ms")]
    pub sta_ms: f32,
    #[serde(default = "default_lta_ms")]
    pub lta_ms: f32,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for EnergyRatioParams {
    fn default() -> Self {
        Self {
            sta_ms: default_sta_ms(),
            lta_ms: default_lta_ms(),
            threshold: default_threshold(),
        }
    }
}

impl EnergyRatioParams {
    fn validate(&self) -> Result<(), String> {
        if !(self.sta_ms > 0.0) {
            return Err(format!("sta_ms must be positive, got {}", self.sta_ms));
        }
        if !(self.lta_ms > self.sta_ms) {
            return Err(format!(
                "lta_ms ({}) must exceed sta_ms ({})",
                self.lta_ms, self.sta_ms
            ));
        }
        if !(self.threshold > 0.0) {
            return Err(format!("threshold must be positive, got {}", self.threshold));
        }
        Ok(())
    }
}

fn default_sta_ms() -> f32 {
    10.0
}

fn default_lta_ms() -> f32 {
    60.0
}

fn default_threshold() -> f32 {
    4.0
}

/// Loads [`EnergyRatioModel`]s from JSON parameter files.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnergyRatioLoader;

impl ModelLoader for EnergyRatioLoader {
    fn load(&self, weights: &Path) -> Result<ModelHandle, ModelError> {
        let text = std::fs::read_to_string(weights).map_err(|source| ModelError::ReadWeights {
            path: weights.to_path_buf(),
            source,
        })?;
        let params: EnergyRatioParams =
            serde_json::from_str(&text).map_err(|err| ModelError::InvalidWeights {
                path: weights.to_path_buf(),
                reason: err.to_string(),
            })?;
        params
            .validate()
            .map_err(|reason| ModelError::InvalidWeights {
                path: weights.to_path_buf(),
                reason,
            })?;
        Ok(Arc::new(EnergyRatioModel::new(params)))
    }
}

/// Picks the first sample where trailing short-window energy exceeds the
/// preceding long-window energy by `threshold`.
#[derive(Clone, Debug)]
pub struct EnergyRatioModel {
    params: EnergyRatioParams,
}

impl EnergyRatioModel {
    pub fn new(params: EnergyRatioParams) -> Self {
        Self { params }
    }

    fn pick_trace(&self, trace: ArrayView1<'_, f32>, dt_ms: f32) -> TracePick {
        let samples = trace.len();
        let sta = window_samples(self.params.sta_ms, dt_ms);
        let lta = window_samples(self.params.lta_ms, dt_ms).max(sta + 1);
        if samples < sta + lta {
            return TracePick {
                sample: 0,
                confidence: 0.0,
            };
        }

        let mut cumulative = Vec::with_capacity(samples + 1);
        cumulative.push(0.0f64);
        for value in trace.iter() {
            let value = if value.is_finite() { *value as f64 } else { 0.0 };
            let last = cumulative.last().copied().unwrap_or(0.0);
            cumulative.push(last + value * value);
        }

        let threshold = self.params.threshold as f64;
        let mut best = (0usize, 0.0f64);
        for index in (sta + lta - 1)..samples {
            let sta_end = index + 1;
            let sta_start = sta_end - sta;
            let lta_start = sta_start - lta;
            let short = (cumulative[sta_end] - cumulative[sta_start]) / sta as f64;
            let long = (cumulative[sta_start] - cumulative[lta_start]) / lta as f64;
            let ratio = short / long.max(ENERGY_FLOOR);
            if ratio >= threshold {
                return TracePick {
                    sample: index,
                    confidence: confidence(ratio, threshold),
                };
            }
            if ratio > best.1 {
                best = (index, ratio);
            }
        }
        TracePick {
            sample: best.0,
            confidence: confidence(best.1, threshold),
        }
    }
}

impl PickingModel for EnergyRatioModel {
    fn pick_gather(
        &self,
        gather: ArrayView2<'_, f32>,
        dt_ms: f32,
    ) -> Result<Vec<TracePick>, ModelError> {
        if !(dt_ms > 0.0) {
            return Err(ModelError::Inference(format!(
                "sample interval must be positive, got {dt_ms}"
            )));
        }
        Ok(gather
            .columns()
            .into_iter()
            .map(|trace| self.pick_trace(trace, dt_ms))
            .collect())
    }

    fn name(&self) -> &str {
        "energy-ratio"
    }
}

fn window_samples(window_ms: f32, dt_ms: f32) -> usize {
    ((window_ms / dt_ms).round() as usize).max(1)
}

fn confidence(ratio: f64, threshold: f64) -> f32 {
    if ratio <= 0.0 {
        return 0.0;
    }
    (ratio / (ratio + threshold)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn params() -> EnergyRatioParams {
        EnergyRatioParams {
            sta_ms: 5.0,
            lta_ms: 20.0,
            threshold: 3.0,
        }
    }

    fn gather_with_onsets(onsets: &[usize], samples: usize) -> Array2<f32> {
        Array2::from_shape_fn((samples, onsets.len()), |(row, col)| {
            if row >= onsets[col] {
                if row % 2 == 0 { 1.0 } else { -1.0 }
            } else if row % 2 == 0 {
                0.01
            } else {
                -0.01
            }
        })
    }

    #[test]
    fn picks_the_onset_sample() {
        let model = EnergyRatioModel::new(params());
        let gather = gather_with_onsets(&[40, 55], 100);
        let picks = model.pick_gather(gather.view(), 1.0).unwrap();
        assert_eq!(picks.iter().map(|p| p.sample).collect::<Vec<_>>(), vec![40, 55]);
        assert!(picks.iter().all(|p| p.confidence > 0.5));
    }

    #[test]
    fn short_trace_gets_zero_confidence() {
        let model = EnergyRatioModel::new(params());
        let gather = gather_with_onsets(&[3], 10);
        let picks = model.pick_gather(gather.view(), 1.0).unwrap();
        assert_eq!(picks[0].sample, 0);
        assert_eq!(picks[0].confidence, 0.0);
    }

    #[test]
    fn flat_trace_falls_back_below_half_confidence() {
        let model = EnergyRatioModel::new(params());
        let gather = gather_with_onsets(&[1000], 100);
        let picks = model.pick_gather(gather.view(), 1.0).unwrap();
        assert!(picks[0].confidence < 0.5);
    }

    #[test]
    fn rejects_non_positive_sample_interval() {
        let model = EnergyRatioModel::new(params());
        let gather = gather_with_onsets(&[40], 100);
        assert!(model.pick_gather(gather.view(), 0.0).is_err());
    }

    #[test]
    fn loader_reads_and_validates_json_weights() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"sta_ms": 5, "lta_ms": 20, "threshold": 3}"#).unwrap();
        let model = EnergyRatioLoader.load(&good).unwrap();
        assert_eq!(model.name(), "energy-ratio");

        let defaults = dir.path().join("defaults.json");
        std::fs::write(&defaults, "{}").unwrap();
        assert!(EnergyRatioLoader.load(&defaults).is_ok());

        let inverted = dir.path().join("inverted.json");
        std::fs::write(&inverted, r#"{"sta_ms": 50, "lta_ms": 20}"#).unwrap();
        assert!(matches!(
            EnergyRatioLoader.load(&inverted),
            Err(ModelError::InvalidWeights { .. })
        ));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, b"\x00\x01binary").unwrap();
        assert!(matches!(
            EnergyRatioLoader.load(&garbage),
            Err(ModelError::InvalidWeights { .. } | ModelError::ReadWeights { .. })
        ));

        assert!(matches!(
            EnergyRatioLoader.load(&dir.path().join("absent.json")),
            Err(ModelError::ReadWeights { .. })
        ));
    }
}
