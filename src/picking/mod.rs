//! First-break picking: task and result types, the batch runner, and the two
//! job kinds (model initialization and a picking run).

pub mod energy;
pub mod export;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::jobs::{Job, JobContext, JobError, JobKind, JobPayload};
use crate::model::{ModelError, ModelLoader, PickingModel, SharedModelHandle};
use crate::traces::TraceSet;

pub use energy::{EnergyRatioLoader, EnergyRatioModel, EnergyRatioParams};

/// Input for one picking run.
#[derive(Clone, Debug)]
pub struct PickingTask {
    pub traces: Arc<TraceSet>,
    pub traces_per_gather: usize,
}

/// Per-trace picks in sample units.
#[derive(Clone, Debug, PartialEq)]
pub struct Picks {
    pub samples: Vec<usize>,
    pub confidence: Vec<f32>,
    pub dt_ms: f32,
}

impl Picks {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times_ms(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples
            .iter()
            .map(move |&sample| sample as f32 * self.dt_ms)
    }
}

/// Outcome of a picking run. Failures are carried as data.
#[derive(Clone, Debug)]
pub struct PickingResult {
    pub success: bool,
    pub error_message: Option<String>,
    pub num_batches: usize,
    pub picks: Option<Picks>,
    pub elapsed: Duration,
}

impl PickingResult {
    pub fn succeeded(picks: Picks, num_batches: usize, elapsed: Duration) -> Self {
        Self {
            success: true,
            error_message: None,
            num_batches,
            picks: Some(picks),
            elapsed,
        }
    }

    pub fn failed(message: impl Into<String>, num_batches: usize, elapsed: Duration) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            num_batches,
            picks: None,
            elapsed,
        }
    }

    /// Mean wall time per gather, if any gathers ran.
    pub fn time_per_batch(&self) -> Option<Duration> {
        u32::try_from(self.num_batches)
            .ok()
            .filter(|&batches| batches > 0)
            .map(|batches| self.elapsed / batches)
    }
}

/// Reasons a picking run cannot produce picks.
#[derive(Debug, Error)]
pub enum PickingError {
    #[error("Model is not loaded")]
    NoModel,
    #[error("Traces per gather must be at least 1")]
    InvalidGatherSize,
    #[error("Trace file contains no traces")]
    NoTraces,
    #[error("Gather {gather}: {source}")]
    Model { gather: usize, source: ModelError },
    #[error("Gather {gather}: engine returned {got} picks for {expected} traces")]
    PickCountMismatch {
        gather: usize,
        expected: usize,
        got: usize,
    },
    #[error("Picking cancelled")]
    Cancelled,
}

/// Pick every gather of `task` with `model`, reporting progress through `ctx`.
pub fn run_picking(
    model: &dyn PickingModel,
    task: &PickingTask,
    ctx: &JobContext,
) -> Result<Picks, PickingError> {
    if task.traces_per_gather == 0 {
        return Err(PickingError::InvalidGatherSize);
    }
    let traces = task.traces.as_ref();
    if traces.num_traces() == 0 || traces.num_samples() == 0 {
        return Err(PickingError::NoTraces);
    }

    let gathers = traces.gather_count(task.traces_per_gather);
    let mut picks = Picks {
        samples: Vec::with_capacity(traces.num_traces()),
        confidence: Vec::with_capacity(traces.num_traces()),
        dt_ms: traces.dt_ms,
    };
    ctx.message(format!("Picking {} traces with {}", traces.num_traces(), model.name()));
    for index in 0..gathers {
        if ctx.is_cancelled() {
            return Err(PickingError::Cancelled);
        }
        let Some(gather) = traces.gather(index, task.traces_per_gather) else {
            break;
        };
        let expected = gather.ncols();
        let gather_picks = model
            .pick_gather(gather, traces.dt_ms)
            .map_err(|source| PickingError::Model {
                gather: index,
                source,
            })?;
        if gather_picks.len() != expected {
            return Err(PickingError::PickCountMismatch {
                gather: index,
                expected,
                got: gather_picks.len(),
            });
        }
        for pick in gather_picks {
            picks.samples.push(pick.sample.min(traces.num_samples() - 1));
            picks.confidence.push(pick.confidence.clamp(0.0, 1.0));
        }
        ctx.progress(percent(index + 1, gathers));
        ctx.message(format!("Picked gather {}/{}", index + 1, gathers));
    }
    Ok(picks)
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

/// Loads a model from a weights file on a worker thread.
pub struct ModelInitJob {
    weights: PathBuf,
    loader: Arc<dyn ModelLoader>,
}

impl ModelInitJob {
    pub fn new(weights: PathBuf, loader: Arc<dyn ModelLoader>) -> Self {
        Self { weights, loader }
    }
}

impl Job for ModelInitJob {
    fn kind(&self) -> JobKind {
        JobKind::ModelInit
    }

    fn run(&mut self, ctx: &JobContext) -> Result<Option<JobPayload>, JobError> {
        ctx.message(format!("Loading model from {}", self.weights.display()));
        let started = Instant::now();
        let model = self
            .loader
            .load(&self.weights)
            .map_err(|err| JobError::Fault(err.to_string()))?;
        info!(
            "Loaded model {} in {:.2?}",
            model.name(),
            started.elapsed()
        );
        Ok(Some(JobPayload::Model(model)))
    }
}

/// Runs the loaded model over a trace set.
pub struct PickingJob {
    task: PickingTask,
    model: SharedModelHandle,
}

impl PickingJob {
    pub fn new(task: PickingTask, model: SharedModelHandle) -> Self {
        Self { task, model }
    }
}

impl Job for PickingJob {
    fn kind(&self) -> JobKind {
        JobKind::Picking
    }

    fn run(&mut self, ctx: &JobContext) -> Result<Option<JobPayload>, JobError> {
        let started = Instant::now();
        let batches = self
            .task
            .traces
            .gather_count(self.task.traces_per_gather);
        let outcome = match self.model.get() {
            Some(model) => run_picking(model.as_ref(), &self.task, ctx),
            None => Err(PickingError::NoModel),
        };
        let elapsed = started.elapsed();
        let result = match outcome {
            Ok(picks) => PickingResult::succeeded(picks, batches, elapsed),
            Err(PickingError::Cancelled) => return Err(JobError::Cancelled),
            Err(err) => PickingResult::failed(err.to_string(), batches, elapsed),
        };
        Ok(Some(JobPayload::Picking(result)))
    }

    fn fault_payload(&self, message: &str) -> Option<JobPayload> {
        Some(JobPayload::Picking(PickingResult::failed(
            message,
            0,
            Duration::ZERO,
        )))
    }
}
