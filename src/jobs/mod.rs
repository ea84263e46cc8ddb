//! Background jobs and the signal protocol they report through.
//!
//! Every submitted job emits, in order: one [`JobSignal::Started`], any
//! number of [`JobSignal::Progress`] / [`JobSignal::Message`], at most one
//! [`JobSignal::Result`], and exactly one terminal [`JobSignal::Finished`].
//! The runner guarantees `Finished` on every exit path, panics included.

pub mod context;
pub(crate) mod runner;
pub mod scheduler;

use std::fmt;

use thiserror::Error;

use crate::model::ModelHandle;
use crate::picking::PickingResult;

pub use context::{CancelToken, JobContext};
pub use scheduler::{JobScheduler, JobTicket, SchedulerError};

/// Identifier assigned to a job at submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kinds of background work the application runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    ModelInit,
    Picking,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::ModelInit => f.write_str("model init"),
            JobKind::Picking => f.write_str("picking"),
        }
    }
}

/// Data produced by a job's work routine.
pub enum JobPayload {
    Model(ModelHandle),
    Picking(PickingResult),
}

impl JobPayload {
    /// Outcome implied by the payload when the work routine returned normally.
    fn outcome(&self) -> JobOutcome {
        match self {
            JobPayload::Picking(result) if !result.success => JobOutcome::DomainFailure(
                result
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Picking failed".to_string()),
            ),
            _ => JobOutcome::Succeeded,
        }
    }
}

impl fmt::Debug for JobPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobPayload::Model(model) => f.debug_tuple("Model").field(&model.name()).finish(),
            JobPayload::Picking(result) => f.debug_tuple("Picking").field(result).finish(),
        }
    }
}

/// How a job ended, reported with [`JobSignal::Finished`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    /// The work ran but the input could not be processed; details are in the result.
    DomainFailure(String),
    /// The work routine errored or panicked.
    Fault(String),
    Cancelled,
}

/// Lifecycle signal emitted by a running job.
#[derive(Debug)]
pub enum JobSignal {
    Started,
    Progress(u8),
    Message(String),
    Result(JobPayload),
    Finished(JobOutcome),
}

/// A signal tagged with the job that emitted it.
#[derive(Debug)]
pub struct JobEvent {
    pub job_id: JobId,
    pub kind: JobKind,
    pub signal: JobSignal,
}

impl JobEvent {
    pub fn is_finished(&self) -> bool {
        matches!(self.signal, JobSignal::Finished(_))
    }
}

/// Error returned by a job's work routine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("{0}")]
    Fault(String),
    #[error("Cancelled")]
    Cancelled,
}

/// A unit of background work.
pub trait Job: Send + 'static {
    fn kind(&self) -> JobKind;

    /// Run the work on a worker thread. `Ok(Some(_))` is emitted as the job's result.
    fn run(&mut self, ctx: &JobContext) -> Result<Option<JobPayload>, JobError>;

    /// Result to report when the work routine faults. Kinds that model failure
    /// as data return a failed payload here.
    fn fault_payload(&self, _message: &str) -> Option<JobPayload> {
        None
    }
}
