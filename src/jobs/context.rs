use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
};

use super::{JobError, JobEvent, JobId, JobKind, JobSignal};

/// Cooperative cancellation flag shared between a job and its submitter.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sends one job's signals. Once closed, further emits are dropped.
#[derive(Clone)]
pub(crate) struct SignalEmitter {
    job_id: JobId,
    kind: JobKind,
    tx: Sender<JobEvent>,
    closed: Arc<Mutex<bool>>,
}

impl SignalEmitter {
    pub(crate) fn new(job_id: JobId, kind: JobKind, tx: Sender<JobEvent>) -> Self {
        Self {
            job_id,
            kind,
            tx,
            closed: Arc::new(Mutex::new(false)),
        }
    }

    pub(crate) fn emit(&self, signal: JobSignal) {
        let closed = self.closed.lock().unwrap_or_else(|err| err.into_inner());
        if *closed {
            return;
        }
        self.send(signal);
    }

    /// Emit the terminal signal and refuse everything after it.
    pub(crate) fn close_with(&self, signal: JobSignal) {
        let mut closed = self.closed.lock().unwrap_or_else(|err| err.into_inner());
        if *closed {
            return;
        }
        self.send(signal);
        *closed = true;
    }

    fn send(&self, signal: JobSignal) {
        let _ = self.tx.send(JobEvent {
            job_id: self.job_id,
            kind: self.kind,
            signal,
        });
    }
}

/// Handle given to a job's work routine for reporting and cancellation checks.
pub struct JobContext {
    emitter: SignalEmitter,
    cancel: CancelToken,
}

impl JobContext {
    pub(crate) fn new(emitter: SignalEmitter, cancel: CancelToken) -> Self {
        Self { emitter, cancel }
    }

    /// Report percent complete; values above 100 are clamped.
    pub fn progress(&self, percent: u8) {
        self.emitter.emit(JobSignal::Progress(percent.min(100)));
    }

    pub fn message(&self, text: impl Into<String>) {
        self.emitter.emit(JobSignal::Message(text.into()));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Return `Err(JobError::Cancelled)` once cancellation has been requested.
    pub fn checkpoint(&self) -> Result<(), JobError> {
        if self.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}
