//! Worker pool that runs jobs off the coordinating thread.
//!
//! With `max_workers == 0` each job gets its own thread, so any number of
//! jobs run in parallel. Otherwise a fixed pool of workers drains a shared
//! queue. Signals from every job arrive on one channel, drained by the
//! coordinator with [`JobScheduler::try_recv`].

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{
    Arc, Mutex,
    mpsc::{Receiver, RecvTimeoutError, Sender, channel},
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::runner;
use super::{CancelToken, Job, JobEvent, JobId, JobKind};

/// Errors raised while handing a job to the pool.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),
    #[error("Worker pool is shut down")]
    PoolClosed,
}

/// Receipt for a submitted job.
#[derive(Clone, Debug)]
pub struct JobTicket {
    pub id: JobId,
    pub kind: JobKind,
    cancel: CancelToken,
}

impl JobTicket {
    /// Request cooperative cancellation; `Finished` still fires.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct QueuedJob {
    id: JobId,
    job: Box<dyn Job>,
    cancel: CancelToken,
}

enum Pool {
    Unbounded {
        threads: Vec<JoinHandle<()>>,
    },
    Bounded {
        size: usize,
        queue_tx: Option<Sender<QueuedJob>>,
        queue_rx: Arc<Mutex<Receiver<QueuedJob>>>,
        workers: Vec<JoinHandle<()>>,
    },
}

/// Submits jobs to worker threads and collects their signals.
pub struct JobScheduler {
    next_id: u64,
    event_tx: Sender<JobEvent>,
    event_rx: Receiver<JobEvent>,
    active: HashMap<JobId, CancelToken>,
    pool: Pool,
}

impl JobScheduler {
    /// Create a scheduler; `max_workers == 0` means no concurrency limit.
    pub fn new(max_workers: usize) -> Self {
        let (event_tx, event_rx) = channel();
        let pool = if max_workers == 0 {
            Pool::Unbounded {
                threads: Vec::new(),
            }
        } else {
            let (queue_tx, queue_rx) = channel();
            Pool::Bounded {
                size: max_workers,
                queue_tx: Some(queue_tx),
                queue_rx: Arc::new(Mutex::new(queue_rx)),
                workers: Vec::new(),
            }
        };
        Self {
            next_id: 1,
            event_tx,
            event_rx,
            active: HashMap::new(),
            pool,
        }
    }

    /// Hand `job` to the pool without blocking the caller.
    pub fn submit(&mut self, job: Box<dyn Job>) -> Result<JobTicket, SchedulerError> {
        let id = JobId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let kind = job.kind();
        let cancel = CancelToken::new();
        let queued = QueuedJob {
            id,
            job,
            cancel: cancel.clone(),
        };

        match &mut self.pool {
            Pool::Unbounded { threads } => {
                threads.retain(|handle| !handle.is_finished());
                let tx = self.event_tx.clone();
                let handle = thread::Builder::new()
                    .name(format!("fbpick-job-{}", id.0))
                    .spawn(move || runner::execute(queued.id, queued.job, tx, queued.cancel))
                    .map_err(SchedulerError::Spawn)?;
                threads.push(handle);
            }
            Pool::Bounded {
                size,
                queue_tx,
                queue_rx,
                workers,
            } => {
                if workers.is_empty() {
                    for index in 0..*size {
                        workers.push(spawn_worker(
                            index,
                            queue_rx.clone(),
                            self.event_tx.clone(),
                        )?);
                    }
                }
                let sender = queue_tx.as_ref().ok_or(SchedulerError::PoolClosed)?;
                sender.send(queued).map_err(|_| SchedulerError::PoolClosed)?;
            }
        }

        debug!("Submitted {kind} job {id}");
        self.active.insert(id, cancel.clone());
        Ok(JobTicket { id, kind, cancel })
    }

    /// Next pending signal, if any. Never blocks.
    pub fn try_recv(&mut self) -> Option<JobEvent> {
        let event = self.event_rx.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    /// Wait up to `timeout` for the next signal.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<JobEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.observe(&event);
                Some(event)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of submitted jobs whose `Finished` has not been received yet.
    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    fn observe(&mut self, event: &JobEvent) {
        if event.is_finished() {
            self.active.remove(&event.job_id);
        }
    }

    /// Cancel outstanding jobs and join every worker thread.
    pub fn shutdown(&mut self) {
        for cancel in self.active.values() {
            cancel.cancel();
        }
        let handles = match &mut self.pool {
            Pool::Unbounded { threads } => threads.drain(..).collect::<Vec<_>>(),
            Pool::Bounded {
                queue_tx, workers, ..
            } => {
                queue_tx.take();
                workers.drain(..).collect::<Vec<_>>()
            }
        };
        if !handles.is_empty() {
            info!("Stopping {} job thread(s)", handles.len());
        }
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(
    index: usize,
    queue: Arc<Mutex<Receiver<QueuedJob>>>,
    tx: Sender<JobEvent>,
) -> Result<JoinHandle<()>, SchedulerError> {
    thread::Builder::new()
        .name(format!("fbpick-worker-{index}"))
        .spawn(move || {
            loop {
                let next = {
                    let guard = match queue.lock() {
                        Ok(guard) => guard,
                        Err(_) => return,
                    };
                    guard.recv()
                };
                let Ok(queued) = next else {
                    return;
                };
                let (id, tx) = (queued.id, tx.clone());
                let run = AssertUnwindSafe(move || {
                    runner::execute(queued.id, queued.job, tx, queued.cancel)
                });
                if catch_unwind(run).is_err() {
                    warn!("Worker {index} recovered from a panic in job {id}");
                }
            }
        })
        .map_err(SchedulerError::Spawn)
}
