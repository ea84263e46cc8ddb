use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::Sender;

use tracing::{debug, warn};

use super::context::SignalEmitter;
use super::{
    CancelToken, Job, JobContext, JobError, JobEvent, JobId, JobOutcome, JobPayload, JobSignal,
};

/// A held job slot. Dropping it without calling [`JobSlot::finish`] still
/// emits `Finished`, so the coordinator always sees a terminal signal.
struct JobSlot {
    job_id: JobId,
    emitter: SignalEmitter,
    finished: bool,
}

impl JobSlot {
    fn acquire(job_id: JobId, emitter: SignalEmitter) -> Self {
        emitter.emit(JobSignal::Started);
        Self {
            job_id,
            emitter,
            finished: false,
        }
    }

    fn finish(mut self, outcome: JobOutcome) {
        self.emitter.close_with(JobSignal::Finished(outcome));
        self.finished = true;
    }
}

impl Drop for JobSlot {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Job {} released without an outcome", self.job_id);
        self.emitter.close_with(JobSignal::Finished(JobOutcome::Fault(
            "Job ended without reporting an outcome".to_string(),
        )));
    }
}

/// Run `job` on the current thread, emitting its full signal sequence to `tx`.
pub(crate) fn execute(
    job_id: JobId,
    mut job: Box<dyn Job>,
    tx: Sender<JobEvent>,
    cancel: CancelToken,
) {
    let kind = job.kind();
    let emitter = SignalEmitter::new(job_id, kind, tx);
    let slot = JobSlot::acquire(job_id, emitter.clone());
    let ctx = JobContext::new(emitter.clone(), cancel);

    let report = if ctx.is_cancelled() {
        Err(JobError::Cancelled)
    } else {
        catch_unwind(AssertUnwindSafe(|| job.run(&ctx)))
            .unwrap_or_else(|payload| Err(JobError::Fault(panic_to_string(payload))))
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| settle(&*job, report, &emitter)))
        .unwrap_or_else(|payload| JobOutcome::Fault(panic_to_string(payload)));
    if catch_unwind(AssertUnwindSafe(move || drop(job))).is_err() {
        warn!("{kind} job {job_id} panicked while being dropped");
    }
    debug!("{kind} job {job_id} finished: {outcome:?}");
    slot.finish(outcome);
}

/// Turn the work routine's report into an outcome, emitting any `Result`.
fn settle(
    job: &dyn Job,
    report: Result<Option<JobPayload>, JobError>,
    emitter: &SignalEmitter,
) -> JobOutcome {
    match report {
        Ok(Some(payload)) => {
            let outcome = payload.outcome();
            emitter.emit(JobSignal::Result(payload));
            outcome
        }
        Ok(None) => JobOutcome::Succeeded,
        Err(JobError::Cancelled) => JobOutcome::Cancelled,
        Err(JobError::Fault(message)) => {
            warn!("{} job faulted: {message}", job.kind());
            if let Some(payload) = job.fault_payload(&message) {
                emitter.emit(JobSignal::Result(payload));
            }
            JobOutcome::Fault(message)
        }
    }
}

fn panic_to_string(payload: Box<dyn std::any::Any + Send>) -> String {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown panic payload".to_string()
    };
    format!("Job worker panicked: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobKind;
    use crate::picking::PickingResult;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    struct Scripted {
        kind: JobKind,
        script: fn(&JobContext) -> Result<Option<JobPayload>, JobError>,
    }

    impl Job for Scripted {
        fn kind(&self) -> JobKind {
            self.kind
        }

        fn run(&mut self, ctx: &JobContext) -> Result<Option<JobPayload>, JobError> {
            (self.script)(ctx)
        }

        fn fault_payload(&self, message: &str) -> Option<JobPayload> {
            (self.kind == JobKind::Picking).then(|| {
                JobPayload::Picking(PickingResult::failed(message, 0, Duration::ZERO))
            })
        }
    }

    fn run_script(
        kind: JobKind,
        script: fn(&JobContext) -> Result<Option<JobPayload>, JobError>,
        cancel: CancelToken,
    ) -> Vec<JobSignal> {
        let (tx, rx) = channel();
        execute(JobId(1), Box::new(Scripted { kind, script }), tx, cancel);
        rx.try_iter().map(|event| event.signal).collect()
    }

    fn names(signals: &[JobSignal]) -> Vec<&'static str> {
        signals
            .iter()
            .map(|signal| match signal {
                JobSignal::Started => "started",
                JobSignal::Progress(_) => "progress",
                JobSignal::Message(_) => "message",
                JobSignal::Result(_) => "result",
                JobSignal::Finished(_) => "finished",
            })
            .collect()
    }

    fn outcome(signals: &[JobSignal]) -> &JobOutcome {
        match signals.last() {
            Some(JobSignal::Finished(outcome)) => outcome,
            other => panic!("last signal is not finished: {other:?}"),
        }
    }

    #[test]
    fn successful_job_reports_full_sequence() {
        let signals = run_script(
            JobKind::Picking,
            |ctx| {
                ctx.message("working");
                ctx.progress(50);
                ctx.progress(250);
                Ok(Some(JobPayload::Picking(PickingResult::failed(
                    "no picks",
                    1,
                    Duration::ZERO,
                ))))
            },
            CancelToken::new(),
        );
        assert_eq!(
            names(&signals),
            vec!["started", "message", "progress", "progress", "result", "finished"]
        );
        assert!(matches!(signals[3], JobSignal::Progress(100)));
        assert_eq!(
            outcome(&signals),
            &JobOutcome::DomainFailure("no picks".to_string())
        );
    }

    #[test]
    fn job_without_payload_finishes_without_result() {
        let signals = run_script(JobKind::ModelInit, |_| Ok(None), CancelToken::new());
        assert_eq!(names(&signals), vec!["started", "finished"]);
        assert_eq!(outcome(&signals), &JobOutcome::Succeeded);
    }

    #[test]
    fn fault_without_fault_payload_skips_result() {
        let signals = run_script(
            JobKind::ModelInit,
            |_| Err(JobError::Fault("bad weights".to_string())),
            CancelToken::new(),
        );
        assert_eq!(names(&signals), vec!["started", "finished"]);
        assert_eq!(outcome(&signals), &JobOutcome::Fault("bad weights".to_string()));
    }

    #[test]
    fn panic_is_converted_into_failed_result_and_finished() {
        let signals = run_script(
            JobKind::Picking,
            |ctx| {
                ctx.progress(10);
                panic!("index out of bounds");
            },
            CancelToken::new(),
        );
        assert_eq!(names(&signals), vec!["started", "progress", "result", "finished"]);
        match &signals[2] {
            JobSignal::Result(JobPayload::Picking(result)) => {
                assert!(!result.success);
                assert!(
                    result
                        .error_message
                        .as_deref()
                        .is_some_and(|msg| msg.contains("index out of bounds"))
                );
            }
            other => panic!("unexpected signal {other:?}"),
        }
        assert!(matches!(outcome(&signals), JobOutcome::Fault(msg) if msg.contains("panicked")));
    }

    struct PanickingCleanup;

    impl Job for PanickingCleanup {
        fn kind(&self) -> JobKind {
            JobKind::Picking
        }

        fn run(&mut self, _ctx: &JobContext) -> Result<Option<JobPayload>, JobError> {
            Err(JobError::Fault("inference failed".to_string()))
        }

        fn fault_payload(&self, _message: &str) -> Option<JobPayload> {
            panic!("cannot build failure result");
        }
    }

    impl Drop for PanickingCleanup {
        fn drop(&mut self) {
            panic!("cannot release job");
        }
    }

    #[test]
    fn panics_after_the_work_routine_still_finish_with_a_fault() {
        let (tx, rx) = channel();
        execute(JobId(3), Box::new(PanickingCleanup), tx, CancelToken::new());
        let signals = rx.try_iter().map(|event| event.signal).collect::<Vec<_>>();
        assert_eq!(names(&signals), vec!["started", "finished"]);
        match outcome(&signals) {
            JobOutcome::Fault(msg) => assert!(msg.contains("cannot build failure result")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn pre_cancelled_job_never_runs() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let signals = run_script(
            JobKind::Picking,
            |_| panic!("work routine must not run"),
            cancel,
        );
        assert_eq!(names(&signals), vec!["started", "finished"]);
        assert_eq!(outcome(&signals), &JobOutcome::Cancelled);
    }

    #[test]
    fn dropped_slot_still_emits_finished_once() {
        let (tx, rx) = channel();
        let emitter = SignalEmitter::new(JobId(9), JobKind::ModelInit, tx);
        {
            let _slot = JobSlot::acquire(JobId(9), emitter.clone());
        }
        emitter.emit(JobSignal::Message("late".to_string()));
        let signals = rx.try_iter().map(|event| event.signal).collect::<Vec<_>>();
        assert_eq!(names(&signals), vec!["started", "finished"]);
        assert!(matches!(outcome(&signals), JobOutcome::Fault(_)));
    }
}
