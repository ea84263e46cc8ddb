use super::*;
use crate::jobs::{Job, JobEvent, JobOutcome, JobPayload, JobSignal};
use crate::model::ModelHandle;
use crate::picking::{PickingJob, PickingResult, PickingTask};
use tracing::{debug, info};

/// Warning title for a picking run that produced no picks.
pub(super) const PICKING_ERROR_TITLE: &str = "InternalError";

impl PickingController {
    /// Submit a picking run over the open trace set with the loaded model.
    pub fn start_picking(&mut self) {
        if self.is_job_in_flight(JobKind::Picking) {
            self.set_status("Picking is already running", StatusTone::Warning);
            return;
        }
        let Some(traces) = self.traces.clone() else {
            self.set_status("Open SGY file to start picking", StatusTone::Warning);
            return;
        };
        if !self.gate.is_ready() || !self.model.is_loaded() {
            self.set_status("Load model to start picking", StatusTone::Warning);
            return;
        }
        let task = PickingTask {
            traces,
            traces_per_gather: self.config.picking.traces_per_gather,
        };
        let job = PickingJob::new(task, self.model.clone());
        if self.submit(Box::new(job)).is_none() {
            return;
        }
        self.ui.actions.picking = false;
        self.ui.actions.open_trace = false;
        self.ui.actions.cancel_picking = true;
        self.picking_started = Some(Instant::now());
        self.set_status("Picking...", StatusTone::Busy);
    }

    /// Ask the running picking job to stop after its current gather.
    pub fn cancel_picking(&mut self) {
        let Some(ticket) = self.in_flight.get(&JobKind::Picking) else {
            return;
        };
        ticket.cancel();
        self.ui.actions.cancel_picking = false;
        self.set_status("Cancelling picking...", StatusTone::Busy);
    }

    /// Drain pending job signals and apply them. Call once per frame.
    pub fn poll_jobs(&mut self) {
        while let Some(event) = self.scheduler.try_recv() {
            self.handle_job_event(event);
        }
    }

    /// Block up to `timeout` for one job signal and apply it.
    pub fn poll_jobs_blocking(&mut self, timeout: std::time::Duration) -> bool {
        match self.scheduler.recv_timeout(timeout) {
            Some(event) => {
                self.handle_job_event(event);
                self.poll_jobs();
                true
            }
            None => false,
        }
    }

    pub(super) fn submit(&mut self, job: Box<dyn Job>) -> Option<JobTicket> {
        let kind = job.kind();
        match self.scheduler.submit(job) {
            Ok(ticket) => {
                self.in_flight.insert(kind, ticket.clone());
                Some(ticket)
            }
            Err(err) => {
                warn!("Failed to start {kind} job: {err}");
                self.push_warning("SchedulerError", err.to_string());
                None
            }
        }
    }

    fn handle_job_event(&mut self, event: JobEvent) {
        let current = self
            .in_flight
            .get(&event.kind)
            .is_some_and(|ticket| ticket.id == event.job_id);
        if !current {
            debug!("Ignoring signal from stale {} job {}", event.kind, event.job_id);
            return;
        }
        match (event.kind, event.signal) {
            (_, JobSignal::Started) => self.on_job_started(event.kind),
            (JobKind::Picking, JobSignal::Progress(value)) => {
                self.ui.progress.value = value.min(100);
            }
            (JobKind::Picking, JobSignal::Message(text)) => {
                self.ui.progress.detail = Some(text.clone());
                self.set_status(text, StatusTone::Busy);
            }
            (JobKind::ModelInit, JobSignal::Progress(_) | JobSignal::Message(_)) => {}
            (JobKind::ModelInit, JobSignal::Result(JobPayload::Model(model))) => {
                self.on_model_ready(model);
            }
            (JobKind::Picking, JobSignal::Result(JobPayload::Picking(result))) => {
                self.on_picking_result(result);
            }
            (kind, JobSignal::Result(payload)) => {
                warn!("Unexpected {kind} job result: {payload:?}");
            }
            (JobKind::ModelInit, JobSignal::Finished(outcome)) => {
                self.in_flight.remove(&JobKind::ModelInit);
                self.on_model_init_finished(outcome);
            }
            (JobKind::Picking, JobSignal::Finished(outcome)) => {
                self.in_flight.remove(&JobKind::Picking);
                self.on_picking_finished(outcome);
            }
        }
    }

    fn on_job_started(&mut self, kind: JobKind) {
        debug!("{kind} job started");
        if kind == JobKind::Picking {
            self.ui.progress.show();
        }
    }

    fn on_model_ready(&mut self, model: ModelHandle) {
        info!("Model {} ready", model.name());
        self.model.set(model);
    }

    fn on_model_init_finished(&mut self, outcome: JobOutcome) {
        self.ui.actions.load_model = true;
        match outcome {
            JobOutcome::Succeeded if self.model.is_loaded() => {
                self.gate.mark_model_loaded();
                let mut status = String::from("Model loaded successfully");
                if !self.gate.artifact_selected() {
                    status.push_str(". Open SGY file to start picking");
                }
                self.set_status(status, StatusTone::Info);
                self.unlock_picking_if_ready();
            }
            JobOutcome::Succeeded => {
                warn!("Model init finished without producing a model");
                self.push_warning(MODEL_ERROR_TITLE, MODEL_ERROR_MESSAGE);
            }
            JobOutcome::Fault(message) | JobOutcome::DomainFailure(message) => {
                warn!("Model init failed: {message}");
                self.push_warning(MODEL_ERROR_TITLE, message);
                self.set_status("Failed to load model", StatusTone::Error);
            }
            JobOutcome::Cancelled => {
                self.set_status("Model loading cancelled", StatusTone::Info);
            }
        }
    }

    fn on_picking_result(&mut self, result: PickingResult) {
        log_timing(&result);
        if result.success {
            let count = result.picks.as_ref().map_or(0, |picks| picks.len());
            self.picks = result.picks;
            self.ui.actions.export_picks = self.picks.is_some();
            self.set_status(
                format!("Picked {count} traces in {:.1?}", result.elapsed),
                StatusTone::Info,
            );
        } else {
            let message = result
                .error_message
                .unwrap_or_else(|| "Picking failed".to_string());
            self.push_warning(PICKING_ERROR_TITLE, message);
            self.set_status("Picking failed", StatusTone::Error);
        }
        self.ui.actions.open_trace = true;
        self.ui.actions.picking = true;
    }

    fn on_picking_finished(&mut self, outcome: JobOutcome) {
        self.ui.progress.hide();
        self.ui.actions.open_trace = true;
        self.ui.actions.picking = self.traces.is_some() && self.model.is_loaded();
        self.ui.actions.cancel_picking = false;
        if let Some(started) = self.picking_started.take() {
            debug!("Picking job finished after {:.2?}", started.elapsed());
        }
        match outcome {
            JobOutcome::Succeeded | JobOutcome::DomainFailure(_) => {}
            JobOutcome::Fault(message) => warn!("Picking job faulted: {message}"),
            JobOutcome::Cancelled => {
                info!("Picking cancelled");
                self.set_status("Picking cancelled", StatusTone::Info);
            }
        }
    }
}

fn log_timing(result: &PickingResult) {
    match result.time_per_batch() {
        Some(per_batch) => info!(
            "Picking took {:.3?} ({:.3?} per batch, {} batches)",
            result.elapsed, per_batch, result.num_batches
        ),
        None => info!("Picking took {:.3?} (no batches)", result.elapsed),
    }
}
