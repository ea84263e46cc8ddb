//! Coordinates artifact checks, the readiness gate, and background jobs, and
//! mirrors the result into [`UiState`] for the renderer.

mod export;
mod jobs;
mod model_loading;
mod trace_files;


use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::config::{self, AppConfig};
use crate::egui_app::state::{StatusBarState, UiState, WarningDialog};
use crate::egui_app::ui::style::StatusTone;
use crate::jobs::{JobKind, JobScheduler, JobTicket};
use crate::model::{ModelLoader, SharedModelHandle};
use crate::picking::{EnergyRatioLoader, Picks};
use crate::readiness::ReadinessGate;
use crate::traces::{SegyReader, TraceReader, TraceSet};

pub use model_loading::{MODEL_ERROR_MESSAGE, MODEL_ERROR_TITLE};

/// Link opened by the toolbar's project button.
pub const PROJECT_URL: &str = "https://github.com/DaloroAT/first_breaks_picking";

/// Maintains app state and bridges the picking pipeline to the egui UI.
pub struct PickingController {
    pub ui: UiState,
    config: AppConfig,
    config_path: Option<PathBuf>,
    gate: ReadinessGate,
    scheduler: JobScheduler,
    model: SharedModelHandle,
    loader: Arc<dyn ModelLoader>,
    reader: Arc<dyn TraceReader>,
    traces: Option<Arc<TraceSet>>,
    picks: Option<Picks>,
    in_flight: HashMap<JobKind, JobTicket>,
    picking_started: Option<Instant>,
}

impl PickingController {
    /// Controller with the bundled SEG-Y reader and reference engine,
    /// persisting settings to the default config file.
    pub fn new(config: AppConfig) -> Self {
        let mut controller = Self::with_collaborators(
            config,
            Arc::new(EnergyRatioLoader),
            Arc::new(SegyReader),
        );
        controller.config_path = config::config_path().ok();
        controller
    }

    /// Controller with explicit engine and reader. Settings are not persisted.
    pub fn with_collaborators(
        config: AppConfig,
        loader: Arc<dyn ModelLoader>,
        reader: Arc<dyn TraceReader>,
    ) -> Self {
        Self {
            ui: UiState::default(),
            gate: ReadinessGate::new(config.picking.readiness_rule),
            scheduler: JobScheduler::new(config.jobs.max_workers),
            config,
            config_path: None,
            model: SharedModelHandle::new(),
            loader,
            reader,
            traces: None,
            picks: None,
            in_flight: HashMap::new(),
            picking_started: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    pub fn model(&self) -> &SharedModelHandle {
        &self.model
    }

    pub fn traces(&self) -> Option<&Arc<TraceSet>> {
        self.traces.as_ref()
    }

    pub fn picks(&self) -> Option<&Picks> {
        self.picks.as_ref()
    }

    pub fn is_job_in_flight(&self, kind: JobKind) -> bool {
        self.in_flight.contains_key(&kind)
    }

    pub fn has_jobs_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Enable picking when both prerequisites hold. Returns whether it did.
    pub fn unlock_picking_if_ready(&mut self) -> bool {
        let ready = self.gate.is_ready()
            && self.model.is_loaded()
            && self.traces.is_some()
            && !self.is_job_in_flight(JobKind::Picking);
        if ready {
            self.ui.actions.picking = true;
            self.set_status("Click on picking to start processing", StatusTone::Info);
        }
        ready
    }

    /// Pop the oldest unacknowledged warning.
    pub fn dismiss_warning(&mut self) -> Option<WarningDialog> {
        self.ui.warnings.pop_front()
    }

    fn set_status(&mut self, text: impl Into<String>, tone: StatusTone) {
        self.ui.status = StatusBarState::new(text, tone);
    }

    fn push_warning(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.ui.warnings.push_back(WarningDialog {
            title: title.into(),
            message: message.into(),
        });
    }

    fn persist_config(&mut self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };
        if let Err(err) = config::save_to_path(&self.config, &path) {
            warn!("Failed to save settings: {err}");
            self.set_status(format!("Failed to save settings: {err}"), StatusTone::Warning);
        }
    }
}
