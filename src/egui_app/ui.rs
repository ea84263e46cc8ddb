//! egui renderer for the application UI.

mod chrome;
pub mod style;
mod trace_plot;
mod warning;

use std::time::Duration;

use crate::config::AppConfig;
use crate::egui_app::controller::PickingController;
use eframe::egui;

/// Smallest window the layout supports.
pub const MIN_VIEWPORT_SIZE: egui::Vec2 = egui::vec2(700.0, 500.0);

const JOB_REPAINT_INTERVAL: Duration = Duration::from_millis(50);

/// Renders the egui UI using the shared controller state.
pub struct EguiApp {
    controller: PickingController,
    visuals_set: bool,
}

impl EguiApp {
    /// Create the app with the bundled engine and trace reader.
    pub fn new(config: AppConfig) -> Self {
        Self::with_controller(PickingController::new(config))
    }

    pub fn with_controller(controller: PickingController) -> Self {
        Self {
            controller,
            visuals_set: false,
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        let mut visuals = egui::Visuals::dark();
        style::apply_visuals(&mut visuals);
        ctx.set_visuals(visuals);
        self.visuals_set = true;
    }
}

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_visuals(ctx);
        self.controller.poll_jobs();
        self.render_toolbar(ctx);
        self.render_status(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            trace_plot::render_traces(ui, &self.controller);
        });
        self.render_warning(ctx);
        if self.controller.has_jobs_in_flight() {
            ctx.request_repaint_after(JOB_REPAINT_INTERVAL);
        }
    }
}
