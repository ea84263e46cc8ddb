use super::style;
use super::*;
use eframe::egui::{Align2, RichText};

impl EguiApp {
    /// Show the oldest queued warning until the user acknowledges it.
    pub(super) fn render_warning(&mut self, ctx: &egui::Context) {
        let Some(warning) = self.controller.ui.warnings.front().cloned() else {
            return;
        };
        let palette = style::palette();
        let mut open = true;
        let mut acknowledged = false;
        egui::Window::new(RichText::new(&warning.title).color(palette.warning))
            .id(egui::Id::new("warning_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.set_max_width(420.0);
                ui.label(RichText::new(&warning.message).color(palette.text_primary));
                ui.add_space(8.0);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("OK").clicked() {
                        acknowledged = true;
                    }
                });
            });
        if acknowledged || !open {
            self.controller.dismiss_warning();
        }
    }
}
