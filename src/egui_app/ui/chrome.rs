use super::style;
use super::*;
use eframe::egui::{Button, Frame, Margin, ProgressBar, RichText, StrokeKind};

impl EguiApp {
    pub(super) fn render_toolbar(&mut self, ctx: &egui::Context) {
        let palette = style::palette();
        let actions = self.controller.ui.actions;
        egui::TopBottomPanel::top("toolbar")
            .frame(
                Frame::new()
                    .fill(palette.bg_primary)
                    .stroke(style::section_stroke())
                    .inner_margin(Margin::symmetric(8, 6)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(actions.load_model, Button::new("Load model"))
                        .clicked()
                    {
                        self.controller.load_model_via_dialog();
                    }
                    if ui
                        .add_enabled(actions.open_trace, Button::new("Open SGY-file"))
                        .clicked()
                    {
                        self.controller.open_trace_via_dialog();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(actions.picking, Button::new("Neural network FB picking"))
                        .clicked()
                    {
                        self.controller.start_picking();
                    }
                    if ui
                        .add_enabled(actions.cancel_picking, Button::new("Cancel"))
                        .clicked()
                    {
                        self.controller.cancel_picking();
                    }
                    if ui
                        .add_enabled(actions.export_picks, Button::new("Export picks to file"))
                        .clicked()
                    {
                        self.controller.export_picks_via_dialog();
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .button("Project page")
                            .on_hover_text("Open the project repository")
                            .clicked()
                        {
                            self.controller.open_project_page();
                        }
                        ui.checkbox(
                            &mut self.controller.ui.trace_view.show_picks,
                            "Show picks",
                        );
                        ui.checkbox(
                            &mut self.controller.ui.trace_view.fill_negative,
                            "Fill negative",
                        );
                        ui.add(
                            egui::Slider::new(&mut self.controller.ui.trace_view.gain, 0.25..=8.0)
                                .logarithmic(true)
                                .text("Gain"),
                        );
                    });
                });
            });
    }

    pub(super) fn render_status(&mut self, ctx: &egui::Context) {
        let palette = style::palette();
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                Frame::new()
                    .fill(palette.bg_primary)
                    .stroke(style::section_stroke())
                    .inner_margin(Margin::symmetric(8, 4)),
            )
            .show(ctx, |ui| {
                let status = &self.controller.ui.status;
                let progress = &self.controller.ui.progress;
                ui.horizontal(|ui| {
                    let (badge_rect, _) =
                        ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
                    ui.painter().rect_filled(badge_rect, 0.0, status.badge_color);
                    ui.painter().rect_stroke(
                        badge_rect,
                        0.0,
                        style::section_stroke(),
                        StrokeKind::Inside,
                    );
                    ui.add_space(8.0);
                    ui.label(RichText::new(&status.badge_label).color(palette.text_primary));
                    ui.separator();
                    if progress.visible {
                        ui.add(
                            ProgressBar::new(progress.fraction())
                                .desired_width(160.0)
                                .show_percentage(),
                        );
                    }
                    ui.label(RichText::new(&status.text).color(palette.text_primary));
                });
            });
    }
}
