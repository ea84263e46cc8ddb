//! Wiggle display of the open trace set with the pick overlay.

use super::style;
use crate::egui_app::controller::PickingController;
use crate::egui_app::state::TraceViewState;
use crate::picking::Picks;
use crate::traces::TraceSet;
use eframe::egui::{self, Align2, Color32, FontId, Mesh, Pos2, Rect, Sense, Shape, Stroke};
use ndarray::ArrayView1;

const PLOT_MARGIN: f32 = 36.0;
/// Traces narrower than this many pixels are skipped when drawing.
const MIN_TRACE_SPACING: f32 = 2.0;

pub(super) fn render_traces(ui: &mut egui::Ui, controller: &PickingController) {
    let palette = style::palette();
    let Some(traces) = controller.traces() else {
        ui.centered_and_justified(|ui| {
            ui.label(egui::RichText::new("No SGY file open").color(palette.text_muted));
        });
        return;
    };
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let plot = response.rect.shrink(PLOT_MARGIN);
    if plot.width() <= 0.0 || plot.height() <= 0.0 || traces.num_traces() == 0 {
        return;
    }
    let view = &controller.ui.trace_view;
    let layout = TraceLayout::new(plot, traces.num_traces(), traces.num_samples());

    painter.rect_stroke(plot, 0.0, style::section_stroke(), egui::StrokeKind::Outside);
    painter.text(
        plot.left_top() - egui::vec2(0.0, 6.0),
        Align2::LEFT_BOTTOM,
        format!(
            "{} traces, {} samples, dt {} ms",
            traces.num_traces(),
            traces.num_samples(),
            traces.dt_ms
        ),
        FontId::proportional(12.0),
        palette.text_muted,
    );
    painter.text(
        plot.left_bottom() + egui::vec2(-4.0, 0.0),
        Align2::RIGHT_BOTTOM,
        format!("{:.0} ms", layout.max_time_ms(traces.dt_ms)),
        FontId::monospace(11.0),
        palette.text_muted,
    );

    painter.extend(trace_shapes(&layout, traces, view));

    if view.show_picks {
        if let Some(picks) = controller.picks() {
            draw_picks(&painter, &layout, traces, picks);
        }
    }
}

/// Wiggle lines for the visible traces, preceded by one mesh holding every
/// shaded negative lobe.
fn trace_shapes(layout: &TraceLayout, traces: &TraceSet, view: &TraceViewState) -> Vec<Shape> {
    let palette = style::palette();
    let ink = Stroke::new(1.0, palette.trace_ink);
    let mut fill = Mesh::default();
    let mut lines = Vec::new();
    for index in layout.visible_traces() {
        let points = layout.wiggle(index, traces.data.column(index), view.gain);
        if view.fill_negative {
            layout.fill_negative_lobe(index, &points, &mut fill, palette.grid_soft);
        }
        lines.push(Shape::line(points, ink));
    }
    let mut shapes = Vec::with_capacity(lines.len() + 1);
    if !fill.is_empty() {
        shapes.push(Shape::mesh(fill));
    }
    shapes.extend(lines);
    shapes
}

fn draw_picks(painter: &egui::Painter, layout: &TraceLayout, traces: &TraceSet, picks: &Picks) {
    let marker = style::palette().pick_marker;
    let points: Vec<Pos2> = picks
        .samples
        .iter()
        .enumerate()
        .take(traces.num_traces())
        .map(|(index, &sample)| Pos2::new(layout.center_x(index), layout.sample_y(sample)))
        .collect();
    for point in &points {
        painter.circle_filled(*point, 2.5, marker);
    }
    painter.add(Shape::line(points, Stroke::new(1.5, marker)));
}

/// Maps trace and sample indices into the plot rectangle.
#[derive(Clone, Copy, Debug)]
struct TraceLayout {
    plot: Rect,
    num_traces: usize,
    num_samples: usize,
}

impl TraceLayout {
    fn new(plot: Rect, num_traces: usize, num_samples: usize) -> Self {
        Self {
            plot,
            num_traces,
            num_samples,
        }
    }

    fn spacing(&self) -> f32 {
        self.plot.width() / self.num_traces.max(1) as f32
    }

    fn center_x(&self, index: usize) -> f32 {
        self.plot.left() + (index as f32 + 0.5) * self.spacing()
    }

    fn sample_y(&self, sample: usize) -> f32 {
        let last = self.num_samples.saturating_sub(1).max(1) as f32;
        self.plot.top() + (sample as f32 / last).min(1.0) * self.plot.height()
    }

    fn max_time_ms(&self, dt_ms: f32) -> f32 {
        self.num_samples.saturating_sub(1) as f32 * dt_ms
    }

    /// Indices worth drawing at the current width.
    fn visible_traces(&self) -> impl Iterator<Item = usize> {
        let stride = (MIN_TRACE_SPACING / self.spacing()).ceil().max(1.0) as usize;
        (0..self.num_traces).step_by(stride)
    }

    /// Polyline for one trace, normalized to its peak and scaled by `gain`.
    ///
    /// Traces longer than twice the plot height keep only the min and max
    /// sample of each pixel row.
    fn wiggle(&self, index: usize, trace: ArrayView1<'_, f32>, gain: f32) -> Vec<Pos2> {
        let peak = trace
            .iter()
            .fold(0.0f32, |acc, value| acc.max(finite(*value).abs()));
        let scale = if peak > 0.0 {
            gain * 0.5 * self.spacing() / peak
        } else {
            0.0
        };
        let center = self.center_x(index);
        let half = self.spacing() * 0.5;
        let point = |sample: usize| {
            let dx = (finite(trace[sample]) * scale).clamp(-half * gain, half * gain);
            Pos2::new(center + dx, self.sample_y(sample))
        };

        let len = trace.len();
        let rows = self.plot.height().ceil().max(1.0) as usize;
        if len <= rows * 2 {
            return (0..len).map(point).collect();
        }
        let mut points = Vec::with_capacity(rows * 2);
        for row in 0..rows {
            let start = row * len / rows;
            let end = (row + 1) * len / rows;
            let (mut low, mut high) = (start, start);
            for sample in start..end {
                let value = finite(trace[sample]);
                if value < finite(trace[low]) {
                    low = sample;
                }
                if value > finite(trace[high]) {
                    high = sample;
                }
            }
            let (first, second) = (low.min(high), low.max(high));
            points.push(point(first));
            if second != first {
                points.push(point(second));
            }
        }
        points
    }

    /// Append triangles shading the part of `points` left of the trace axis.
    fn fill_negative_lobe(&self, index: usize, points: &[Pos2], mesh: &mut Mesh, color: Color32) {
        let center = self.center_x(index);
        let base = mesh.vertices.len() as u32;
        for point in points {
            mesh.colored_vertex(Pos2::new(center, point.y), color);
            mesh.colored_vertex(Pos2::new(point.x.min(center), point.y), color);
        }
        for (step, pair) in points.windows(2).enumerate() {
            if pair[0].x >= center && pair[1].x >= center {
                continue;
            }
            let a = base + step as u32 * 2;
            mesh.add_triangle(a, a + 1, a + 3);
            mesh.add_triangle(a, a + 3, a + 2);
        }
    }
}

fn finite(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}
