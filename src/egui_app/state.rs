//! Shared state types for the egui UI.

mod actions;
mod progress;
mod status;

pub use actions::*;
pub use progress::*;
pub use status::*;

use std::collections::VecDeque;

/// Top-level UI model consumed by the egui renderer.
#[derive(Clone, Debug)]
pub struct UiState {
    pub status: StatusBarState,
    /// Progress bar shown in the status bar while picking.
    pub progress: ProgressState,
    /// Which toolbar actions are currently enabled.
    pub actions: ActionState,
    /// Warning dialogs waiting to be acknowledged, oldest first.
    pub warnings: VecDeque<WarningDialog>,
    pub trace_view: TraceViewState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: StatusBarState::idle(),
            progress: ProgressState::default(),
            actions: ActionState::default(),
            warnings: VecDeque::new(),
            trace_view: TraceViewState::default(),
        }
    }
}

/// Modal warning shown as a (title, message) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarningDialog {
    pub title: String,
    pub message: String,
}

/// Display options for the trace plot.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceViewState {
    /// Amplitude multiplier applied after per-trace normalization.
    pub gain: f32,
    /// Shade the negative lobe of each wiggle.
    pub fill_negative: bool,
    pub show_picks: bool,
}

impl Default for TraceViewState {
    fn default() -> Self {
        Self {
            gain: 1.0,
            fill_negative: true,
            show_picks: true,
        }
    }
}
