use crate::egui_app::ui::style::{self, StatusTone};
use egui::Color32;

/// Startup prompt shown before anything is loaded.
pub const IDLE_STATUS: &str = "Open SGY file or load model";

/// Status badge + text shown in the footer.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusBarState {
    /// Main status message text.
    pub text: String,
    /// Badge label shown next to the status.
    pub badge_label: String,
    /// Badge color.
    pub badge_color: Color32,
    pub tone: StatusTone,
}

impl StatusBarState {
    pub fn idle() -> Self {
        Self::new(IDLE_STATUS, StatusTone::Idle)
    }

    pub fn new(text: impl Into<String>, tone: StatusTone) -> Self {
        let (badge_label, badge_color) = style::status_badge(tone);
        Self {
            text: text.into(),
            badge_label: badge_label.to_string(),
            badge_color,
            tone,
        }
    }
}
