/// Enabled flags for the toolbar actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionState {
    pub load_model: bool,
    pub open_trace: bool,
    pub picking: bool,
    pub cancel_picking: bool,
    pub export_picks: bool,
}

impl Default for ActionState {
    fn default() -> Self {
        Self {
            load_model: true,
            open_trace: true,
            picking: false,
            cancel_picking: false,
            export_picks: false,
        }
    }
}
