/// Inline progress indicator for the running picking job.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressState {
    pub visible: bool,
    /// Percent complete, 0..=100.
    pub value: u8,
    /// Latest message from the job, if any.
    pub detail: Option<String>,
}

impl ProgressState {
    pub fn show(&mut self) {
        self.visible = true;
        self.value = 0;
        self.detail = None;
    }

    pub fn hide(&mut self) {
        *self = Self::default();
    }

    pub fn fraction(&self) -> f32 {
        f32::from(self.value.min(100)) / 100.0
    }
}
