use super::*;
use crate::artifact::{self, ArtifactState};
use crate::picking::ModelInitJob;
use rfd::FileDialog;
use std::path::Path;
use tracing::info;

/// Warning title for weights that fail validation or initialization.
pub const MODEL_ERROR_TITLE: &str = "Model loading error";
/// Warning shown when the selected file is not the pinned weights file.
pub const MODEL_ERROR_MESSAGE: &str = "The file cannot be used as model weights. Download the file according to the manual and select it.";

impl PickingController {
    /// Prompt for a weights file and load it. A cancelled dialog is a no-op.
    pub fn load_model_via_dialog(&mut self) {
        let mut dialog = FileDialog::new().set_title("Select file with NN weights");
        if let Some(dir) = self
            .config
            .model
            .last_weights_path
            .as_deref()
            .and_then(Path::parent)
        {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        self.load_model_from_path(&path);
    }

    /// Validate `path` against the pinned fingerprint and start model
    /// initialization if it matches.
    pub fn load_model_from_path(&mut self, path: &Path) {
        if self.is_job_in_flight(JobKind::ModelInit) {
            self.set_status("Model is already loading", StatusTone::Warning);
            return;
        }
        let Some(expected) = self.config.expected_weights_fingerprint() else {
            warn!("No weights fingerprint configured; refusing {}", path.display());
            self.push_warning(
                MODEL_ERROR_TITLE,
                format!(
                    "No weights fingerprint is configured. Set [model].weights_fingerprint in the settings file or {}.",
                    config::WEIGHTS_FINGERPRINT_ENV
                ),
            );
            return;
        };
        match artifact::classify(path, &expected, self.config.model.fingerprint_algorithm) {
            Ok(ArtifactState::Valid) => {}
            Ok(state) => {
                info!("Rejected weights {}: {state:?}", path.display());
                self.push_warning(MODEL_ERROR_TITLE, MODEL_ERROR_MESSAGE);
                return;
            }
            Err(err) => {
                warn!("Weights check failed: {err}");
                self.push_warning(MODEL_ERROR_TITLE, err.to_string());
                return;
            }
        }

        let job = ModelInitJob::new(path.to_path_buf(), self.loader.clone());
        if self.submit(Box::new(job)).is_none() {
            return;
        }
        self.ui.actions.load_model = false;
        self.set_status("Loading model...", StatusTone::Busy);
        self.config.model.last_weights_path = Some(path.to_path_buf());
        self.persist_config();
    }
}
