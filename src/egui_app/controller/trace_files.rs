use super::*;
use rfd::FileDialog;
use std::path::Path;
use tracing::info;

impl PickingController {
    /// Prompt for a SEG-Y file and open it. A cancelled dialog is a no-op.
    pub fn open_trace_via_dialog(&mut self) {
        let mut dialog = FileDialog::new()
            .set_title("Open SGY-file")
            .add_filter("SGY-file", &["sgy", "segy"]);
        if let Some(dir) = self.config.last_trace_dir.as_deref() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        self.open_trace_from_path(&path);
    }

    /// Read `path` and make it the active trace set.
    ///
    /// A read failure keeps the previous trace set and leaves the gate alone.
    pub fn open_trace_from_path(&mut self, path: &Path) {
        if self.is_job_in_flight(JobKind::Picking) {
            self.set_status("Wait for picking to finish", StatusTone::Warning);
            return;
        }
        let traces = match self.reader.read(path) {
            Ok(traces) => traces,
            Err(err) => {
                warn!("Failed to open {}: {err}", path.display());
                self.push_warning(err.category(), err.to_string());
                self.ui.actions.open_trace = true;
                return;
            }
        };
        info!(
            "Opened {} ({} traces x {} samples, dt {} ms)",
            path.display(),
            traces.num_traces(),
            traces.num_samples(),
            traces.dt_ms
        );
        self.traces = Some(Arc::new(traces));
        self.picks = None;
        self.ui.actions.open_trace = true;
        self.ui.actions.export_picks = false;
        self.gate.mark_artifact_selected();

        if self.gate.model_loaded() {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            self.set_status(format!("Opened {name}"), StatusTone::Info);
        } else {
            self.set_status("Load model to start picking", StatusTone::Info);
        }
        self.unlock_picking_if_ready();

        if let Some(dir) = path.parent() {
            self.config.last_trace_dir = Some(dir.to_path_buf());
            self.persist_config();
        }
    }
}
