use super::*;
use crate::picking::export::write_picks_json;
use rfd::FileDialog;
use std::path::Path;
use tracing::info;

impl PickingController {
    /// Prompt for a destination and write the current picks as JSON.
    pub fn export_picks_via_dialog(&mut self) {
        let Some(traces) = self.traces.as_ref() else {
            return;
        };
        let stem = traces
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "picks".to_string());
        let mut dialog = FileDialog::new()
            .set_title("Export picks to file")
            .add_filter("JSON", &["json"])
            .set_file_name(format!("{stem}_picks.json"));
        if let Some(dir) = traces.path.parent() {
            dialog = dialog.set_directory(dir);
        }
        let Some(dest) = dialog.save_file() else {
            return;
        };
        self.export_picks_to(&dest);
    }

    /// Write the current picks to `dest`. Returns whether a file was written.
    pub fn export_picks_to(&mut self, dest: &Path) -> bool {
        let (Some(traces), Some(picks)) = (self.traces.as_ref(), self.picks.as_ref()) else {
            self.set_status("No picks to export", StatusTone::Warning);
            return false;
        };
        match write_picks_json(dest, &traces.path, picks) {
            Ok(()) => {
                info!("Exported {} picks to {}", picks.len(), dest.display());
                self.set_status(format!("Picks saved to {}", dest.display()), StatusTone::Info);
                true
            }
            Err(err) => {
                warn!("Export failed: {err}");
                self.push_warning("ExportError", err.to_string());
                false
            }
        }
    }

    pub fn open_project_page(&mut self) {
        if let Err(err) = open::that(PROJECT_URL) {
            warn!("Failed to open {PROJECT_URL}: {err}");
            self.set_status(format!("Could not open browser: {err}"), StatusTone::Warning);
        }
    }
}
