//! Library exports for the first-break picking app and its tests.
/// Application directory resolution.
pub mod app_dirs;
/// Weights file validation against a pinned fingerprint.
pub mod artifact;
/// Persisted TOML settings.
pub mod config;
/// egui front end.
pub mod egui_app;
/// Background job scheduling and the signal protocol.
pub mod jobs;
/// Tracing subscriber setup.
pub mod logging;
/// Inference engine seam and the shared model slot.
pub mod model;
/// Picking runs, the reference engine, and pick export.
pub mod picking;
/// Gate deciding when picking may start.
pub mod readiness;
/// Seismic trace loading.
pub mod traces;
