mod support;

use support::fbpick_env::FbpickEnvGuard;
use support::segy::{onset_trace, write_test_segy};

use fbpick::artifact::{FingerprintAlgorithm, fingerprint_file};
use fbpick::config::{self, AppConfig};
use fbpick::egui_app::controller::{MODEL_ERROR_MESSAGE, MODEL_ERROR_TITLE, PickingController};
use fbpick::picking::export::PicksExport;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const ONSETS: [usize; 4] = [40, 55, 30, 62];

struct FlowHarness {
    env: FbpickEnvGuard,
    temp: TempDir,
    weights: PathBuf,
    line: PathBuf,
}

impl FlowHarness {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        let config_home = temp.path().join("config");
        std::fs::create_dir_all(&config_home).expect("create config dir");
        let env = FbpickEnvGuard::set_config_home(config_home);

        let weights = temp.path().join("energy.json");
        std::fs::write(&weights, r#"{"sta_ms": 5, "lta_ms": 20, "threshold": 3}"#)
            .expect("write weights");
        let line = temp.path().join("line.sgy");
        let traces: Vec<Vec<f32>> = ONSETS.iter().map(|&onset| onset_trace(100, onset)).collect();
        write_test_segy(&line, &traces, 1000);

        Self {
            env,
            temp,
            weights,
            line,
        }
    }

    fn pinned_config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.model.weights_fingerprint =
            fingerprint_file(&self.weights, FingerprintAlgorithm::Sha256).expect("fingerprint");
        config
    }

    fn controller(&self, config: AppConfig) -> PickingController {
        config::save(&config).expect("save config");
        PickingController::new(config::load_or_default().expect("load config"))
    }
}

fn wait_for_jobs(controller: &mut PickingController) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while controller.has_jobs_in_flight() {
        assert!(Instant::now() < deadline, "jobs did not finish in time");
        controller.poll_jobs_blocking(Duration::from_millis(20));
    }
}

#[test]
fn model_then_trace_then_picking_finds_onsets() {
    let harness = FlowHarness::new();
    let mut controller = harness.controller(harness.pinned_config());

    controller.load_model_from_path(&harness.weights);
    wait_for_jobs(&mut controller);
    assert!(controller.gate().model_loaded());
    assert!(!controller.ui.actions.picking);

    controller.open_trace_from_path(&harness.line);
    assert!(controller.ui.actions.picking);
    assert_eq!(controller.ui.status.text, "Click on picking to start processing");

    controller.start_picking();
    wait_for_jobs(&mut controller);

    let picks = controller.picks().expect("picks");
    assert_eq!(picks.samples, ONSETS.to_vec());
    assert_eq!(picks.dt_ms, 1.0);
    assert!(controller.ui.actions.export_picks);
    assert!(controller.ui.warnings.is_empty());

    let dest = harness.temp.path().join("line_picks.json");
    assert!(controller.export_picks_to(&dest));
    let exported: PicksExport =
        serde_json::from_slice(&std::fs::read(&dest).expect("read export")).expect("parse");
    assert_eq!(exported.picks.len(), ONSETS.len());
    assert_eq!(exported.picks[3].time_ms, 62.0);
}

#[test]
fn settings_remember_last_selections() {
    let harness = FlowHarness::new();
    let mut controller = harness.controller(harness.pinned_config());
    controller.load_model_from_path(&harness.weights);
    wait_for_jobs(&mut controller);
    controller.open_trace_from_path(&harness.line);

    let saved = config::load_or_default().expect("reload config");
    assert_eq!(saved.model.last_weights_path.as_ref(), Some(&harness.weights));
    assert_eq!(saved.last_trace_dir.as_deref(), Some(harness.temp.path()));
    assert_eq!(saved.model.weights_fingerprint, harness.pinned_config().model.weights_fingerprint);
}

#[test]
fn wrong_fingerprint_never_starts_a_job() {
    let harness = FlowHarness::new();
    let mut config = AppConfig::default();
    config.model.weights_fingerprint = "00".repeat(32);
    let mut controller = harness.controller(config);

    controller.load_model_from_path(&harness.weights);

    assert!(!controller.has_jobs_in_flight());
    assert!(controller.ui.actions.load_model);
    let warning = controller.dismiss_warning().expect("warning");
    assert_eq!(warning.title, MODEL_ERROR_TITLE);
    assert_eq!(warning.message, MODEL_ERROR_MESSAGE);
}

#[test]
fn env_fingerprint_overrides_config() {
    let harness = FlowHarness::new();
    let pinned = harness.pinned_config().model.weights_fingerprint;
    harness.env.set_weights_fingerprint(&pinned.to_uppercase());
    let mut config = AppConfig::default();
    config.model.weights_fingerprint = "ff".repeat(32);
    let mut controller = harness.controller(config);

    controller.load_model_from_path(&harness.weights);
    wait_for_jobs(&mut controller);
    assert!(controller.model().is_loaded());
}

#[test]
fn pinned_but_unusable_weights_fault_and_reenable_loading() {
    let harness = FlowHarness::new();
    std::fs::write(&harness.weights, r#"{"sta_ms": 50, "lta_ms": 20}"#).expect("rewrite");
    let mut controller = harness.controller(harness.pinned_config());

    controller.load_model_from_path(&harness.weights);
    assert!(!controller.ui.actions.load_model);
    wait_for_jobs(&mut controller);

    assert!(!controller.gate().model_loaded());
    assert!(!controller.model().is_loaded());
    assert!(controller.ui.actions.load_model);
    let warning = controller.dismiss_warning().expect("warning");
    assert_eq!(warning.title, MODEL_ERROR_TITLE);
    assert!(warning.message.contains("lta_ms"));
}

#[test]
fn corrupt_segy_is_reported_and_open_stays_enabled() {
    let harness = FlowHarness::new();
    let broken = harness.temp.path().join("broken.sgy");
    std::fs::write(&broken, vec![0u8; 1024]).expect("write broken");
    let mut controller = harness.controller(harness.pinned_config());

    controller.open_trace_from_path(&broken);

    assert!(!controller.gate().artifact_selected());
    assert!(controller.ui.actions.open_trace);
    let warning = controller.dismiss_warning().expect("warning");
    assert_eq!(warning.title, "TruncatedFileError");
}

#[test]
fn trace_first_then_model_unlocks_picking() {
    let harness = FlowHarness::new();
    let mut controller = harness.controller(harness.pinned_config());

    controller.open_trace_from_path(&harness.line);
    assert_eq!(controller.ui.status.text, "Load model to start picking");
    controller.start_picking();
    assert!(!controller.has_jobs_in_flight());

    controller.load_model_from_path(&harness.weights);
    wait_for_jobs(&mut controller);
    assert!(controller.ui.actions.picking);
}
