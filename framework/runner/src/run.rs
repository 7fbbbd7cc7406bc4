use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use vcmi_autotest_core::prelude::InterruptHandle;
use vcmi_autotest_report_model::{
    append_run_summary, RunSummary, ScenarioResult, XmlReportWriter,
};

use crate::artifacts::ZipArtifactCollector;
use crate::catalog::discover_scenarios;
use crate::cli::DriverCli;
use crate::client::EngineClientLauncher;
use crate::config::{DriverConfig, RUN_SUMMARY_FILE_NAME};
use crate::executor::Executor;
use crate::interrupt::start_interrupt_listener;
use crate::outcome::{FileLogSource, OutcomeDetector};
use crate::process::SysinfoProcessControl;
use crate::progress::BatchProgress;
use crate::scenario::ScenarioRunner;
use crate::supervisor::ProcessSupervisor;
use crate::types::DriverResult;

/// Run every scenario found under the configured maps directory and write the report.
///
/// Only setup problems are returned as errors. A scenario that fails in any way is recorded as a
/// failed entry and the batch carries on.
pub fn run(cli: DriverCli) -> DriverResult<RunSummary> {
    let config = DriverConfig::from(cli);

    log::info!("VCMI autotest driver {}", env!("CARGO_PKG_VERSION"));
    log::info!("VCMI root: {}", config.vcmi_root_dir.display());
    log::info!("Saves dir: {}", config.saves_dir.display());

    prepare_result_directory(&config)?;

    let maps_dir = config.maps_dir();
    let scenarios = discover_scenarios(&maps_dir)?;
    log::info!(
        "Found {} scenario(s) in '{}'",
        scenarios.len(),
        maps_dir.display()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let interrupt_handle = start_interrupt_listener(&runtime);
    let executor = Arc::new(Executor::new(runtime, interrupt_handle.clone()));

    let supervisor = ProcessSupervisor::new(
        Box::new(EngineClientLauncher::new(executor)),
        Box::new(SysinfoProcessControl::new()),
        config.supervisor_settings(),
    );
    let detector = OutcomeDetector::new(
        Box::new(FileLogSource::new(config.client_log_path())),
        config.poll_budget,
    )
    .with_tail_window(config.tail_window);
    let mut runner = ScenarioRunner::new(
        config.engine_target(),
        supervisor,
        detector,
        Box::new(ZipArtifactCollector::new(config.artifact_settings())),
    );

    let summary = run_batch(&config, &mut runner, &scenarios, &interrupt_handle)?;

    let summary_path = config.results_path(RUN_SUMMARY_FILE_NAME);
    if let Err(e) = append_run_summary(&summary, &summary_path) {
        log::error!(
            "Failed to write run summary to '{}': {e:?}",
            summary_path.display()
        );
    }

    log::info!(
        "Run {} finished: {} passed, {} failed{}",
        summary.run_id,
        summary.passed(),
        summary.failed(),
        if summary.interrupted {
            ", interrupted"
        } else {
            ""
        }
    );
    Ok(summary)
}

/// Start from an empty result directory with its staging directory in place.
pub fn prepare_result_directory(config: &DriverConfig) -> DriverResult<()> {
    let result_dir = &config.result_directory;
    if result_dir.exists() {
        log::debug!("Removing previous results in '{}'", result_dir.display());
        std::fs::remove_dir_all(result_dir).with_context(|| {
            format!(
                "Failed to remove result directory '{}'",
                result_dir.display()
            )
        })?;
    }

    let temp_dir = config.result_temp_dir();
    std::fs::create_dir_all(&temp_dir)
        .with_context(|| format!("Failed to create result directory '{}'", temp_dir.display()))?;
    Ok(())
}

/// Run `scenarios` in order, appending one report entry per scenario as it completes.
///
/// Stops early, with the report still closed, if `interrupt_handle` fires.
pub fn run_batch(
    config: &DriverConfig,
    runner: &mut ScenarioRunner,
    scenarios: &[PathBuf],
    interrupt_handle: &InterruptHandle,
) -> DriverResult<RunSummary> {
    let mut summary = RunSummary::new(
        nanoid::nanoid!(),
        chrono::Utc::now().timestamp(),
        scenarios.len(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    let mut report = XmlReportWriter::create(&config.report_path())?;
    let progress = BatchProgress::new(scenarios.len(), !config.no_progress);

    for path in scenarios {
        if interrupt_handle.is_interrupted() {
            summary.set_interrupted();
            break;
        }

        progress.start_scenario(&path.display().to_string());
        let scenario_run = runner.run(path);
        progress.finish_scenario();

        match scenario_run.result() {
            Some(result) => record_result(&mut report, &mut summary, result),
            None => {
                log::warn!("Stopping the batch after '{}'", scenario_run.name);
                summary.set_interrupted();
                break;
            }
        }
    }

    progress.finish();
    report.finish()?;
    Ok(summary)
}

/// Losing a report line is logged and the batch carries on, so the report still gets closed.
fn record_result<W: Write>(
    report: &mut XmlReportWriter<W>,
    summary: &mut RunSummary,
    result: ScenarioResult,
) {
    if let Err(e) = report.append(&result) {
        log::error!("{e:?}");
    }
    summary.add_result(result);
}
