use std::path::{Path, PathBuf};

use vcmi_autotest_report_model::ScenarioResult;

use crate::artifacts::ArtifactSink;
use crate::client::EngineTarget;
use crate::container::{MalformedScenarioError, ScenarioDescriptor};
use crate::outcome::{OutcomeDetector, Verdict};
use crate::supervisor::ProcessSupervisor;

#[derive(Debug)]
pub enum ScenarioStatus {
    Won,
    Lost,
    /// The scenario file could not be decoded. Nothing was launched.
    Malformed(MalformedScenarioError),
    /// The operator stopped the driver while the scenario was running.
    Interrupted,
}

#[derive(Debug)]
pub struct ScenarioRun {
    /// Display name, or the file stem when the scenario could not be decoded.
    pub name: String,
    pub status: ScenarioStatus,
    /// Archive of logs kept for a lost scenario.
    pub artifact: Option<PathBuf>,
}

impl ScenarioRun {
    pub fn success(&self) -> bool {
        matches!(self.status, ScenarioStatus::Won)
    }

    /// Report entry for this run. Interrupted runs are not reported.
    pub fn result(&self) -> Option<ScenarioResult> {
        match self.status {
            ScenarioStatus::Interrupted => None,
            _ => Some(ScenarioResult::new(&self.name, self.success())),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.status, ScenarioStatus::Interrupted)
    }
}

/// Takes one scenario file from decoding to verdict.
pub struct ScenarioRunner {
    target: EngineTarget,
    supervisor: ProcessSupervisor,
    detector: OutcomeDetector,
    artifacts: Box<dyn ArtifactSink>,
}

impl ScenarioRunner {
    pub fn new(
        target: EngineTarget,
        supervisor: ProcessSupervisor,
        detector: OutcomeDetector,
        artifacts: Box<dyn ArtifactSink>,
    ) -> Self {
        Self {
            target,
            supervisor,
            detector,
            artifacts,
        }
    }

    /// Run the scenario at `path`. Problems with one scenario never escape as errors, they are
    /// folded into the returned status.
    pub fn run(&mut self, path: &Path) -> ScenarioRun {
        let descriptor = match ScenarioDescriptor::from_path(path) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                let name = file_stem(path);
                log::error!("Skipping malformed scenario '{}': {e}", path.display());
                return ScenarioRun {
                    name,
                    status: ScenarioStatus::Malformed(e),
                    artifact: None,
                };
            }
        };

        log::info!("Scenario: {}", descriptor.display_name);
        log::info!("Description: {}", descriptor.description);
        log::debug!("Tracking player {}", descriptor.tracked_player);

        let invocation = self.target.invocation(path);
        let supervision = self.supervisor.supervise(&invocation);
        if supervision.interrupted {
            return ScenarioRun {
                name: descriptor.display_name,
                status: ScenarioStatus::Interrupted,
                artifact: None,
            };
        }
        if !supervision.attempts.iter().any(|a| a.exited_cleanly()) {
            log::warn!(
                "Engine client never exited cleanly in {} attempt(s), checking the log anyway",
                supervision.attempts.len()
            );
        }

        let verdict = self.detector.detect(descriptor.tracked_player);
        let (status, artifact) = match verdict {
            Verdict::Won => (ScenarioStatus::Won, None),
            Verdict::Lost => (ScenarioStatus::Lost, self.capture(&descriptor.display_name)),
        };

        log::info!(
            "Scenario '{}' {}",
            descriptor.display_name,
            if verdict == Verdict::Won { "passed" } else { "failed" }
        );
        ScenarioRun {
            name: descriptor.display_name,
            status,
            artifact,
        }
    }

    fn capture(&self, name: &str) -> Option<PathBuf> {
        match self.artifacts.capture(name) {
            Ok(archive) => Some(archive),
            Err(e) => {
                log::error!("Failed to capture artifacts for '{name}': {e:?}");
                None
            }
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::tests::{gzip, raw_container};
    use crate::outcome::{LogAccessError, LogReader, LogSource, PollBudget};
    use crate::supervisor::tests::{FakeExit, FakeProcesses, ScriptedLauncher};
    use crate::supervisor::SupervisorSettings;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::time::Duration;

    struct FixedLog(String);

    impl LogSource for FixedLog {
        fn open_exclusive(&self) -> Result<Box<dyn LogReader>, LogAccessError> {
            Ok(Box::new(Cursor::new(self.0.clone().into_bytes())))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        captured: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl ArtifactSink for RecordingSink {
        fn capture(&self, name: &str) -> anyhow::Result<PathBuf> {
            self.captured.borrow_mut().push(name.to_string());
            if self.fail {
                anyhow::bail!("disk full");
            }
            Ok(PathBuf::from(format!("{name}.zip")))
        }
    }

    struct Harness {
        runner: ScenarioRunner,
        launches: Rc<RefCell<crate::supervisor::tests::LaunchLog>>,
        captured: Rc<RefCell<Vec<String>>>,
        dir: tempfile::TempDir,
    }

    fn harness(script: &[FakeExit], log: &str, failing_sink: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let (launcher, launches) = ScriptedLauncher::new(script);
        let (processes, _) = FakeProcesses::new(&[]);
        let supervisor = ProcessSupervisor::new(
            Box::new(launcher),
            Box::new(processes),
            SupervisorSettings {
                client_timeout: Duration::from_millis(10),
                ..SupervisorSettings::default()
            },
        );
        let detector = OutcomeDetector::new(
            Box::new(FixedLog(log.to_string())),
            PollBudget {
                attempts: 3,
                interval: Duration::from_millis(1),
            },
        );
        let sink = RecordingSink {
            fail: failing_sink,
            ..RecordingSink::default()
        };
        let captured = sink.captured.clone();
        let target = EngineTarget {
            program: PathBuf::from("vcmiclient"),
            working_dir: dir.path().to_path_buf(),
            map_prefix: "MAPS/".to_string(),
        };

        Harness {
            runner: ScenarioRunner::new(target, supervisor, detector, Box::new(sink)),
            launches,
            captured,
            dir,
        }
    }

    fn write_scenario(dir: &Path, file_name: &str, name: &str, description: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(
            &path,
            gzip(&raw_container(name.as_bytes(), description.as_bytes())),
        )
        .unwrap();
        path
    }

    #[test]
    fn won_scenario_skips_artifacts() {
        let mut h = harness(
            &[FakeExit::Code(0)],
            "VCAI: Player 0 (red) won. I won! Incredible!\n",
            false,
        );
        let path = write_scenario(h.dir.path(), "arrogance.h3m", "Arrogance", "red wins");

        let run = h.runner.run(&path);

        assert!(run.success());
        assert_eq!(run.name, "Arrogance");
        assert!(run.artifact.is_none());
        assert!(h.captured.borrow().is_empty());
        assert_eq!(h.launches.borrow().launches[0].args[1], "MAPS/arrogance");
    }

    #[test]
    fn lost_scenario_captures_artifacts() {
        let mut h = harness(&[FakeExit::Code(0)], "INFO no outcome\n", false);
        let path = write_scenario(h.dir.path(), "orb.h3m", "Dragon Orb", "PLAYER:BLUE");

        let run = h.runner.run(&path);

        assert!(!run.success());
        assert!(matches!(run.status, ScenarioStatus::Lost));
        assert_eq!(run.artifact, Some(PathBuf::from("Dragon Orb.zip")));
        assert_eq!(*h.captured.borrow(), vec!["Dragon Orb".to_string()]);
    }

    #[test]
    fn tracked_player_comes_from_description() {
        let mut h = harness(
            &[FakeExit::Code(0)],
            "VCAI: Player 0 (red) won. I won! Incredible!\n",
            false,
        );
        let path = write_scenario(h.dir.path(), "orb.h3m", "Dragon Orb", "PLAYER:BLUE");

        let run = h.runner.run(&path);

        assert!(!run.success());
    }

    #[test]
    fn malformed_scenario_is_reported_under_file_stem() {
        let mut h = harness(&[], "", false);
        let path = h.dir.path().join("broken.h3m");
        std::fs::write(&path, b"not gzip at all").unwrap();

        let run = h.runner.run(&path);

        assert!(matches!(run.status, ScenarioStatus::Malformed(_)));
        assert_eq!(run.result(), Some(ScenarioResult::new("broken", false)));
        assert!(h.launches.borrow().launches.is_empty());
        assert!(h.captured.borrow().is_empty());
    }

    #[test]
    fn artifact_failure_keeps_the_verdict() {
        let mut h = harness(&[FakeExit::Code(0)], "", true);
        let path = write_scenario(h.dir.path(), "a.h3m", "A", "");

        let run = h.runner.run(&path);

        assert!(matches!(run.status, ScenarioStatus::Lost));
        assert!(run.artifact.is_none());
        assert_eq!(h.captured.borrow().len(), 1);
    }

    #[test]
    fn outcome_is_checked_even_after_failed_attempts() {
        let mut h = harness(
            &[FakeExit::Code(1), FakeExit::Code(1), FakeExit::Code(1)],
            "VCAI: Player 0 (red) won. I won! Incredible!\n",
            false,
        );
        let path = write_scenario(h.dir.path(), "a.h3m", "A", "");

        let run = h.runner.run(&path);

        assert_eq!(h.launches.borrow().launches.len(), 3);
        assert!(run.success());
    }

    #[test]
    fn interrupted_scenario_is_not_reported() {
        let mut h = harness(&[FakeExit::Interrupt], "", false);
        let path = write_scenario(h.dir.path(), "a.h3m", "A", "");

        let run = h.runner.run(&path);

        assert!(run.is_interrupted());
        assert_eq!(run.result(), None);
        assert!(h.captured.borrow().is_empty());
    }

    #[test]
    fn interrupt_before_launch_is_not_reported() {
        let mut h = harness(&[FakeExit::InterruptLaunch], "", false);
        let path = write_scenario(h.dir.path(), "a.h3m", "A", "");

        let run = h.runner.run(&path);

        assert!(run.is_interrupted());
        assert_eq!(run.result(), None);
        assert_eq!(h.launches.borrow().launches.len(), 1);
        assert!(h.captured.borrow().is_empty());
    }
}
