use pretty_assertions::assert_eq;
use vcmi_autotest_report_model::{
    append_run_summary, load_summary_runs, RunSummary, ScenarioResult, XmlReportWriter,
};

#[test]
fn appended_summaries_are_loaded_in_order() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("run_summary.jsonl");

    let mut first = RunSummary::new("run-1".to_string(), 1_700_000_000, 2, "0.1.0".to_string());
    first.add_result(ScenarioResult::new("Arrogance", true));
    first.add_result(ScenarioResult::new("Dragon Orb", false));

    let mut second = RunSummary::new("run-2".to_string(), 1_700_000_100, 2, "0.1.0".to_string());
    second.add_result(ScenarioResult::new("Arrogance", true));
    second.set_interrupted();

    append_run_summary(&first, &path).expect("failed to append first summary");
    append_run_summary(&second, &path).expect("failed to append second summary");

    let loaded = load_summary_runs(&path).expect("failed to load summaries");
    assert_eq!(loaded, vec![first, second]);
}

#[test]
fn report_file_is_readable_before_it_is_finished() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("result.xml");

    let mut report = XmlReportWriter::create(&path).expect("failed to create report");
    report
        .append(&ScenarioResult::new("Arrogance", true))
        .expect("failed to append");

    let partial = std::fs::read_to_string(&path).expect("failed to read partial report");
    assert_eq!(
        partial,
        "<testrun>\n  <test name=\"Arrogance\" result=\"True\" />\n"
    );

    report.finish().expect("failed to finish report");
    let complete = std::fs::read_to_string(&path).expect("failed to read report");
    assert!(complete.ends_with("</testrun>"));
}
