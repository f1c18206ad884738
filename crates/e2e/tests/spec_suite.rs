//! Runs the bundled YAML specs with a recording driver

use serde_json::json;
use std::path::PathBuf;

use e2e_commands::config::RunConfig;
use e2e_commands::driver::RecordingDriver;
use e2e_commands::http::{HttpResponse, StubClient};
use e2e_commands::runner::TestSuiteResult;
use e2e_commands::{CommandSet, E2eConfig, FailureKind, TestRunner};

fn specs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/e2e/specs")
}

fn runner(api_status: &str, output_dir: PathBuf) -> TestRunner {
    let config = E2eConfig::default();
    TestRunner::new(
        CommandSet::with_defaults(&config),
        Box::new(RecordingDriver::new()),
        Box::new(StubClient::new(HttpResponse::json(200, &json!({ "status": api_status })))),
        RunConfig {
            specs_dir: specs_dir(),
            output_dir,
        },
    )
}

#[tokio::test]
async fn bundled_specs_pass_against_healthy_api() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = runner("healthy", out.path().to_path_buf());

    let suite = runner.run_all().await.unwrap();

    let names: Vec<_> = suite.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["dashboard-refresh", "api-health", "login-flow"]);
    assert!(suite.success(), "{:#?}", suite.results);
}

#[tokio::test]
async fn smoke_tag_selects_health_specs() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = runner("degraded", out.path().to_path_buf());

    let suite = runner.run_tagged("smoke").await.unwrap();

    assert_eq!(suite.total, 2);
    assert_eq!(suite.failed, 2);
    for result in &suite.results {
        assert_eq!(result.failure, Some(FailureKind::ContractViolation));
        assert!(result.error.as_deref().unwrap().contains("degraded"));
    }
}

#[tokio::test]
async fn run_by_name_writes_results() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = runner("healthy", out.path().to_path_buf());

    let suite = runner.run_test("login-flow").await.unwrap();
    let path = runner.write_results(&suite).unwrap();

    let written: TestSuiteResult =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.total, 1);
    assert_eq!(written.passed, 1);
    assert_eq!(written.results[0].steps.len(), 2);
    // Credentials never reach the report.
    assert!(!std::fs::read_to_string(&path).unwrap().contains("secret"));
}

#[tokio::test]
async fn unknown_test_name_is_an_error() {
    let out = tempfile::tempdir().unwrap();
    let mut runner = runner("healthy", out.path().to_path_buf());

    assert!(runner.run_test("does-not-exist").await.is_err());
}
