//! Test runner: executes specs against an injected command set, browser
//! driver and HTTP client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::commands::{CommandContext, CommandSet};
use crate::config::RunConfig;
use crate::driver::{Action, BrowserDriver};
use crate::error::{E2eError, E2eResult, FailureKind};
use crate::http::HttpClient;
use crate::spec::{StepKind, TestSpec};

/// Result of executing one step (or one batch of browser steps)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Main E2E test runner
pub struct TestRunner {
    commands: CommandSet,
    driver: Box<dyn BrowserDriver>,
    http: Box<dyn HttpClient>,
    specs_dir: PathBuf,
    output_dir: PathBuf,
}

impl TestRunner {
    pub fn new(
        commands: CommandSet,
        driver: Box<dyn BrowserDriver>,
        http: Box<dyn HttpClient>,
        run: RunConfig,
    ) -> Self {
        Self {
            commands,
            driver,
            http,
            specs_dir: run.specs_dir,
            output_dir: run.output_dir,
        }
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Run all tests in the specs directory
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run tests matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        if filtered.is_empty() {
            return Err(E2eError::SpecParse(format!("No tests tagged '{}'", tag)));
        }
        Ok(self.run_specs(&filtered).await)
    }

    /// Run a specific test by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        Ok(self.run_specs(std::slice::from_ref(&spec)).await)
    }

    /// Run a list of test specs
    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> TestSuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} test(s)...", specs.len());

        for spec in specs {
            let result = self.run_spec(spec).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("Test Results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        TestSuiteResult {
            started_at,
            total: specs.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    /// Run a single test spec, stopping at its first failure.
    ///
    /// Consecutive browser steps are sent to the driver as one batch so they
    /// share a page.
    pub async fn run_spec(&mut self, spec: &TestSpec) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        let mut steps = Vec::new();
        let mut pending: Vec<Action> = Vec::new();
        let mut failure: Option<E2eError> = None;

        for step in &spec.steps {
            let (start, result) = match step.kind() {
                StepKind::Browser(action) => {
                    pending.push(action);
                    continue;
                }
                StepKind::Command { name, args } => {
                    if let Err(e) = self.flush_batch(&mut pending, &mut steps).await {
                        failure = Some(e);
                        break;
                    }
                    let start = Instant::now();
                    (start, self.run_command(name, args).await)
                }
                StepKind::Log(message) => {
                    if let Err(e) = self.flush_batch(&mut pending, &mut steps).await {
                        failure = Some(e);
                        break;
                    }
                    info!("[TEST LOG] {}", message);
                    (Instant::now(), Ok(()))
                }
            };

            steps.push(step_result(step.name(), start, &result));
            if let Err(e) = result {
                failure = Some(e);
                break;
            }
        }

        if failure.is_none() {
            if let Err(e) = self.flush_batch(&mut pending, &mut steps).await {
                failure = Some(e);
            }
        }

        TestResult {
            name: spec.name.clone(),
            success: failure.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: failure.as_ref().map(|e| e.to_string()),
            failure: failure.as_ref().map(E2eError::kind),
        }
    }

    /// Send any pending browser actions as one batch
    async fn flush_batch(&mut self, pending: &mut Vec<Action>, steps: &mut Vec<StepResult>) -> E2eResult<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(pending);
        self.run_batch(&batch, steps).await
    }

    async fn run_batch(&mut self, actions: &[Action], steps: &mut Vec<StepResult>) -> E2eResult<()> {
        let names: Vec<String> = actions.iter().map(Action::name).collect();
        let step_name = format!("browser[{}]", names.join(", "));
        debug!("Executing step: {}", step_name);

        let start = Instant::now();
        let result = self.driver.perform(actions).await;
        steps.push(step_result(step_name, start, &result));
        result
    }

    async fn run_command(&mut self, name: &str, args: &[String]) -> E2eResult<()> {
        debug!("Executing step: command:{}", name);
        let mut ctx = CommandContext::new(self.driver.as_mut(), self.http.as_ref());
        self.commands.invoke(name, &mut ctx, args).await
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn step_result(step_name: String, start: Instant, result: &E2eResult<()>) -> StepResult {
    StepResult {
        step_name,
        success: result.is_ok(),
        duration_ms: start.elapsed().as_millis() as u64,
        error: result.as_ref().err().map(|e| e.to_string()),
        failure: result.as_ref().err().map(E2eError::kind),
    }
}
