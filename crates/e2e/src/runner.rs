//! Scenario runner that resolves locators and drives Playwright

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{E2eError, E2eResult};
use crate::locator::{LocatorTable, LocatorVars};
use crate::playwright::{check_results, PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::spec::Scenario;

/// Keep scenarios carrying `tag` and named `name`, when given
pub fn select_scenarios(
    scenarios: Vec<Scenario>,
    name: Option<&str>,
    tag: Option<&str>,
) -> Vec<Scenario> {
    let tagged = match tag {
        Some(tag) => Scenario::filter_by_tag(&scenarios, tag)
            .into_iter()
            .cloned()
            .collect(),
        None => scenarios,
    };
    match name {
        Some(name) => tagged.into_iter().filter(|s| s.name == name).collect(),
        None => tagged,
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

impl TestResult {
    /// A scenario that failed before or outside its steps
    pub fn failed(name: &str, duration_ms: u64, error: &E2eError) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms,
            steps: vec![],
            error: Some(error.to_string()),
        }
    }
}

/// Result of running all scenarios
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    /// Add a result and update the counters
    pub fn record(&mut self, result: TestResult) {
        self.total += 1;
        if result.success {
            self.passed += 1;
            info!("✓ {} ({} ms)", result.name, result.duration_ms);
        } else {
            self.failed += 1;
            error!(
                "✗ {} - {}",
                result.name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        self.results.push(result);
    }

    /// Count a scenario that was not run
    pub fn skip(&mut self, name: &str, reason: &str) {
        self.total += 1;
        self.skipped += 1;
        info!("- {} skipped: {}", name, reason);
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Main E2E scenario runner
pub struct TestRunner {
    /// Playwright configuration
    playwright_config: PlaywrightConfig,

    /// Element locators, with any overrides applied
    locators: LocatorTable,

    /// Variables every scenario inherits
    vars: LocatorVars,

    /// Scenario directory
    specs_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> E2eResult<Self> {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> E2eResult<Self> {
        let mut locators = LocatorTable::board_app();
        if let Some(path) = &config.locators_file {
            locators.load_overrides(path)?;
        }

        Ok(Self {
            playwright_config: config.playwright,
            locators,
            vars: config.vars,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        })
    }

    pub fn locators(&self) -> &LocatorTable {
        &self.locators
    }

    /// Scenarios from the specs directory; none if it does not exist
    pub fn load_scenarios(&self) -> E2eResult<Vec<Scenario>> {
        if !self.specs_dir.exists() {
            debug!("No scenario directory at {}", self.specs_dir.display());
            return Ok(vec![]);
        }
        Scenario::load_all(&self.specs_dir)
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let scenarios = self.load_scenarios()?;
        Ok(self.run_scenarios(&scenarios).await)
    }

    /// Run a list of scenarios, one browser session each
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> TestSuiteResult {
        let start = Instant::now();
        let mut suite = TestSuiteResult::default();

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            suite.record(self.run_scenario(scenario).await);
        }

        suite.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );

        suite
    }

    /// Run a single scenario
    ///
    /// Locator problems fail the scenario before a browser is launched.
    pub async fn run_scenario(&self, scenario: &Scenario) -> TestResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        match self.execute(scenario).await {
            Ok(steps) => {
                let error = check_results(&steps).err().map(|e| e.to_string());
                TestResult {
                    name: scenario.name.clone(),
                    success: error.is_none(),
                    duration_ms: start.elapsed().as_millis() as u64,
                    steps,
                    error,
                }
            }
            Err(e) => TestResult::failed(&scenario.name, start.elapsed().as_millis() as u64, &e),
        }
    }

    async fn execute(&self, scenario: &Scenario) -> E2eResult<Vec<StepResult>> {
        let mut scenario = scenario.clone();
        scenario.inherit_vars(&self.vars);
        let steps = scenario.resolve(&self.locators)?;

        let mut config = self.playwright_config.clone();
        config.viewport_width = scenario.viewport.width;
        config.viewport_height = scenario.viewport.height;

        let playwright = PlaywrightHandle::new(config)?;
        playwright.run_steps(&steps).await
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.output_dir, results)
    }
}

/// Write `results` as `test-results.json` under `output_dir`
pub fn write_results(output_dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,
    /// YAML file of locator overrides
    pub locators_file: Option<PathBuf>,
    /// Variables every scenario inherits unless it sets its own
    pub vars: LocatorVars,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            locators_file: None,
            vars: LocatorVars::new(),
            specs_dir: PathBuf::from("crates/e2e/specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}
