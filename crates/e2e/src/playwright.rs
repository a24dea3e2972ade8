//! Playwright browser automation
//!
//! A scenario compiles to one Node script so the browser session, and with
//! it the login, lives across every step. The script prints one JSON event
//! per line on stdout; anything else it prints is ignored.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::locator::WaitCondition;
use crate::spec::{default_timeout_ms, UiStep};

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Result of executing a scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    #[serde(default)]
    pub timed_out: bool,
    pub screenshot_path: Option<PathBuf>,
}

/// One line of script output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ScriptEvent {
    Step {
        index: usize,
        duration_ms: u64,
    },
    Error {
        index: usize,
        name: String,
        message: String,
        #[serde(default)]
        duration_ms: u64,
    },
    Log {
        message: String,
    },
}

/// Captured output of a finished script
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

const SCRIPT_HELPERS: &str = r#"const { chromium, firefox, webkit } = require('playwright');

function report(event) {
  console.log(JSON.stringify(event));
}

async function waitFor(page, selector, condition, timeout) {
  const locator = page.locator(selector);
  switch (condition) {
    case 'present':
      await locator.first().waitFor({ state: 'attached', timeout });
      return locator.first();
    case 'visible':
      await locator.first().waitFor({ state: 'visible', timeout });
      return locator.first();
    case 'clickable':
      await locator.first().click({ trial: true, timeout });
      return locator.first();
    case 'all_present':
      await locator.first().waitFor({ state: 'attached', timeout });
      return locator;
  }
  throw new Error('unknown wait condition: ' + condition);
}
"#;

const SCRIPT_FOOTER: &str = r#"
  } catch (error) {
    report({ event: 'error', index: step, name: error.name, message: error.message, duration_ms: Date.now() - started });
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#;

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        // Verify playwright is installed
        Self::check_playwright_installed()?;

        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a set of resolved steps
    pub fn build_script(&self, steps: &[UiStep]) -> String {
        build_script(&self.config, steps)
    }

    /// Run resolved steps in one browser session
    ///
    /// Results stop at the first failing step. A script that dies without
    /// reporting which step failed is an error.
    pub async fn run_steps(&self, steps: &[UiStep]) -> E2eResult<Vec<StepResult>> {
        let script = self.build_script(steps);
        let output = self.run_script(&script).await?;
        let results = collect_results(&self.config, steps, &output.stdout);

        if !output.success && results.iter().all(|r| r.success) {
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                output.stdout, output.stderr
            )));
        }

        Ok(results)
    }

    /// Execute a script via node
    pub async fn run_script(&self, script: &str) -> E2eResult<ScriptOutput> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut command = TokioCommand::new("node");
        command
            .arg(&script_path)
            .current_dir(temp_dir.path())
            .kill_on_drop(true);
        if let Some(node_path) = &self.config.node_path {
            command.env("NODE_PATH", node_path);
        }

        let output = tokio::time::timeout(self.config.script_timeout, command.output())
            .await
            .map_err(|_| {
                E2eError::Timeout(format!(
                    "playwright script after {:?}",
                    self.config.script_timeout
                ))
            })??;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.trim().is_empty() {
            debug!("Playwright stderr: {}", stderr.trim());
        }

        Ok(ScriptOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// Turn the first failed step into an error
pub fn check_results(results: &[StepResult]) -> E2eResult<()> {
    match results.iter().find(|r| !r.success) {
        Some(failed) if failed.timed_out => Err(E2eError::Timeout(failed.step_name.clone())),
        Some(failed) => Err(E2eError::StepFailed {
            step: failed.step_name.clone(),
            reason: failed.error.clone().unwrap_or_default(),
        }),
        None => Ok(()),
    }
}

/// Quote a value as a JavaScript string literal
fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Build the Node script for `steps` under `config`
pub fn build_script(config: &PlaywrightConfig, steps: &[UiStep]) -> String {
    let mut script = String::from(SCRIPT_HELPERS);

    script.push_str(&format!(
        r#"
(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};
  const resolveUrl = (url) => /^https?:\/\//.test(url) ? url : baseUrl + url;
  let step = 0;
  let started = Date.now();

  try {{
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
        base_url = js_str(&config.base_url),
    ));

    for (i, step) in steps.iter().enumerate() {
        script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.label()));
        script.push_str(&format!("    step = {}; started = Date.now();\n", i));
        script.push_str(&step_to_js(config, step, i));
        script.push_str(&format!(
            "\n    report({{ event: 'step', index: {}, duration_ms: Date.now() - started }});\n",
            i
        ));
    }

    script.push_str(SCRIPT_FOOTER);
    script
}

fn wait_then(selector: &str, condition: WaitCondition, timeout: u64) -> String {
    format!(
        "(await waitFor(page, {}, '{}', {}))",
        js_str(selector),
        condition.as_str(),
        timeout
    )
}

fn screenshot_path(config: &PlaywrightConfig, name: &str) -> PathBuf {
    config.screenshot_dir.join(format!("{}.png", name))
}

/// Convert a resolved step to JavaScript
fn step_to_js(config: &PlaywrightConfig, step: &UiStep, index: usize) -> String {
    let timeout = |t: &Option<u64>| t.unwrap_or(config.default_timeout_ms);

    match step {
        UiStep::Goto { url } => format!("    await page.goto(resolveUrl({}));", js_str(url)),
        UiStep::Click { target, timeout_ms } => {
            let t = timeout(timeout_ms);
            format!(
                "    await {}.click({{ timeout: {} }});",
                wait_then(target, WaitCondition::Clickable, t),
                t
            )
        }
        UiStep::Type {
            target,
            text,
            timeout_ms,
        } => {
            let t = timeout(timeout_ms);
            format!(
                "    await {}.pressSequentially({}, {{ timeout: {} }});",
                wait_then(target, WaitCondition::Visible, t),
                js_str(text),
                t
            )
        }
        UiStep::Hover { target, timeout_ms } => {
            let t = timeout(timeout_ms);
            format!(
                "    await {}.hover({{ timeout: {} }});",
                wait_then(target, WaitCondition::Present, t),
                t
            )
        }
        UiStep::Wait {
            target,
            condition,
            timeout_ms,
        } => format!(
            "    await waitFor(page, {}, '{}', {});",
            js_str(target),
            condition.as_str(),
            timeout(timeout_ms)
        ),
        UiStep::AssertText {
            target,
            text,
            contains,
            timeout_ms,
        } => {
            let mut lines = vec![format!(
                "    const text_{} = (await {}.innerText()).trim();",
                index,
                wait_then(target, WaitCondition::Visible, timeout(timeout_ms))
            )];
            if let Some(expected) = text {
                lines.push(format!(
                    "    if (text_{i} !== {e}) throw new Error('expected text ' + JSON.stringify({e}) + ' but found ' + JSON.stringify(text_{i}));",
                    i = index,
                    e = js_str(expected)
                ));
            }
            if let Some(fragment) = contains {
                lines.push(format!(
                    "    if (!text_{i}.includes({f})) throw new Error('expected text containing ' + JSON.stringify({f}) + ' but found ' + JSON.stringify(text_{i}));",
                    i = index,
                    f = js_str(fragment)
                ));
            }
            lines.join("\n")
        }
        UiStep::Screenshot { name, full_page } => format!(
            "    await page.screenshot({{ path: {}, fullPage: {} }});",
            js_str(&screenshot_path(config, name).to_string_lossy()),
            full_page
        ),
        UiStep::Sleep { ms } => format!("    await page.waitForTimeout({});", ms),
        UiStep::Log { message } => format!(
            "    report({{ event: 'log', message: {} }});",
            js_str(message)
        ),
    }
}

fn parse_events(stdout: &str) -> Vec<ScriptEvent> {
    stdout
        .lines()
        .filter_map(|line| match serde_json::from_str(line.trim()) {
            Ok(event) => Some(event),
            Err(_) => {
                if !line.trim().is_empty() {
                    debug!("[script] {}", line);
                }
                None
            }
        })
        .collect()
}

/// Map script output back onto the steps it was built from
fn collect_results(config: &PlaywrightConfig, steps: &[UiStep], stdout: &str) -> Vec<StepResult> {
    let mut results = Vec::new();

    for event in parse_events(stdout) {
        match event {
            ScriptEvent::Step { index, duration_ms } => {
                let Some(step) = steps.get(index) else {
                    warn!("Script reported unknown step {}", index);
                    continue;
                };
                let screenshot = match step {
                    UiStep::Screenshot { name, .. } => Some(screenshot_path(config, name)),
                    _ => None,
                };
                results.push(StepResult {
                    success: true,
                    step_name: step.label(),
                    duration_ms,
                    error: None,
                    timed_out: false,
                    screenshot_path: screenshot,
                });
            }
            ScriptEvent::Error {
                index,
                name,
                message,
                duration_ms,
            } => {
                let step_name = steps
                    .get(index)
                    .map(UiStep::label)
                    .unwrap_or_else(|| format!("step {}", index + 1));
                results.push(StepResult {
                    success: false,
                    step_name,
                    duration_ms,
                    error: Some(format!("{}: {}", name, message)),
                    timed_out: name == "TimeoutError",
                    screenshot_path: None,
                });
                break;
            }
            ScriptEvent::Log { message } => info!("[TEST LOG] {}", message),
        }
    }

    results
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Prefix for relative `goto` URLs
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    /// Wait applied to steps without their own `timeout_ms`
    pub default_timeout_ms: u64,
    /// Upper bound for a whole scenario script
    pub script_timeout: Duration,
    /// `node_modules` directory that provides `playwright`
    pub node_path: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trello.com".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            default_timeout_ms: default_timeout_ms(),
            script_timeout: Duration::from_secs(600),
            node_path: None,
        }
    }
}
