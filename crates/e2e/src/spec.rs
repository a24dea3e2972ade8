//! Declarative YAML scenarios

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::locator::{LocatorTable, LocatorVars, WaitCondition, DEFAULT_WAIT};

/// A browser scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Values for locator placeholders and `${name}` references in step text
    #[serde(default)]
    pub vars: LocatorVars,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<UiStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a scenario
///
/// `target` is a locator name, or a raw `xpath=`/`css=`/`//` selector.
/// Actions carry their own wait: clicks wait until clickable, typing
/// until visible, hovering until present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiStep {
    /// Load a URL in the current page
    Goto { url: String },

    /// Click an element once it is clickable
    Click {
        target: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Type into an element once it is visible
    Type {
        target: String,
        text: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Move the mouse over an element once it is present
    Hover {
        target: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for a condition without acting
    Wait {
        target: String,
        #[serde(default)]
        condition: WaitCondition,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Check the visible text of an element
    AssertText {
        target: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        contains: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Log a message (for debugging)
    Log { message: String },
}

/// Default wait for steps that do not set `timeout_ms`
pub fn default_timeout_ms() -> u64 {
    DEFAULT_WAIT.as_millis() as u64
}

impl UiStep {
    /// Locator name or selector this step acts on, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            UiStep::Click { target, .. }
            | UiStep::Type { target, .. }
            | UiStep::Hover { target, .. }
            | UiStep::Wait { target, .. }
            | UiStep::AssertText { target, .. } => Some(target),
            UiStep::Goto { .. }
            | UiStep::Screenshot { .. }
            | UiStep::Sleep { .. }
            | UiStep::Log { .. } => None,
        }
    }

    /// Short label used in logs and results
    pub fn label(&self) -> String {
        match self {
            UiStep::Goto { url } => format!("goto:{}", url),
            UiStep::Click { target, .. } => format!("click:{}", target),
            UiStep::Type { target, .. } => format!("type:{}", target),
            UiStep::Hover { target, .. } => format!("hover:{}", target),
            UiStep::Wait { target, condition, .. } => {
                format!("wait_{}:{}", condition.as_str(), target)
            }
            UiStep::AssertText { target, .. } => format!("assert_text:{}", target),
            UiStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            UiStep::Sleep { ms } => format!("sleep:{}ms", ms),
            UiStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }

    /// Copy of this step with the target turned into a Playwright selector
    /// and `${var}` references in text filled in
    pub fn resolve(&self, table: &LocatorTable, vars: &LocatorVars) -> E2eResult<UiStep> {
        let selector = |target: &str| table.selector(target, vars);
        let text = |value: &str| interpolate(value, vars);

        Ok(match self {
            UiStep::Goto { url } => UiStep::Goto { url: text(url) },
            UiStep::Click { target, timeout_ms } => UiStep::Click {
                target: selector(target)?,
                timeout_ms: *timeout_ms,
            },
            UiStep::Type {
                target,
                text: value,
                timeout_ms,
            } => UiStep::Type {
                target: selector(target)?,
                text: text(value),
                timeout_ms: *timeout_ms,
            },
            UiStep::Hover { target, timeout_ms } => UiStep::Hover {
                target: selector(target)?,
                timeout_ms: *timeout_ms,
            },
            UiStep::Wait {
                target,
                condition,
                timeout_ms,
            } => UiStep::Wait {
                target: selector(target)?,
                condition: *condition,
                timeout_ms: *timeout_ms,
            },
            UiStep::AssertText {
                target,
                text: expected,
                contains,
                timeout_ms,
            } => UiStep::AssertText {
                target: selector(target)?,
                text: expected.as_deref().map(text),
                contains: contains.as_deref().map(text),
                timeout_ms: *timeout_ms,
            },
            UiStep::Log { message } => UiStep::Log {
                message: text(message),
            },
            other => other.clone(),
        })
    }
}

/// Replace `${name}` with the value of `name`; unknown names are left as-is
///
/// Substituted values are not scanned again.
fn interpolate(value: &str, vars: &LocatorVars) -> String {
    static REFERENCE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\$\{([a-z_]+)\}").expect("variable pattern is valid"));

    REFERENCE
        .replace_all(value, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(replacement) => replacement.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

impl Scenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, sorted by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Fill variables the scenario does not set itself
    pub fn inherit_vars(&mut self, defaults: &LocatorVars) {
        for (name, value) in defaults {
            self.vars
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Every step with targets resolved against `table`
    ///
    /// Fails on the first unknown locator or unfilled placeholder, before
    /// any browser is started.
    pub fn resolve(&self, table: &LocatorTable) -> E2eResult<Vec<UiStep>> {
        self.steps
            .iter()
            .map(|step| step.resolve(table, &self.vars))
            .collect()
    }
}
