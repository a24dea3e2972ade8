//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario parse error: {0}")]
    SpecParse(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Unknown locator: {0}")]
    UnknownLocator(String),

    #[error("Locator '{locator}' needs a value for {{{placeholder}}}")]
    UnresolvedPlaceholder { locator: String, placeholder: String },

    #[error("Locator '{locator}': value for {{{placeholder}}} contains a double quote: {value}")]
    InvalidPlaceholderValue {
        locator: String,
        placeholder: String,
        value: String,
    },

    #[error("Config error: {0}")]
    Config(#[from] taskboard_common::Error),

    #[error("REST error: {0}")]
    Rest(#[from] taskboard_rest::RestError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] taskboard_rest::ScenarioError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
