//! Error types for the REST client and the scenarios built on it

use std::time::Duration;

use thiserror::Error;

/// Errors that abort a single REST call
///
/// Only the method check and transport failures stop a call. Diagnostic and
/// response-parsing problems are logged by the client and never show up here.
#[derive(Error, Debug)]
pub enum RestError {
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Connection to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Response from {url} is not valid JSON: {message}")]
    ResponseParse { url: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RestError::Timeout { .. })
    }

    /// True for failures that happened on the wire
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RestError::Timeout { .. } | RestError::Connection { .. } | RestError::Transport(_)
        )
    }
}

pub type RestResult<T> = Result<T, RestError>;

/// Errors raised by board scenarios
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error(transparent)]
    Rest(#[from] RestError),

    #[error("{operation}: expected status {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        operation: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("{operation}: response body could not be decoded: {message}")]
    Decode { operation: String, message: String },

    #[error("{operation}: expected {expected}, got {actual}")]
    Mismatch {
        operation: String,
        expected: String,
        actual: String,
    },
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
