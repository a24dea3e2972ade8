//! Taskboard REST test client
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  BoardService   create → assert status → decode → cleanup  │
//! ├────────────────────────────────────────────────────────────┤
//! │  BoardApi<T: Transport>   paths, params, credentials       │
//! ├────────────────────────────────────────────────────────────┤
//! │  RestClient                                                │
//! │    ├── verb dispatch (GET POST PUT DELETE PATCH)           │
//! │    ├── one transport call, 35 s timeout                    │
//! │    └── diagnostics: curl capture, logs, attachments        │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod client;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod service;

pub use api::{ApiCredentials, BoardApi, Transport};
pub use client::{
    Body, Method, RequestSpec, Response, RestClient, RestClientConfig, DEFAULT_TIMEOUT,
};
pub use error::{RestError, RestResult, ScenarioError, ScenarioResult};
pub use service::BoardService;
