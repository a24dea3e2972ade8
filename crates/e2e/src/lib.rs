//! Taskboard E2E Test Framework
//!
//! Browser-side half of the taskboard suite:
//! - Maps element names to XPath locators for the board web app
//! - Records page flows (login, boards, lists, cards) as steps
//! - Parses declarative YAML scenarios
//! - Drives Playwright through one generated Node script per scenario
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── Scenario::resolve(LocatorTable) -> [UiStep]          │
//! │    ├── PlaywrightHandle::run_steps(steps) -> [StepResult]   │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML) / BoardPage (Rust)                         │
//! │    ├── name, description, tags, vars                        │
//! │    └── steps: [UiStep]                                      │
//! │          ├── goto { url }                                   │
//! │          ├── click { target }        wait clickable         │
//! │          ├── type { target, text }   wait visible           │
//! │          ├── hover { target }        wait present           │
//! │          ├── wait { target, condition }                     │
//! │          ├── assert_text { target, text?, contains? }       │
//! │          └── screenshot { name }                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod locator;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use locator::{LocatorTable, WaitCondition};
pub use page::{BoardNames, BoardPage};
pub use runner::{TestResult, TestRunner, TestSuiteResult};
pub use spec::{Scenario, UiStep};
