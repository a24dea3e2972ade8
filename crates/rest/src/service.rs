//! Board scenarios: create, assert, clean up
//!
//! The service turns raw responses into typed resources, failing when the
//! status is not the one the board API promises for the operation.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use taskboard_common::ApiSettings;

use crate::api::{ApiCredentials, BoardApi, Transport};
use crate::client::Response;
use crate::error::{ScenarioError, ScenarioResult};
use crate::models::{Board, BoardList, Card, Checklist};

/// Status the board API answers successful calls with
pub const EXPECTED_STATUS: u16 = 200;

/// Scenario layer over [`BoardApi`]
pub struct BoardService<T> {
    api: BoardApi<T>,
    board_name: String,
}

impl<T: Transport> BoardService<T> {
    pub fn new(api: BoardApi<T>, board_name: impl Into<String>) -> Self {
        Self {
            api,
            board_name: board_name.into(),
        }
    }

    /// Build a service from the `[api]` settings
    pub fn from_settings(transport: T, settings: &ApiSettings) -> Self {
        Self::new(
            BoardApi::new(transport, ApiCredentials::from(settings)),
            settings.board_name.clone(),
        )
    }

    pub fn api(&self) -> &BoardApi<T> {
        &self.api
    }

    pub fn board_name(&self) -> &str {
        &self.board_name
    }

    /// Create the configured board, assert success, and return the raw JSON
    pub async fn create_board_checked(&self) -> ScenarioResult<Value> {
        let response = self.api.create_board(&self.board_name).await?;
        expect_status("create board", &response, EXPECTED_STATUS)?;
        response.json().cloned().ok_or_else(|| ScenarioError::Decode {
            operation: "create board".to_string(),
            message: format!("body is not JSON: {}", response.text()),
        })
    }

    pub async fn create_board(&self, name: &str) -> ScenarioResult<Board> {
        let response = self.api.create_board(name).await?;
        checked("create board", &response)
    }

    pub async fn get_board(&self, id: &str) -> ScenarioResult<Board> {
        let response = self.api.get_board(id).await?;
        checked("get board", &response)
    }

    pub async fn create_list(&self, board_id: &str, name: &str) -> ScenarioResult<BoardList> {
        let response = self.api.create_list(board_id, name).await?;
        checked("create list", &response)
    }

    pub async fn archive_list(&self, list_id: &str) -> ScenarioResult<BoardList> {
        let response = self.api.archive_list(list_id).await?;
        let list: BoardList = checked("archive list", &response)?;
        if !list.closed {
            return Err(ScenarioError::Mismatch {
                operation: "archive list".to_string(),
                expected: "closed list".to_string(),
                actual: "open list".to_string(),
            });
        }
        Ok(list)
    }

    pub async fn create_card(
        &self,
        list_id: &str,
        name: &str,
        desc: Option<&str>,
    ) -> ScenarioResult<Card> {
        let response = self.api.create_card(list_id, name, desc).await?;
        checked("create card", &response)
    }

    pub async fn create_checklist(&self, card_id: &str, name: &str) -> ScenarioResult<Checklist> {
        let response = self.api.create_checklist(card_id, name).await?;
        checked("create checklist", &response)
    }

    /// Delete a board created by a scenario
    pub async fn cleanup_board(&self, id: &str) -> ScenarioResult<()> {
        let response = self.api.delete_board(id).await?;
        expect_status("delete board", &response, EXPECTED_STATUS)?;
        info!("Cleaned up board {}", id);
        Ok(())
    }

    /// Create the configured board, read it back, then delete it
    ///
    /// Cleanup runs even when the read-back check fails; the check's error
    /// wins if both fail.
    pub async fn board_lifecycle(&self) -> ScenarioResult<Board> {
        let board = self.create_board(&self.board_name).await?;
        info!("Created board {} ({})", board.name, board.id);

        let verified = self.verify_board(&board).await;
        let cleanup = self.cleanup_board(&board.id).await;

        if let (Err(_), Err(e)) = (&verified, &cleanup) {
            warn!("Cleanup of board {} also failed: {}", board.id, e);
        }
        verified?;
        cleanup?;
        Ok(board)
    }

    async fn verify_board(&self, created: &Board) -> ScenarioResult<()> {
        let fetched = self.get_board(&created.id).await?;
        if fetched.name != created.name {
            return Err(ScenarioError::Mismatch {
                operation: "get board".to_string(),
                expected: created.name.clone(),
                actual: fetched.name,
            });
        }
        Ok(())
    }
}

/// Fail unless `response` carries `expected`
pub fn expect_status(operation: &str, response: &Response, expected: u16) -> ScenarioResult<()> {
    if response.status() != expected {
        return Err(ScenarioError::UnexpectedStatus {
            operation: operation.to_string(),
            expected,
            actual: response.status(),
            body: response.text(),
        });
    }
    Ok(())
}

fn checked<D: DeserializeOwned>(operation: &str, response: &Response) -> ScenarioResult<D> {
    expect_status(operation, response, EXPECTED_STATUS)?;
    response.json_as().map_err(|e| ScenarioError::Decode {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}

/// The `id` of a freshly created resource
pub fn created_id<'a>(operation: &str, json: &'a Value) -> ScenarioResult<&'a str> {
    json["id"].as_str().ok_or_else(|| ScenarioError::Decode {
        operation: operation.to_string(),
        message: format!("no id in {}", json),
    })
}
