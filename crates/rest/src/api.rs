//! Board API operations
//!
//! Thin wrappers that know the paths and parameters of the board service.
//! They take any [`Transport`] so scenarios can run against the real client
//! or a stand-in, and they return the raw response for the caller to judge.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use taskboard_common::ApiSettings;

use crate::client::{Method, RequestSpec, Response, RestClient};
use crate::error::RestResult;

/// Something that can perform one REST call
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, path: &str, method: Method, spec: RequestSpec) -> RestResult<Response>;
}

#[async_trait]
impl Transport for RestClient {
    async fn send(&self, path: &str, method: Method, spec: RequestSpec) -> RestResult<Response> {
        RestClient::send(self, path, method, spec).await
    }
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Transport for &'a T {
    async fn send(&self, path: &str, method: Method, spec: RequestSpec) -> RestResult<Response> {
        (**self).send(path, method, spec).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, path: &str, method: Method, spec: RequestSpec) -> RestResult<Response> {
        (**self).send(path, method, spec).await
    }
}

/// API key and token sent as query parameters on every call
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub key: String,
    pub token: String,
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            token: token.into(),
        }
    }

    fn apply(&self, spec: RequestSpec) -> RequestSpec {
        spec.query("key", &self.key).query("token", &self.token)
    }
}

impl From<&ApiSettings> for ApiCredentials {
    fn from(settings: &ApiSettings) -> Self {
        Self::new(&settings.key, &settings.token)
    }
}

/// Board service operations over a transport
pub struct BoardApi<T> {
    transport: T,
    credentials: ApiCredentials,
}

impl<T: Transport> BoardApi<T> {
    pub fn new(transport: T, credentials: ApiCredentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(&self, path: &str, method: Method, spec: RequestSpec) -> RestResult<Response> {
        self.transport
            .send(path, method, self.credentials.apply(spec))
            .await
    }

    // Board operations

    /// Create a board
    pub async fn create_board(&self, name: &str) -> RestResult<Response> {
        self.call("/boards/", Method::Post, RequestSpec::new().query("name", name))
            .await
    }

    /// Get a board by ID
    pub async fn get_board(&self, id: &str) -> RestResult<Response> {
        self.call(&format!("/boards/{}", id), Method::Get, RequestSpec::new())
            .await
    }

    /// Update board fields
    pub async fn update_board(&self, id: &str, fields: Value) -> RestResult<Response> {
        self.call(&format!("/boards/{}", id), Method::Put, RequestSpec::new().json(fields))
            .await
    }

    /// Delete a board
    pub async fn delete_board(&self, id: &str) -> RestResult<Response> {
        self.call(&format!("/boards/{}", id), Method::Delete, RequestSpec::new())
            .await
    }

    // List operations

    /// Create a list on a board
    pub async fn create_list(&self, board_id: &str, name: &str) -> RestResult<Response> {
        let spec = RequestSpec::new().query("idBoard", board_id).query("name", name);
        self.call("/lists", Method::Post, spec).await
    }

    /// Archive a list
    pub async fn archive_list(&self, list_id: &str) -> RestResult<Response> {
        let spec = RequestSpec::new().query("value", "true");
        self.call(&format!("/lists/{}/closed", list_id), Method::Put, spec)
            .await
    }

    // Card operations

    /// Create a card in a list
    pub async fn create_card(
        &self,
        list_id: &str,
        name: &str,
        desc: Option<&str>,
    ) -> RestResult<Response> {
        let mut spec = RequestSpec::new().query("idList", list_id).query("name", name);
        if let Some(desc) = desc {
            spec = spec.query("desc", desc);
        }
        self.call("/cards", Method::Post, spec).await
    }

    /// Replace a card's description
    pub async fn update_card_description(&self, card_id: &str, desc: &str) -> RestResult<Response> {
        let spec = RequestSpec::new().json(serde_json::json!({ "desc": desc }));
        self.call(&format!("/cards/{}", card_id), Method::Put, spec)
            .await
    }

    /// Delete a card
    pub async fn delete_card(&self, card_id: &str) -> RestResult<Response> {
        self.call(&format!("/cards/{}", card_id), Method::Delete, RequestSpec::new())
            .await
    }

    // Checklist operations

    /// Add a checklist to a card
    pub async fn create_checklist(&self, card_id: &str, name: &str) -> RestResult<Response> {
        let spec = RequestSpec::new().query("idCard", card_id).query("name", name);
        self.call("/checklists", Method::Post, spec).await
    }
}
