//! HTTP client for the shared remote documents.
//!
//! The remote store is a plain document API: GET and PUT of whole JSON
//! documents at `{base}/attendanceApp/{doc}`. The client owns a small
//! current-thread runtime so callers stay synchronous.

use crate::sync::types::{SyncError, SyncTopic};

pub struct DocumentClient {
    base_url: String,
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl DocumentClient {
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            runtime,
        })
    }

    fn doc_url(&self, topic: SyncTopic) -> String {
        format!("{}/attendanceApp/{}", self.base_url, topic.doc_id())
    }

    /// Fetch one document. `Ok(None)` when the document does not exist yet.
    pub fn fetch(&self, topic: SyncTopic) -> Result<Option<serde_json::Value>, SyncError> {
        let url = self.doc_url(topic);
        let response = self
            .runtime
            .block_on(async { self.http.get(&url).send().await })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SyncError::RemoteStatus(response.status().as_u16()));
        }

        let value = self.runtime.block_on(async { response.json().await })?;
        Ok(Some(value))
    }

    /// Overwrite one document with the given JSON body.
    pub fn store(&self, topic: SyncTopic, body: &serde_json::Value) -> Result<(), SyncError> {
        let url = self.doc_url(topic);
        let response = self
            .runtime
            .block_on(async { self.http.put(&url).json(body).send().await })?;

        if !response.status().is_success() {
            return Err(SyncError::RemoteStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
