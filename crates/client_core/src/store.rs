//! Access to the remote record collection.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{RecordId, SensorRecord},
    error::{ErrorCode, ErrorDetail},
    protocol::{ListResponse, UpdateResponse, UpdateSensorRecordInput},
};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

pub const DEFAULT_MODEL: &str = "sensor_data_new_tbl";

/// The two operations the dashboard needs from the backing store.
///
/// `Err` means the call itself failed (connection, status, decoding). A store
/// that answered but could not serve the request reports it through the
/// `errors` list of the envelope instead.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self) -> Result<ListResponse>;
    async fn update(&self, input: UpdateSensorRecordInput) -> Result<UpdateResponse>;
}

/// Store reached over HTTP at `{base}/models/{model}`.
pub struct HttpRecordStore {
    http: Client,
    base_url: Url,
    model: String,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        Self::with_client(Client::new(), base_url, model)
    }

    pub fn with_timeout(
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build store http client")?;
        Self::with_client(http, base_url, model)
    }

    pub fn with_client(http: Client, base_url: &str, model: impl Into<String>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid store url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("store url '{base_url}' cannot carry a path"));
        }
        Ok(Self {
            http,
            base_url,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, id: Option<&RecordId>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("store url '{}' cannot carry a path", self.base_url))?;
            segments.pop_if_empty().extend(["models", self.model.as_str()]);
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self) -> Result<ListResponse> {
        let url = self.endpoint(None)?;
        debug!(%url, "listing records");
        let response: ListResponse = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("list request to {url} failed"))?
            .error_for_status()?
            .json()
            .await
            .context("malformed list response")?;
        Ok(response)
    }

    async fn update(&self, input: UpdateSensorRecordInput) -> Result<UpdateResponse> {
        let url = self.endpoint(Some(&input.id))?;
        debug!(%url, id = %input.id, "updating record");
        let response: UpdateResponse = self
            .http
            .put(url.clone())
            .json(&input)
            .send()
            .await
            .with_context(|| format!("update request to {url} failed"))?
            .error_for_status()?
            .json()
            .await
            .context("malformed update response")?;
        Ok(response)
    }
}

/// In-process table with the same contract as the remote store.
#[derive(Default)]
pub struct MemoryRecordStore {
    rows: RwLock<Vec<SensorRecord>>,
}

impl MemoryRecordStore {
    pub fn new(rows: Vec<SensorRecord>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self) -> Result<ListResponse> {
        Ok(ListResponse::ok(self.rows.read().await.clone()))
    }

    async fn update(&self, input: UpdateSensorRecordInput) -> Result<UpdateResponse> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|row| row.id == input.id) else {
            return Ok(UpdateResponse::failed(vec![ErrorDetail::new(
                ErrorCode::NotFound,
                format!("record {} not found", input.id),
            )]));
        };
        input.apply_to(row);
        Ok(UpdateResponse::ok(row.clone()))
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
