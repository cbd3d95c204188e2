use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tasklist_core::TaskId;
use tracing::{debug, info};

use super::{RemoteRow, RemoteStore};
use crate::error::RemoteError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default table name.
pub const DEFAULT_TABLE: &str = "todos";

const READ_ORDER: &str = "sort_order.asc.nullslast,id.asc";
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for a PostgREST-style table endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Project base URL (the `/rest/v1/<table>` path is appended).
    pub base_url: String,
    /// API key sent as `apikey` and bearer token.
    pub api_key: String,
    /// Table name.
    pub table: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl RestConfig {
    /// Settings with the default table and timeout.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), self.table)
    }
}

/// Remote table reached over HTTP.
#[derive(Debug, Clone)]
pub struct RestRemote {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RestRemote {
    /// Build a client for `config`.
    ///
    /// # Errors
    /// Returns an error when the configuration is incomplete or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &RestConfig) -> Result<Self, RemoteError> {
        if config.base_url.trim().is_empty() {
            return Err(RemoteError::Config("base url must not be empty".into()));
        }
        if config.api_key.trim().is_empty() {
            return Err(RemoteError::Config("api key must not be empty".into()));
        }
        if config.table.trim().is_empty() {
            return Err(RemoteError::Config("table must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = config.endpoint();
        info!(%endpoint, "remote table configured");

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn delete_where(&self, operation: &'static str, id_filter: String) -> Result<(), RemoteError> {
        let request = self
            .authorized(self.client.delete(&self.endpoint))
            .query(&[("id", id_filter)]);
        check(operation, request.send().await?).await?;
        Ok(())
    }
}

async fn check(operation: &'static str, response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        debug!(operation, status = status.as_u16(), "remote request succeeded");
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|idx| body.is_char_boundary(*idx))
            .unwrap_or(0);
        body.truncate(cut);
    }
    Err(RemoteError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

fn id_list(ids: &[TaskId]) -> String {
    let joined = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("not.in.({joined})")
}

impl RemoteStore for RestRemote {
    async fn fetch_all(&self) -> Result<Value, RemoteError> {
        let request = self
            .authorized(self.client.get(&self.endpoint))
            .query(&[("select", "*"), ("order", READ_ORDER)]);
        let response = check("fetch", request.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn upsert(&self, rows: &[RemoteRow]) -> Result<(), RemoteError> {
        let request = self
            .authorized(self.client.post(&self.endpoint))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        check("upsert", request.send().await?).await?;
        Ok(())
    }

    async fn delete_except(&self, keep: &[TaskId]) -> Result<(), RemoteError> {
        if keep.is_empty() {
            // `not.in.()` is ambiguous across backends; callers use delete_all.
            return Err(RemoteError::Config("delete_except requires at least one id".into()));
        }
        self.delete_where("delete_except", id_list(keep)).await
    }

    async fn delete_all(&self) -> Result<(), RemoteError> {
        self.delete_where("delete_all", "not.is.null".to_owned()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url_and_table() {
        let mut config = RestConfig::new("https://example.test/", "key");
        config.table = "items".into();
        assert_eq!(config.endpoint(), "https://example.test/rest/v1/items");
    }

    #[test]
    fn id_list_uses_not_in_syntax() {
        assert_eq!(id_list(&[TaskId(1), TaskId(22)]), "not.in.(1,22)");
    }

    #[test]
    fn rejects_incomplete_configuration() {
        let missing_key = RestConfig::new("https://example.test", " ");
        assert!(matches!(RestRemote::new(&missing_key), Err(RemoteError::Config(_))));

        let missing_url = RestConfig::new("", "key");
        assert!(matches!(RestRemote::new(&missing_url), Err(RemoteError::Config(_))));
    }
}
