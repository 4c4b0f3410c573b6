//! Round trips to a query server.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::errors::ClientError;
use crate::config::ClientConfig;
use crate::server::{SelectReply, SelectRequest, SqlPreviewReply};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn select(&self, entity: &str, request: SelectRequest) -> Result<SelectReply, ClientError>;

    async fn sql_preview(
        &self,
        entity: &str,
        request: SelectRequest,
    ) -> Result<SqlPreviewReply, ClientError>;
}

/// JSON over HTTP against the server's `/select` and `/sql` routes.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ClientError::TransportError(e.to_string()))?;
        Ok(HttpTransport {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<R: serde::de::DeserializeOwned>(
        &self,
        route: &str,
        entity: &str,
        request: &SelectRequest,
    ) -> Result<R, ClientError> {
        let url = format!("{}/{}/{}", self.base_url, route, entity);
        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} returned {}: {}", url, status, body);
            // 4xx means the request itself is at fault; only 5xx may clear up.
            return Err(if status.is_client_error() {
                ClientError::RequestRejected(message)
            } else {
                ClientError::TransportError(message)
            });
        }
        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn select(&self, entity: &str, request: SelectRequest) -> Result<SelectReply, ClientError> {
        self.post("select", entity, &request).await
    }

    async fn sql_preview(
        &self,
        entity: &str,
        request: SelectRequest,
    ) -> Result<SqlPreviewReply, ClientError> {
        self.post("sql", entity, &request).await
    }
}
