//! Typed query client.
//!
//! [`OrmClient`] hands out lazy [`Query`] builders. Building never touches
//! the network; `fetch`, `first` and friends compile the accumulated
//! operations against the local table catalog, encode the request and make
//! exactly one successful round trip.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::config::ClientConfig;
use crate::entities::Entity;
use crate::query_ast::{encode, RequestAst};
use crate::server::SelectRequest;
use crate::table_catalog::{self, TableCatalog};

pub mod errors;
pub mod query;
pub mod transport;

pub use errors::ClientError;
pub use query::Query;
pub use transport::{HttpTransport, Transport};

const RETRY_BACKOFF_MS: u64 = 50;

struct ClientInner {
    transport: Arc<dyn Transport>,
    catalog: Arc<TableCatalog>,
    config: ClientConfig,
}

/// Cheap to clone; clones share the transport and catalog.
#[derive(Clone)]
pub struct OrmClient {
    inner: Arc<ClientInner>,
}

impl OrmClient {
    /// HTTP client against `config.base_url`, using the embedded sales
    /// history catalog. Fails on a config that does not validate.
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        let catalog = table_catalog::sales_history()
            .map_err(|e| ClientError::DecodeError(format!("embedded catalog: {}", e)))?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport), Arc::new(catalog)))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        catalog: Arc<TableCatalog>,
    ) -> Self {
        OrmClient {
            inner: Arc::new(ClientInner {
                transport,
                catalog,
                config,
            }),
        }
    }

    pub fn catalog(&self) -> &TableCatalog {
        &self.inner.catalog
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn table<T: Entity>(&self) -> Query<T> {
        Query::new(self.clone(), T::NAME)
    }

    /// Untyped query; records come back as JSON objects.
    pub fn table_named(&self, entity: &str) -> Query<serde_json::Value> {
        Query::new(self.clone(), entity)
    }

    fn request_for(&self, ast: &RequestAst) -> Result<SelectRequest, ClientError> {
        Ok(SelectRequest {
            request: encode(ast)?,
            timeout_ms: Some(self.inner.config.request_timeout_ms),
        })
    }

    pub(crate) async fn select(
        &self,
        entity: &str,
        ast: &RequestAst,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, ClientError> {
        let request = self.request_for(ast)?;
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ClientError::Cancelled(format!("{} query cancelled by caller", entity)));
            }
            reply = self.with_retries(entity, || self.inner.transport.select(entity, request.clone())) => reply?,
        };

        if reply.is_error() {
            return Err(ClientError::from_reply(
                entity,
                &reply.error_kind,
                reply.error_message,
            ));
        }
        log::debug!("{} query returned {} objects", entity, reply.objects.len());
        Ok(reply.objects)
    }

    pub(crate) async fn sql_preview(&self, entity: &str, ast: &RequestAst) -> Result<String, ClientError> {
        let request = self.request_for(ast)?;
        let reply = self
            .with_retries(entity, || {
                self.inner.transport.sql_preview(entity, request.clone())
            })
            .await?;
        if !reply.error_message.is_empty() {
            return Err(ClientError::from_reply(
                entity,
                &reply.error_kind,
                reply.error_message,
            ));
        }
        Ok(reply.sql)
    }

    /// Run `attempt`, retrying transport failures up to the configured
    /// bound. Other errors return immediately.
    async fn with_retries<R, F, Fut>(&self, entity: &str, mut attempt: F) -> Result<R, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<R, ClientError>>,
    {
        let retries = self.inner.config.transport_retries;
        let mut tries: u32 = 0;
        loop {
            match attempt().await {
                Err(e) if e.is_retryable() && tries < retries => {
                    tries += 1;
                    log::warn!(
                        "{} round trip failed ({}), retry {}/{}",
                        entity,
                        e,
                        tries,
                        retries
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * tries as u64)).await;
                }
                result => return result,
            }
        }
    }
}
