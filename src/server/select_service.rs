//! The select path: decode, compile, execute, materialize.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::materializer::{MaterializeError, RowMaterializer};
use crate::query_ast::{self, QueryAstError};
use crate::sql_generator::{compile_select_for, CompiledSelect, SqlGeneratorError};
use crate::table_catalog::TableCatalog;

use super::models::{error_kind, SelectReply, SelectRequest};
use super::store::{Store, StoreError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectError {
    #[error(transparent)]
    Decode(#[from] QueryAstError),
    #[error(transparent)]
    Compile(#[from] SqlGeneratorError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("store failed after {rows} rows: {source}")]
    StoreAfterRows { rows: usize, source: StoreError },
    #[error("query cancelled after {0} ms")]
    Cancelled(u128),
}

impl SelectError {
    pub fn kind(&self) -> &'static str {
        match self {
            SelectError::Decode(_) => error_kind::DECODE,
            SelectError::Compile(err) => match err {
                SqlGeneratorError::UnsupportedExpression(_) => error_kind::UNSUPPORTED_EXPRESSION,
                SqlGeneratorError::UnknownColumn { .. } => error_kind::UNKNOWN_COLUMN,
                SqlGeneratorError::UnknownRelation { .. } => error_kind::UNKNOWN_RELATION,
                SqlGeneratorError::UnknownEntity(_) => error_kind::UNKNOWN_ENTITY,
                SqlGeneratorError::MalformedRequest(_) => error_kind::DECODE,
            },
            SelectError::Materialize(_) | SelectError::Store(_) | SelectError::StoreAfterRows { .. } => {
                error_kind::STORE
            }
            SelectError::Cancelled(_) => error_kind::CANCELLED,
        }
    }
}

impl From<SelectError> for SelectReply {
    fn from(err: SelectError) -> Self {
        SelectReply::error(err.kind(), err.to_string())
    }
}

pub struct SelectService {
    store: Arc<dyn Store>,
    catalog: Arc<TableCatalog>,
    query_timeout: Duration,
}

impl SelectService {
    pub fn new(store: Arc<dyn Store>, catalog: Arc<TableCatalog>, query_timeout: Duration) -> Self {
        SelectService {
            store,
            catalog,
            query_timeout,
        }
    }

    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    /// Effective deadline: the tighter of the caller's and the server's.
    pub fn deadline(&self, requested_ms: Option<u64>) -> Duration {
        match requested_ms {
            Some(ms) if ms > 0 => self.query_timeout.min(Duration::from_millis(ms)),
            _ => self.query_timeout,
        }
    }

    /// Decode and compile, in the store's dialect, without executing.
    pub fn compile(&self, entity: &str, payload: &str) -> Result<CompiledSelect, SelectError> {
        let ast = query_ast::decode(payload)?;
        Ok(compile_select_for(&self.catalog, entity, &ast, self.store.dialect())?)
    }

    /// Run one select to completion, cancellation or deadline.
    ///
    /// Partial results are never returned: any failure discards rows
    /// already materialized.
    pub async fn select(
        &self,
        entity: &str,
        request: &SelectRequest,
        cancel: &CancellationToken,
    ) -> SelectReply {
        let started = Instant::now();
        let deadline = self.deadline(request.timeout_ms);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SelectError::Cancelled(started.elapsed().as_millis())),
            result = tokio::time::timeout(deadline, self.execute(entity, &request.request)) => {
                result.unwrap_or_else(|_| Err(SelectError::Cancelled(deadline.as_millis())))
            }
        };

        match outcome {
            Ok(objects) => {
                log::info!(
                    "Select on {} returned {} rows in {:.2}ms",
                    entity,
                    objects.len(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
                SelectReply::ok(objects)
            }
            Err(err) => {
                log::warn!("Select on {} failed ({}): {}", entity, err.kind(), err);
                err.into()
            }
        }
    }

    async fn execute(&self, entity: &str, payload: &str) -> Result<Vec<String>, SelectError> {
        let compile_start = Instant::now();
        let compiled = self.compile(entity, payload)?;
        let materializer = RowMaterializer::new(&self.catalog, &compiled)?;
        log::info!(
            "Compiled select on {} in {:.2}ms",
            entity,
            compile_start.elapsed().as_secs_f64() * 1000.0
        );
        log::debug!("Executing SQL:\n{}", compiled.sql);

        let mut cursor = self.store.query(&compiled.sql).await?;
        let mut objects = Vec::new();
        loop {
            let row = match cursor.next_row().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(source) => {
                    return Err(SelectError::StoreAfterRows {
                        rows: objects.len(),
                        source,
                    })
                }
            };
            let record = materializer.materialize(&row)?;
            objects.push(record.to_wire()?);
        }
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_ast::{encode, Limit, RequestAst, WhereCondition, WhereOperator};
    use crate::server::store::MemoryStore;
    use crate::sql_generator::SqlDialect;
    use crate::table_catalog::sales_history;
    use serde_json::{json, Value};

    fn channel_row(id: i32, desc: &str) -> crate::materializer::Row {
        match json!({
            "t0_CHANNEL_ID": id,
            "t0_CHANNEL_DESC": desc,
            "t0_CHANNEL_CLASS": "Direct",
            "t0_CHANNEL_CLASS_ID": 12,
            "t0_CHANNEL_TOTAL": "Channel total",
            "t0_CHANNEL_TOTAL_ID": 1
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn service(store: MemoryStore, timeout: Duration) -> SelectService {
        SelectService::new(Arc::new(store), Arc::new(sales_history().unwrap()), timeout)
    }

    fn request(ast: &RequestAst) -> SelectRequest {
        SelectRequest {
            request: encode(ast).unwrap(),
            timeout_ms: None,
        }
    }

    #[tokio::test]
    async fn test_select_materializes_rows() {
        let store = MemoryStore::new(vec![channel_row(3, "Direct Sales"), channel_row(9, "Tele Sales")]);
        let svc = service(store.clone(), Duration::from_secs(5));
        let ast = RequestAst {
            condition: Some(WhereCondition::binary(
                WhereCondition::parameter("ChannelId"),
                WhereOperator::GreaterThan,
                WhereCondition::value("2"),
            )),
            limit: Limit { skip: 0, take: 2 },
            ..Default::default()
        };
        let reply = svc.select("Channel", &request(&ast), &CancellationToken::new()).await;

        assert!(!reply.is_error(), "{}", reply.error_message);
        assert_eq!(reply.objects.len(), 2);
        let first: Value = serde_json::from_str(&reply.objects[0]).unwrap();
        assert_eq!(first["ChannelId"], json!(3));
        assert_eq!(first["ChannelDesc"], json!("Direct Sales"));

        let executed = store.executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].contains("WHERE t0.CHANNEL_ID > 2"));
    }

    #[tokio::test]
    async fn test_statements_follow_store_dialect() {
        let ast = RequestAst {
            limit: Limit { skip: 0, take: 5 },
            ..Default::default()
        };
        let clickhouse = MemoryStore::default().with_dialect(SqlDialect::ClickHouse);
        let svc = service(clickhouse.clone(), Duration::from_secs(5));
        let reply = svc.select("Channel", &request(&ast), &CancellationToken::new()).await;
        assert!(!reply.is_error(), "{}", reply.error_message);
        assert!(clickhouse.executed()[0].ends_with("\nLIMIT 5"));

        let standard = service(MemoryStore::default(), Duration::from_secs(5));
        let compiled = standard.compile("Channel", &encode(&ast).unwrap()).unwrap();
        assert!(compiled.sql.ends_with("\nFETCH NEXT 5 ROWS ONLY"));
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported_in_reply() {
        let svc = service(MemoryStore::default(), Duration::from_secs(5));
        let req = SelectRequest {
            request: "not json".to_string(),
            timeout_ms: None,
        };
        let reply = svc.select("Channel", &req, &CancellationToken::new()).await;
        assert_eq!(reply.error_kind, error_kind::DECODE);
        assert!(reply.objects.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_entity() {
        let svc = service(MemoryStore::default(), Duration::from_secs(5));
        let reply = svc
            .select("Widget", &request(&RequestAst::default()), &CancellationToken::new())
            .await;
        assert_eq!(reply.error_kind, error_kind::UNKNOWN_ENTITY);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_partial_rows() {
        let store = MemoryStore::new(vec![channel_row(1, "a"), channel_row(2, "b"), channel_row(3, "c")])
            .failing_after(2, "connection reset");
        let svc = service(store, Duration::from_secs(5));
        let reply = svc
            .select("Channel", &request(&RequestAst::default()), &CancellationToken::new())
            .await;
        assert!(reply.objects.is_empty());
        assert_eq!(reply.error_kind, error_kind::STORE);
        assert!(reply
            .error_message
            .starts_with("store failed after 2 rows: "));
        assert!(reply.error_message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_deadline_cancels_query() {
        let store = MemoryStore::new(vec![channel_row(1, "a")]).with_row_delay(Duration::from_secs(5));
        let svc = service(store, Duration::from_secs(30));
        let req = SelectRequest {
            request: encode(&RequestAst::default()).unwrap(),
            timeout_ms: Some(50),
        };
        let reply = svc.select("Channel", &req, &CancellationToken::new()).await;
        assert_eq!(reply.error_kind, error_kind::CANCELLED);
    }

    #[tokio::test]
    async fn test_cancel_token_stops_query() {
        let store = MemoryStore::new(vec![channel_row(1, "a")]).with_row_delay(Duration::from_secs(5));
        let svc = service(store, Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let reply = svc.select("Channel", &request(&RequestAst::default()), &cancel).await;
        assert_eq!(reply.error_kind, error_kind::CANCELLED);
    }

    #[test]
    fn test_deadline_is_the_tighter_bound() {
        let svc = service(MemoryStore::default(), Duration::from_millis(1000));
        assert_eq!(svc.deadline(None), Duration::from_millis(1000));
        assert_eq!(svc.deadline(Some(0)), Duration::from_millis(1000));
        assert_eq!(svc.deadline(Some(200)), Duration::from_millis(200));
        assert_eq!(svc.deadline(Some(5000)), Duration::from_millis(1000));
    }
}
