//! Row stores the select path can run statements against.
//!
//! A [`Store`] hands back a forward-only [`RowCursor`]; rows are pulled one
//! at a time and dropping the cursor abandons the rest of the result.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clickhouse::Client;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::materializer::Row;
use crate::sql_generator::SqlDialect;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Store query failed: {0}")]
    Query(String),
    #[error("Store returned a malformed row: {0}")]
    MalformedRow(String),
}

#[async_trait]
pub trait RowCursor: Send {
    /// Next row, or `None` once the result is exhausted.
    async fn next_row(&mut self) -> Result<Option<Row>, StoreError>;
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>, StoreError>;

    /// Dialect statements for this store are compiled in.
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Standard
    }
}

/// Cursor over newline-delimited JSON objects (`JSONEachRow`).
pub struct JsonLinesCursor<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> JsonLinesCursor<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesCursor {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> RowCursor for JsonLinesCursor<R> {
    async fn next_row(&mut self) -> Result<Option<Row>, StoreError> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let Some(line) = line else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str::<Row>(&line)
                .map(Some)
                .map_err(|e| StoreError::MalformedRow(e.to_string()));
        }
    }
}

/// ClickHouse over HTTP, reading results as `JSONEachRow`.
#[derive(Clone)]
pub struct ClickHouseStore {
    client: Client,
}

impl ClickHouseStore {
    pub fn new(client: Client) -> Self {
        ClickHouseStore { client }
    }
}

#[async_trait]
impl Store for ClickHouseStore {
    async fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>, StoreError> {
        let bytes = self
            .client
            .query(sql)
            .fetch_bytes("JSONEachRow")
            .map_err(|e| {
                log::error!("ClickHouse query failed. SQL was:\n{}\nError: {}", sql, e);
                StoreError::Query(e.to_string())
            })?;
        Ok(Box::new(JsonLinesCursor::new(bytes)))
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::ClickHouse
    }
}

/// Store serving a fixed row set, for tests and for running without a
/// database. Records every statement it is asked to run.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Vec<Row>,
    fail_after: Option<(usize, String)>,
    row_delay: Option<Duration>,
    dialect: SqlDialect,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    pub fn new(rows: Vec<Row>) -> Self {
        MemoryStore {
            rows,
            ..Default::default()
        }
    }

    /// Fail with `message` after yielding `rows` rows.
    pub fn failing_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((rows, message.into()));
        self
    }

    /// Wait this long before yielding each row.
    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }

    /// Compile statements as if talking to a store of `dialect`.
    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|sql| sql.clone())
            .unwrap_or_default()
    }
}

struct MemoryCursor {
    rows: std::vec::IntoIter<Row>,
    yielded: usize,
    fail_after: Option<(usize, String)>,
    row_delay: Option<Duration>,
}

#[async_trait]
impl RowCursor for MemoryCursor {
    async fn next_row(&mut self) -> Result<Option<Row>, StoreError> {
        if let Some((limit, message)) = &self.fail_after {
            if self.yielded >= *limit {
                return Err(StoreError::Query(message.clone()));
            }
        }
        if let Some(delay) = self.row_delay {
            tokio::time::sleep(delay).await;
        }
        let row = self.rows.next();
        if row.is_some() {
            self.yielded += 1;
        }
        Ok(row)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>, StoreError> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
        Ok(Box::new(MemoryCursor {
            rows: self.rows.clone().into_iter(),
            yielded: 0,
            fail_after: self.fail_after.clone(),
            row_delay: self.row_delay,
        }))
    }

    fn dialect(&self) -> SqlDialect {
        self.dialect
    }
}
