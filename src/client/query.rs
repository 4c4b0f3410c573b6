//! Lazily executed, immutable query builder.
//!
//! Every chained call returns a new [`Query`] that shares the operation log
//! of its receiver, so a partially built query can be branched and reused
//! across tasks without locks:
//!
//! ```ignore
//! let cheap = client.table::<Cost>().filter(col("UnitCost").lt(10));
//! let first_page = cheap.clone().take(20);
//! let second_page = cheap.skip(20).take(20);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::errors::ClientError;
use super::OrmClient;
use crate::predicate::{Expr, PredicateCompiler};
use crate::query_ast::{OrderDirection, RequestAst, WhereCondition};

#[derive(Debug, Clone)]
enum Op {
    Where(Expr),
    OrderBy(Expr, OrderDirection),
    Skip(u32),
    Take(u32),
    Include(String),
}

#[derive(Debug)]
struct OpNode {
    op: Op,
    prev: OpLog,
}

/// Persistent cons-list of operations, newest first.
#[derive(Debug, Clone, Default)]
struct OpLog(Option<Arc<OpNode>>);

impl OpLog {
    fn push(&self, op: Op) -> OpLog {
        OpLog(Some(Arc::new(OpNode {
            op,
            prev: self.clone(),
        })))
    }

    /// Operations in call order.
    fn in_order(&self) -> Vec<&Op> {
        let mut ops = Vec::new();
        let mut node = self.0.as_deref();
        while let Some(n) = node {
            ops.push(&n.op);
            node = n.prev.0.as_deref();
        }
        ops.reverse();
        ops
    }
}

pub struct Query<T> {
    client: OrmClient,
    entity: String,
    ops: OpLog,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Query {
            client: self.client.clone(),
            entity: self.entity.clone(),
            ops: self.ops.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("entity", &self.entity)
            .field("ops", &self.ops.in_order())
            .finish()
    }
}

impl<T> Query<T> {
    pub(crate) fn new(client: OrmClient, entity: impl Into<String>) -> Self {
        Query {
            client,
            entity: entity.into(),
            ops: OpLog::default(),
            _record: PhantomData,
        }
    }

    fn push(&self, op: Op) -> Self {
        Query {
            client: self.client.clone(),
            entity: self.entity.clone(),
            ops: self.ops.push(op),
            _record: PhantomData,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Add a filter. Repeated filters combine with `And`, left to right.
    pub fn filter(&self, predicate: Expr) -> Self {
        self.push(Op::Where(predicate))
    }

    /// Order ascending. Only the last ordering call takes effect.
    ///
    /// Keys other than a direct column of this entity are ignored: the
    /// previously captured column stays, but this call's direction applies.
    pub fn order_by(&self, key: Expr) -> Self {
        self.push(Op::OrderBy(key, OrderDirection::Ascending))
    }

    pub fn order_by_descending(&self, key: Expr) -> Self {
        self.push(Op::OrderBy(key, OrderDirection::Descending))
    }

    pub fn skip(&self, n: u32) -> Self {
        self.push(Op::Skip(n))
    }

    pub fn take(&self, n: u32) -> Self {
        self.push(Op::Take(n))
    }

    /// Eager-load a relation by name, e.g. `"Prod"` on `Cost`.
    pub fn include(&self, relation: impl Into<String>) -> Self {
        self.push(Op::Include(relation.into()))
    }

    /// Compile the operation log into a request, without any network call.
    pub fn to_request(&self) -> Result<RequestAst, ClientError> {
        let compiler = PredicateCompiler::new(self.client.catalog(), &self.entity)?;
        let mut ast = RequestAst::default();

        for op in self.ops.in_order() {
            match op {
                Op::Where(predicate) => {
                    let condition = compiler.compile(predicate)?;
                    ast.condition = Some(match ast.condition.take() {
                        Some(previous) => WhereCondition::and(previous, condition),
                        None => condition,
                    });
                }
                Op::OrderBy(key, direction) => {
                    if let Some(field) = compiler.order_field(key)? {
                        ast.order_by_field = field;
                    }
                    ast.order_direction = *direction;
                }
                Op::Skip(n) => ast.limit.skip = *n,
                Op::Take(n) => ast.limit.take = *n,
                Op::Include(relation) => {
                    ast.add_include(compiler.include_relation(relation)?);
                }
            }
        }
        Ok(ast)
    }

    /// SQL the server would run for this query.
    pub async fn to_sql(&self) -> Result<String, ClientError> {
        let ast = self.to_request()?;
        self.client.sql_preview(&self.entity, &ast).await
    }
}

impl<T: DeserializeOwned> Query<T> {
    /// Run the query: one round trip, fully buffered.
    pub async fn fetch(&self) -> Result<Vec<T>, ClientError> {
        self.fetch_with_cancel(&CancellationToken::new()).await
    }

    /// Like [`Query::fetch`], aborting when `cancel` fires.
    pub async fn fetch_with_cancel(&self, cancel: &CancellationToken) -> Result<Vec<T>, ClientError> {
        let ast = self.to_request()?;
        let objects = self.client.select(&self.entity, &ast, cancel).await?;
        objects
            .iter()
            .map(|object| {
                serde_json::from_str(object).map_err(|e| {
                    ClientError::DecodeError(format!("{} record: {}", self.entity, e))
                })
            })
            .collect()
    }

    /// First record; `EmptyResult` when there is none.
    pub async fn first(&self) -> Result<T, ClientError> {
        self.fetch()
            .await?
            .into_iter()
            .next()
            .ok_or(ClientError::EmptyResult)
    }

    /// First record, or `default` when there is none.
    pub async fn first_or(&self, default: T) -> Result<T, ClientError> {
        Ok(self.fetch().await?.into_iter().next().unwrap_or(default))
    }
}

impl<T: DeserializeOwned + Default> Query<T> {
    pub async fn first_or_default(&self) -> Result<T, ClientError> {
        self.first_or(T::default()).await
    }
}
