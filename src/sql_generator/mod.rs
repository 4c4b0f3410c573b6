//! # SQL Generator
//!
//! Lowers a [`RequestAst`] against one entity's [`TableMetadata`] into a
//! single `SELECT` statement:
//!
//! ```text
//! SELECT t0.PROD_ID AS t0_PROD_ID, ...
//! FROM SH.COSTS t0
//! LEFT JOIN SH.PRODUCTS t1 ON t1.PROD_ID = t0.PROD_ID
//! WHERE t0.PROD_ID = 0 AND t0.UNIT_COST > 10
//! ORDER BY t0.CHANNEL_ID
//! OFFSET 5 ROWS
//! FETCH NEXT 10 ROWS ONLY
//! ```
//!
//! Every projected column is labeled `<alias>_<COLUMN>` so labels stay
//! unique across joined tables that share physical column names.
//!
//! Pagination is spelled per [`SqlDialect`]; ClickHouse gets `LIMIT`.

use crate::query_ast::{Limit, OrderDirection, RequestAst};
use crate::table_catalog::{TableCatalog, TableMetadata};

mod errors;
mod to_sql;

pub use errors::SqlGeneratorError;
pub use to_sql::validate_literal;

pub const BASE_ALIAS: &str = "t0";

/// Label of a projected column in the result row.
pub fn column_label(alias: &str, column: &str) -> String {
    format!("{}_{}", alias, column)
}

/// How a store spells pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SqlDialect {
    /// `OFFSET n ROWS` and `FETCH NEXT n ROWS ONLY`.
    #[default]
    Standard,
    /// `LIMIT n [OFFSET m]`. ClickHouse rejects FETCH without ORDER BY.
    ClickHouse,
}

impl SqlDialect {
    fn pagination(self, limit: &Limit) -> Vec<String> {
        let mut parts = Vec::new();
        match self {
            SqlDialect::Standard => {
                if limit.skip > 0 {
                    parts.push(format!("OFFSET {} ROWS", limit.skip));
                }
                if limit.take > 0 {
                    parts.push(format!("FETCH NEXT {} ROWS ONLY", limit.take));
                }
            }
            SqlDialect::ClickHouse => match (limit.skip, limit.take) {
                (0, 0) => {}
                (0, take) => parts.push(format!("LIMIT {}", take)),
                (skip, 0) => parts.push(format!("OFFSET {}", skip)),
                (skip, take) => parts.push(format!("LIMIT {} OFFSET {}", take, skip)),
            },
        }
        parts
    }
}

/// A relation joined into the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRelation {
    pub relation: String,
    pub target_entity: String,
    pub alias: String,
    /// Physical column on the base table.
    pub local_column: String,
    /// Physical column on the joined table.
    pub foreign_column: String,
    /// Included relations are projected; relations only referenced from
    /// the filter are joined for filtering alone.
    pub projected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSelect {
    pub entity: String,
    pub sql: String,
    pub joins: Vec<JoinedRelation>,
}

impl CompiledSelect {
    pub fn projected_joins(&self) -> impl Iterator<Item = &JoinedRelation> {
        self.joins.iter().filter(|j| j.projected)
    }
}

/// Aliases in use by one statement.
pub struct JoinScope<'a> {
    catalog: &'a TableCatalog,
    base: &'a TableMetadata,
    joins: Vec<JoinedRelation>,
}

impl<'a> JoinScope<'a> {
    fn new(catalog: &'a TableCatalog, base: &'a TableMetadata) -> Self {
        JoinScope {
            catalog,
            base,
            joins: Vec::new(),
        }
    }

    fn join(&mut self, relation_name: &str, projected: bool) -> Result<(), SqlGeneratorError> {
        if let Some(existing) = self.joins.iter_mut().find(|j| j.relation == relation_name) {
            existing.projected |= projected;
            return Ok(());
        }
        let relation = self.catalog.relation(&self.base.entity, relation_name)?;
        let target = self.catalog.table(&relation.target_entity)?;
        self.joins.push(JoinedRelation {
            relation: relation.name.clone(),
            target_entity: target.entity.clone(),
            alias: format!("t{}", self.joins.len() + 1),
            local_column: self.base.physical_column(&relation.local_property)?.to_string(),
            foreign_column: target.physical_column(&relation.foreign_property)?.to_string(),
            projected,
        });
        Ok(())
    }

    /// `<alias>.<COLUMN>` for a property path.
    pub fn column_ref(&self, path: &str) -> Result<String, SqlGeneratorError> {
        let resolved = self.catalog.resolve_path(&self.base.entity, path)?;
        let alias = match resolved.relation {
            None => BASE_ALIAS,
            Some(relation) => self
                .joins
                .iter()
                .find(|j| j.relation == relation.name)
                .map(|j| j.alias.as_str())
                .ok_or_else(|| {
                    SqlGeneratorError::MalformedRequest(format!(
                        "relation `{}` referenced by `{}` is not joined",
                        relation.name, path
                    ))
                })?,
        };
        Ok(format!("{}.{}", alias, resolved.column.column))
    }

    fn projection(&self) -> Result<String, SqlGeneratorError> {
        let mut fields = projected_columns(BASE_ALIAS, self.base);
        for join in self.joins.iter().filter(|j| j.projected) {
            let target = self.catalog.table(&join.target_entity)?;
            fields.extend(projected_columns(&join.alias, target));
        }
        Ok(fields.join(", "))
    }

    fn join_clauses(&self) -> Result<Vec<String>, SqlGeneratorError> {
        self.joins
            .iter()
            .map(|join| {
                let target = self.catalog.table(&join.target_entity)?;
                Ok(format!(
                    "LEFT JOIN {} {} ON {}.{} = {}.{}",
                    target.qualified_name(),
                    join.alias,
                    join.alias,
                    join.foreign_column,
                    BASE_ALIAS,
                    join.local_column
                ))
            })
            .collect()
    }
}

fn projected_columns(alias: &str, table: &TableMetadata) -> Vec<String> {
    table
        .columns()
        .iter()
        .map(|c| format!("{}.{} AS {}", alias, c.column, column_label(alias, &c.column)))
        .collect()
}

/// Relation named by the first segment of a navigation path, if the base
/// table has one by that name. Unknown names are left for path resolution to
/// report as unknown columns.
fn navigated_relation<'a>(base: &TableMetadata, path: &'a str) -> Option<&'a str> {
    let (relation, _) = path.split_once('.')?;
    base.relation(relation).map(|_| relation)
}

/// Compile `ast` into SQL against `entity`.
pub fn compile_select(
    catalog: &TableCatalog,
    entity: &str,
    ast: &RequestAst,
) -> Result<CompiledSelect, SqlGeneratorError> {
    compile_select_for(catalog, entity, ast, SqlDialect::Standard)
}

pub fn compile_select_for(
    catalog: &TableCatalog,
    entity: &str,
    ast: &RequestAst,
    dialect: SqlDialect,
) -> Result<CompiledSelect, SqlGeneratorError> {
    let base = catalog.table(entity)?;
    let mut scope = JoinScope::new(catalog, base);

    // Included relations take the first aliases, in include order.
    for relation in &ast.include {
        scope.join(relation, true)?;
    }
    if let Some(condition) = &ast.condition {
        condition.validate_shape()?;
        for path in condition.parameter_paths() {
            if let Some(relation) = navigated_relation(base, path) {
                scope.join(relation, false)?;
            }
        }
    }
    if let Some(relation) = navigated_relation(base, &ast.order_by_field) {
        scope.join(relation, false)?;
    }

    let mut parts = vec![
        format!("SELECT {}", scope.projection()?),
        format!("FROM {} {}", base.qualified_name(), BASE_ALIAS),
    ];
    parts.extend(scope.join_clauses()?);

    if let Some(condition) = &ast.condition {
        parts.push(format!("WHERE {}", to_sql::condition_to_sql(condition, &scope)?));
    }
    if ast.has_order() {
        let mut order_by = format!("ORDER BY {}", scope.column_ref(&ast.order_by_field)?);
        if ast.order_direction == OrderDirection::Descending {
            order_by.push_str(" DESC");
        }
        parts.push(order_by);
    }
    parts.extend(dialect.pagination(&ast.limit));

    let sql = parts.join("\n");
    log::debug!("Generated SQL for {}:\n{}", entity, sql);

    Ok(CompiledSelect {
        entity: base.entity.clone(),
        sql,
        joins: scope.joins,
    })
}
