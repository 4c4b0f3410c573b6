use thiserror::Error;

use crate::query_ast::QueryAstError;
use crate::table_catalog::TableCatalogError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlGeneratorError {
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Unknown column `{path}` on entity `{entity}`")]
    UnknownColumn { entity: String, path: String },
    #[error("Unknown relation `{relation}` on entity `{entity}`")]
    UnknownRelation { entity: String, relation: String },
    #[error("No table metadata registered for entity `{0}`")]
    UnknownEntity(String),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

impl From<TableCatalogError> for SqlGeneratorError {
    fn from(err: TableCatalogError) -> Self {
        match err {
            TableCatalogError::UnknownColumn { entity, path } => {
                SqlGeneratorError::UnknownColumn { entity, path }
            }
            TableCatalogError::UnknownRelation { entity, relation } => {
                SqlGeneratorError::UnknownRelation { entity, relation }
            }
            TableCatalogError::UnknownEntity { entity } => SqlGeneratorError::UnknownEntity(entity),
            other => SqlGeneratorError::MalformedRequest(other.to_string()),
        }
    }
}

impl From<QueryAstError> for SqlGeneratorError {
    fn from(err: QueryAstError) -> Self {
        SqlGeneratorError::MalformedRequest(err.to_string())
    }
}
