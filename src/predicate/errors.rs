use thiserror::Error;

use crate::table_catalog::TableCatalogError;

/// Compile-time failures. None of these ever reach the network.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredicateError {
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Unknown column `{path}` on entity `{entity}`")]
    UnknownColumn { entity: String, path: String },
    #[error("Unknown relation `{relation}` on entity `{entity}`")]
    UnknownRelation { entity: String, relation: String },
    #[error("No table metadata registered for entity `{0}`")]
    UnknownEntity(String),
}

impl From<TableCatalogError> for PredicateError {
    fn from(err: TableCatalogError) -> Self {
        match err {
            TableCatalogError::UnknownColumn { entity, path } => {
                PredicateError::UnknownColumn { entity, path }
            }
            TableCatalogError::UnknownRelation { entity, relation } => {
                PredicateError::UnknownRelation { entity, relation }
            }
            TableCatalogError::UnknownEntity { entity } => PredicateError::UnknownEntity(entity),
            other => PredicateError::UnsupportedExpression(other.to_string()),
        }
    }
}
