//! # Table Catalog Error Types
//!
//! Errors raised while loading a catalog definition or resolving logical
//! names (entities, properties, relations) against it.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableCatalogError {
    #[error("No table metadata registered for entity `{entity}`")]
    UnknownEntity { entity: String },
    #[error("Unknown column `{path}` on entity `{entity}`")]
    UnknownColumn { entity: String, path: String },
    #[error("Unknown relation `{relation}` on entity `{entity}`")]
    UnknownRelation { entity: String, relation: String },
    #[error("Failed to read catalog file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse catalog: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid catalog: {message}")]
    InvalidConfig { message: String },
}

impl TableCatalogError {
    /// Create an InvalidConfig error naming the table it was found in
    pub fn invalid_with_context(message: impl Into<String>, entity: impl Into<String>) -> Self {
        TableCatalogError::InvalidConfig {
            message: format!("{}\n  Context: table for entity `{}`", message.into(), entity.into()),
        }
    }
}
