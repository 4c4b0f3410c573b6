use serde::{Deserialize, Serialize};

use crate::table_catalog::TableMetadata;

/// Body of `POST /select/{entity}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectRequest {
    /// Encoded request AST.
    pub request: String,
    /// Caller's deadline; the server never waits longer than its own limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Reply of the select RPC. Errors travel inside the reply, never as an
/// HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectReply {
    /// One serialized entity message per row.
    #[serde(default)]
    pub objects: Vec<String>,
    /// Empty on success.
    #[serde(default)]
    pub error_message: String,
    /// Machine-readable error class; empty on success. Older clients
    /// ignore it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_kind: String,
}

impl SelectReply {
    pub fn ok(objects: Vec<String>) -> Self {
        SelectReply {
            objects,
            ..Default::default()
        }
    }

    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        SelectReply {
            objects: Vec::new(),
            error_message: message.into(),
            error_kind: kind.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}

/// Values of [`SelectReply::error_kind`].
pub mod error_kind {
    pub const DECODE: &str = "decode";
    pub const UNSUPPORTED_EXPRESSION: &str = "unsupported_expression";
    pub const UNKNOWN_COLUMN: &str = "unknown_column";
    pub const UNKNOWN_RELATION: &str = "unknown_relation";
    pub const UNKNOWN_ENTITY: &str = "unknown_entity";
    pub const STORE: &str = "store";
    pub const CANCELLED: &str = "cancelled";
}

/// Reply of `POST /sql/{entity}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlPreviewReply {
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_kind: String,
}

/// Reply of `GET /tables`.
#[derive(Debug, Clone, Serialize)]
pub struct TablesResponse<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<&'a str>,
    pub tables: Vec<&'a TableMetadata>,
}
