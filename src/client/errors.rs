use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::predicate::PredicateError;
use crate::query_ast::QueryAstError;
use crate::server::error_kind;

lazy_static! {
    static ref QUOTED_NAME: Regex = Regex::new(r"`([^`]*)`").unwrap();
}

/// First backquoted name in a server message, or the whole message.
fn quoted_name(message: String) -> String {
    let name = QUOTED_NAME
        .captures(&message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    name.unwrap_or(message)
}

/// Everything a query can fail with, as seen by the caller.
///
/// `UnsupportedExpression`, `UnknownColumn` and `UnknownRelation` are raised
/// while compiling, before any network traffic.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Unknown column `{path}` on entity `{entity}`")]
    UnknownColumn { entity: String, path: String },
    #[error("Unknown relation `{relation}` on entity `{entity}`")]
    UnknownRelation { entity: String, relation: String },
    #[error("Unknown entity `{0}`")]
    UnknownEntity(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Query returned no rows")]
    EmptyResult,
    #[error("Transport error: {0}")]
    TransportError(String),
    /// The server refused the request outright (4xx); resending cannot help.
    #[error("Request rejected: {0}")]
    RequestRejected(String),
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Query cancelled: {0}")]
    Cancelled(String),
}

impl ClientError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::TransportError(_))
    }

    /// Convert an error carried in a server reply. Replies from servers
    /// that predate `error_kind` become `StoreError`.
    pub fn from_reply(entity: &str, kind: &str, message: String) -> Self {
        match kind {
            error_kind::DECODE => ClientError::DecodeError(message),
            error_kind::UNSUPPORTED_EXPRESSION => ClientError::UnsupportedExpression(message),
            error_kind::UNKNOWN_COLUMN => ClientError::UnknownColumn {
                entity: entity.to_string(),
                path: quoted_name(message),
            },
            error_kind::UNKNOWN_RELATION => ClientError::UnknownRelation {
                entity: entity.to_string(),
                relation: quoted_name(message),
            },
            error_kind::UNKNOWN_ENTITY => ClientError::UnknownEntity(quoted_name(message)),
            error_kind::CANCELLED => ClientError::Cancelled(message),
            _ => ClientError::StoreError(message),
        }
    }
}

impl From<PredicateError> for ClientError {
    fn from(err: PredicateError) -> Self {
        match err {
            PredicateError::UnsupportedExpression(message) => {
                ClientError::UnsupportedExpression(message)
            }
            PredicateError::UnknownColumn { entity, path } => {
                ClientError::UnknownColumn { entity, path }
            }
            PredicateError::UnknownRelation { entity, relation } => {
                ClientError::UnknownRelation { entity, relation }
            }
            PredicateError::UnknownEntity(entity) => ClientError::UnknownEntity(entity),
        }
    }
}

impl From<QueryAstError> for ClientError {
    fn from(err: QueryAstError) -> Self {
        ClientError::DecodeError(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::DecodeError(err.to_string())
        } else {
            ClientError::TransportError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_kinds_map_to_variants() {
        assert_eq!(
            ClientError::from_reply("Cost", "store", "disk full".to_string()),
            ClientError::StoreError("disk full".to_string())
        );
        assert_eq!(
            ClientError::from_reply("Cost", "", "boom".to_string()),
            ClientError::StoreError("boom".to_string())
        );
        assert!(matches!(
            ClientError::from_reply("Cost", "cancelled", "late".to_string()),
            ClientError::Cancelled(_)
        ));
        assert!(matches!(
            ClientError::from_reply("Cost", "decode", "bad".to_string()),
            ClientError::DecodeError(_)
        ));
    }

    #[test]
    fn test_reply_messages_are_not_wrapped_twice() {
        let err = ClientError::from_reply(
            "Cost",
            "unknown_column",
            "Unknown column `UnitCosts` on entity `Cost`".to_string(),
        );
        assert_eq!(
            err,
            ClientError::UnknownColumn {
                entity: "Cost".to_string(),
                path: "UnitCosts".to_string()
            }
        );
        assert_eq!(err.to_string(), "Unknown column `UnitCosts` on entity `Cost`");

        let err = ClientError::from_reply(
            "Cost",
            "unknown_relation",
            "Unknown relation `Cust` on entity `Cost`".to_string(),
        );
        assert_eq!(err.to_string(), "Unknown relation `Cust` on entity `Cost`");

        assert_eq!(
            ClientError::from_reply(
                "Widget",
                "unknown_entity",
                "No table metadata registered for entity `Widget`".to_string()
            ),
            ClientError::UnknownEntity("Widget".to_string())
        );
        assert_eq!(
            ClientError::from_reply("Cost", "unknown_column", "no detail".to_string()),
            ClientError::UnknownColumn {
                entity: "Cost".to_string(),
                path: "no detail".to_string()
            }
        );
    }

    #[test]
    fn test_only_transport_errors_retry() {
        assert!(ClientError::TransportError("reset".to_string()).is_retryable());
        assert!(!ClientError::RequestRejected("413".to_string()).is_retryable());
        assert!(!ClientError::StoreError("reset".to_string()).is_retryable());
        assert!(!ClientError::DecodeError("x".to_string()).is_retryable());
    }
}
