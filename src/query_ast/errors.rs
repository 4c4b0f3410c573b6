use thiserror::Error;

use super::WhereOperator;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryAstError {
    #[error("Malformed request payload: {0}")]
    Decode(String),
    #[error("Failed to encode request: {0}")]
    Encode(String),
    #[error("Malformed {operator:?} node: {reason}")]
    MalformedNode {
        operator: WhereOperator,
        reason: String,
    },
}
