//! Wire codec for [`RequestAst`].
//!
//! The payload is a self-describing JSON tree. Unknown fields are ignored and
//! omitted fields take their defaults (no condition, no ordering, ascending,
//! unbounded limit, no includes), so older and newer peers interoperate.
//! Byte layout is not a compatibility contract; `decode(encode(x)) == x` is.

use super::{QueryAstError, RequestAst};

pub fn encode(ast: &RequestAst) -> Result<String, QueryAstError> {
    serde_json::to_string(ast).map_err(|e| QueryAstError::Encode(e.to_string()))
}

/// Decode a payload and check the tree arity invariant.
pub fn decode(payload: &str) -> Result<RequestAst, QueryAstError> {
    let ast: RequestAst =
        serde_json::from_str(payload).map_err(|e| QueryAstError::Decode(e.to_string()))?;
    if let Some(condition) = &ast.condition {
        condition
            .validate_shape()
            .map_err(|e| QueryAstError::Decode(e.to_string()))?;
    }
    Ok(ast)
}
