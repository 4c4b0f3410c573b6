use lazy_static::lazy_static;
use regex::Regex;

use super::errors::SqlGeneratorError;
use super::JoinScope;
use crate::query_ast::{WhereCondition, WhereOperator};

lazy_static! {
    static ref NULL_LITERAL: Regex = Regex::new(r"(?i)^null$").unwrap();
    static ref NUMBER_LITERAL: Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
    static ref INTEGER_LIST_LITERAL: Regex = Regex::new(r"^-?\d+(, ?-?\d+)*$").unwrap();
    static ref STRING_LITERAL: Regex = Regex::new(r"^'(?:[^'\\]|\\.)*'$").unwrap();
}

/// Check that a Value leaf is literal text the client renderer could have
/// produced. Anything else is refused before it reaches the statement.
pub fn validate_literal(text: &str) -> Result<&str, SqlGeneratorError> {
    let text_ok = NULL_LITERAL.is_match(text)
        || NUMBER_LITERAL.is_match(text)
        || INTEGER_LIST_LITERAL.is_match(text)
        || STRING_LITERAL.is_match(text);
    if text_ok {
        Ok(text)
    } else {
        Err(SqlGeneratorError::UnsupportedExpression(format!(
            "value `{}` is not a literal",
            text
        )))
    }
}

fn child<'a>(
    node: &'a WhereCondition,
    side: Option<&'a WhereCondition>,
) -> Result<&'a WhereCondition, SqlGeneratorError> {
    side.ok_or_else(|| {
        SqlGeneratorError::MalformedRequest(format!("{:?} node is missing an operand", node.operator))
    })
}

fn comparison_symbol(operator: WhereOperator) -> Option<&'static str> {
    match operator {
        WhereOperator::Equal => Some("="),
        WhereOperator::GreaterThan => Some(">"),
        WhereOperator::GreaterOrEqual => Some(">="),
        WhereOperator::LessThan => Some("<"),
        WhereOperator::LessOrEqual => Some("<="),
        _ => None,
    }
}

/// Render a node in boolean position.
///
/// `Or` and `Not` are parenthesized, `And` is not. Every `Or` carries its
/// own parentheses, so an unwrapped `And` never loses precedence to it.
pub fn condition_to_sql(node: &WhereCondition, scope: &JoinScope) -> Result<String, SqlGeneratorError> {
    match node.operator {
        WhereOperator::Not => {
            let operand = child(node, node.left.as_deref())?;
            Ok(format!("NOT ({})", condition_to_sql(operand, scope)?))
        }
        WhereOperator::Or => {
            let left = condition_to_sql(child(node, node.left.as_deref())?, scope)?;
            let right = condition_to_sql(child(node, node.right.as_deref())?, scope)?;
            Ok(format!("({} OR {})", left, right))
        }
        WhereOperator::And => {
            let left = condition_to_sql(child(node, node.left.as_deref())?, scope)?;
            let right = condition_to_sql(child(node, node.right.as_deref())?, scope)?;
            Ok(format!("{} AND {}", left, right))
        }
        WhereOperator::Contains => {
            let collection = child(node, node.left.as_deref())?;
            if collection.operator != WhereOperator::Value {
                return Err(SqlGeneratorError::UnsupportedExpression(
                    "membership collection must be a literal sequence".to_string(),
                ));
            }
            let item = operand_to_sql(child(node, node.right.as_deref())?, scope)?;
            Ok(format!("{} IN ({})", item, validate_literal(&collection.value)?))
        }
        operator => match comparison_symbol(operator) {
            Some(symbol) => {
                let left = operand_to_sql(child(node, node.left.as_deref())?, scope)?;
                let right = operand_to_sql(child(node, node.right.as_deref())?, scope)?;
                Ok(format!("{} {} {}", left, symbol, right))
            }
            None => Err(SqlGeneratorError::UnsupportedExpression(format!(
                "{:?} leaf used as a condition",
                operator
            ))),
        },
    }
}

/// Render a comparison operand: a column reference or a literal.
fn operand_to_sql(node: &WhereCondition, scope: &JoinScope) -> Result<String, SqlGeneratorError> {
    match node.operator {
        WhereOperator::Parameter => scope.column_ref(&node.value),
        WhereOperator::Value => validate_literal(&node.value).map(str::to_string),
        other => Err(SqlGeneratorError::UnsupportedExpression(format!(
            "{:?} expression used as a comparison operand",
            other
        ))),
    }
}
