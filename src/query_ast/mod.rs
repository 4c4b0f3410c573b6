//! # Request AST
//!
//! The portable representation of a query: a comparison tree for the filter,
//! one ordering field, pagination, and the set of relations to eager-load.
//!
//! Values of these types are created per query, never mutated after the
//! builder finishes, and carry no references to client or server state, so
//! they can be shipped across the process boundary with [`codec`].

use serde::{Deserialize, Serialize};

pub mod codec;
mod errors;

pub use codec::{decode, encode};
pub use errors::QueryAstError;

/// Operator tag of a [`WhereCondition`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhereOperator {
    // leaves
    Parameter,
    Value,
    // unary
    Not,
    // binary
    And,
    Or,
    Equal,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
}

impl WhereOperator {
    pub fn is_leaf(&self) -> bool {
        matches!(self, WhereOperator::Parameter | WhereOperator::Value)
    }
}

/// One node of the comparison tree.
///
/// Leaves (`Parameter`, `Value`) carry `value` and no children. `Not` uses
/// `left` only. Every other operator is binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereCondition {
    pub operator: WhereOperator,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<WhereCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<WhereCondition>>,
}

impl WhereCondition {
    /// Column reference by dot-joined property path.
    pub fn parameter(path: impl Into<String>) -> Self {
        WhereCondition {
            operator: WhereOperator::Parameter,
            value: path.into(),
            left: None,
            right: None,
        }
    }

    /// Already-rendered SQL literal.
    pub fn value(literal: impl Into<String>) -> Self {
        WhereCondition {
            operator: WhereOperator::Value,
            value: literal.into(),
            left: None,
            right: None,
        }
    }

    pub fn not(operand: WhereCondition) -> Self {
        WhereCondition {
            operator: WhereOperator::Not,
            value: String::new(),
            left: Some(Box::new(operand)),
            right: None,
        }
    }

    pub fn binary(left: WhereCondition, operator: WhereOperator, right: WhereCondition) -> Self {
        WhereCondition {
            operator,
            value: String::new(),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn and(left: WhereCondition, right: WhereCondition) -> Self {
        Self::binary(left, WhereOperator::And, right)
    }

    pub fn or(left: WhereCondition, right: WhereCondition) -> Self {
        Self::binary(left, WhereOperator::Or, right)
    }

    /// Membership test: `left` is the collection, `right` the item.
    pub fn contains(collection: WhereCondition, item: WhereCondition) -> Self {
        Self::binary(collection, WhereOperator::Contains, item)
    }

    /// Check the arity invariant for the whole subtree.
    pub fn validate_shape(&self) -> Result<(), QueryAstError> {
        let has_left = self.left.is_some();
        let has_right = self.right.is_some();
        let ok = match self.operator {
            op if op.is_leaf() => !has_left && !has_right,
            WhereOperator::Not => has_left && !has_right,
            _ => has_left && has_right,
        };
        if !ok {
            return Err(QueryAstError::MalformedNode {
                operator: self.operator,
                reason: format!(
                    "left child {}, right child {}",
                    if has_left { "present" } else { "absent" },
                    if has_right { "present" } else { "absent" }
                ),
            });
        }
        if let Some(left) = &self.left {
            left.validate_shape()?;
        }
        if let Some(right) = &self.right {
            right.validate_shape()?;
        }
        Ok(())
    }

    /// Visit every Parameter path in the subtree, left to right.
    pub fn parameter_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        collect_paths(self, &mut paths);
        paths
    }
}

fn collect_paths<'a>(node: &'a WhereCondition, out: &mut Vec<&'a str>) {
    if node.operator == WhereOperator::Parameter {
        out.push(node.value.as_str());
        return;
    }
    if let Some(left) = &node.left {
        collect_paths(left, out);
    }
    if let Some(right) = &node.right {
        collect_paths(right, out);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// Pagination window. Zero means "unbounded" for either field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub take: u32,
}

impl Limit {
    pub fn is_unbounded(&self) -> bool {
        self.skip == 0 && self.take == 0
    }
}

/// A complete query request as shipped over the wire.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAst {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<WhereCondition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub order_by_field: String,
    #[serde(default)]
    pub order_direction: OrderDirection,
    #[serde(default, skip_serializing_if = "Limit::is_unbounded")]
    pub limit: Limit,
    /// Relation names in first-requested order, without duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

impl RequestAst {
    /// Add a relation to the include set, keeping first-seen order.
    pub fn add_include(&mut self, relation: impl Into<String>) {
        let relation = relation.into();
        if !self.include.contains(&relation) {
            self.include.push(relation);
        }
    }

    pub fn has_order(&self) -> bool {
        !self.order_by_field.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_shape_accepts_well_formed_tree() {
        let tree = WhereCondition::and(
            WhereCondition::binary(
                WhereCondition::parameter("ProdId"),
                WhereOperator::Equal,
                WhereCondition::value("0"),
            ),
            WhereCondition::not(WhereCondition::binary(
                WhereCondition::parameter("UnitCost"),
                WhereOperator::GreaterThan,
                WhereCondition::value("10"),
            )),
        );
        assert!(tree.validate_shape().is_ok());
    }

    #[test]
    fn test_validate_shape_rejects_leaf_with_children() {
        let mut leaf = WhereCondition::parameter("ProdId");
        leaf.left = Some(Box::new(WhereCondition::value("1")));
        let err = leaf.validate_shape().unwrap_err();
        assert!(matches!(
            err,
            QueryAstError::MalformedNode {
                operator: WhereOperator::Parameter,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_shape_rejects_binary_missing_right() {
        let mut node = WhereCondition::and(
            WhereCondition::parameter("A"),
            WhereCondition::parameter("B"),
        );
        node.right = None;
        assert!(node.validate_shape().is_err());
    }

    #[test]
    fn test_parameter_paths_in_order() {
        let tree = WhereCondition::or(
            WhereCondition::parameter("ProdId"),
            WhereCondition::contains(
                WhereCondition::value("1, 2"),
                WhereCondition::parameter("Prod.ProdName"),
            ),
        );
        assert_eq!(tree.parameter_paths(), vec!["ProdId", "Prod.ProdName"]);
    }

    #[test]
    fn test_add_include_deduplicates() {
        let mut ast = RequestAst::default();
        ast.add_include("Prod");
        ast.add_include("Channel");
        ast.add_include("Prod");
        assert_eq!(ast.include, vec!["Prod".to_string(), "Channel".to_string()]);
    }
}
