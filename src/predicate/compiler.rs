use crate::query_ast::{WhereCondition, WhereOperator};
use crate::table_catalog::{ColumnType, TableCatalog, TableMetadata};

use super::errors::PredicateError;
use super::expr::{BinaryOp, Expr};
use super::literal::Literal;

/// Compiles predicate, ordering and include directives for one entity.
///
/// Paths are checked against the catalog (a lookup, not a full schema
/// validation) so typos fail here rather than on the server.
pub struct PredicateCompiler<'a> {
    catalog: &'a TableCatalog,
    table: &'a TableMetadata,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(catalog: &'a TableCatalog, entity: &str) -> Result<Self, PredicateError> {
        let table = catalog.table(entity)?;
        Ok(PredicateCompiler { catalog, table })
    }

    pub fn entity(&self) -> &str {
        &self.table.entity
    }

    /// Compile a boolean predicate into a comparison tree.
    pub fn compile(&self, expr: &Expr) -> Result<WhereCondition, PredicateError> {
        self.compile_condition(expr)
    }

    /// Expression in boolean position.
    fn compile_condition(&self, expr: &Expr) -> Result<WhereCondition, PredicateError> {
        match expr {
            Expr::Column(path) => {
                let column_type = self.column_type(path)?;
                if column_type != ColumnType::Bool {
                    return Err(PredicateError::UnsupportedExpression(format!(
                        "column `{}` of type {} used as a condition",
                        path, column_type
                    )));
                }
                // Booleans are stored as 0/1.
                Ok(WhereCondition::binary(
                    WhereCondition::parameter(path.as_str()),
                    WhereOperator::Equal,
                    WhereCondition::value("1"),
                ))
            }
            Expr::Literal(lit) => Err(PredicateError::UnsupportedExpression(format!(
                "literal {} used as a condition",
                lit.to_sql()
            ))),
            Expr::Not(operand) => Ok(WhereCondition::not(self.compile_condition(operand)?)),
            Expr::Binary { op, left, right } if op.is_logical() => {
                let left = self.compile_condition(left)?;
                let right = self.compile_condition(right)?;
                Ok(WhereCondition::binary(left, logical_operator(*op), right))
            }
            Expr::Binary { op, left, right } => {
                let left = self.compile_operand(left)?;
                let right = self.compile_operand(right)?;
                Ok(WhereCondition::binary(left, comparison_operator(*op), right))
            }
            Expr::Contains { collection, item } => {
                let collection = match collection.as_ref() {
                    Expr::Literal(list @ Literal::IntegerList(_)) => {
                        WhereCondition::value(list.to_sql())
                    }
                    other => {
                        return Err(PredicateError::UnsupportedExpression(format!(
                            "membership collection must be an integer sequence, got {}",
                            describe(other)
                        )))
                    }
                };
                let item = self.compile_operand(item)?;
                Ok(WhereCondition::contains(collection, item))
            }
        }
    }

    /// Expression in value position (comparison operand, membership item).
    fn compile_operand(&self, expr: &Expr) -> Result<WhereCondition, PredicateError> {
        match expr {
            Expr::Column(path) => {
                self.column_type(path)?;
                Ok(WhereCondition::parameter(path.as_str()))
            }
            Expr::Literal(lit) if lit.is_list() => Err(PredicateError::UnsupportedExpression(
                "integer sequence is only valid as a membership collection".to_string(),
            )),
            Expr::Literal(lit) => Ok(WhereCondition::value(lit.to_sql())),
            other => Err(PredicateError::UnsupportedExpression(format!(
                "{} used as a comparison operand",
                describe(other)
            ))),
        }
    }

    fn column_type(&self, path: &str) -> Result<ColumnType, PredicateError> {
        let resolved = self.catalog.resolve_path(&self.table.entity, path)?;
        Ok(resolved.column.column_type.clone())
    }

    /// Capture the ordering field from a key selector.
    ///
    /// Only a direct single-column reference is captured. Anything else is
    /// ignored and leaves the query unordered.
    pub fn order_field(&self, key: &Expr) -> Result<Option<String>, PredicateError> {
        match key {
            Expr::Column(path) if !path.contains('.') => {
                self.table
                    .physical_column(path)
                    .map_err(PredicateError::from)?;
                Ok(Some(path.clone()))
            }
            other => {
                log::debug!(
                    "Ignoring order key {} on `{}`: not a direct column reference",
                    describe(other),
                    self.table.entity
                );
                Ok(None)
            }
        }
    }

    pub fn include_relation(&self, relation: &str) -> Result<String, PredicateError> {
        self.catalog.relation(&self.table.entity, relation)?;
        Ok(relation.to_string())
    }
}

fn logical_operator(op: BinaryOp) -> WhereOperator {
    match op {
        BinaryOp::Or => WhereOperator::Or,
        _ => WhereOperator::And,
    }
}

fn comparison_operator(op: BinaryOp) -> WhereOperator {
    match op {
        BinaryOp::Equal => WhereOperator::Equal,
        BinaryOp::GreaterThan => WhereOperator::GreaterThan,
        BinaryOp::GreaterOrEqual => WhereOperator::GreaterOrEqual,
        BinaryOp::LessThan => WhereOperator::LessThan,
        BinaryOp::LessOrEqual => WhereOperator::LessOrEqual,
        BinaryOp::And => WhereOperator::And,
        BinaryOp::Or => WhereOperator::Or,
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Column(path) => format!("column `{}`", path),
        Expr::Literal(lit) => format!("literal {}", lit.to_sql()),
        Expr::Not(_) => "NOT expression".to_string(),
        Expr::Binary { op, .. } => format!("{:?} expression", op),
        Expr::Contains { .. } => "membership test".to_string(),
    }
}
