//! Predicate combinators.
//!
//! Column references and captured values are distinguished at construction
//! time: `col("UnitCost").gt(10)` reads as "column UnitCost greater than the
//! value 10". The resulting [`Expr`] is compiled against table metadata by
//! [`super::PredicateCompiler`].

use std::ops;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::literal::Literal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl BinaryOp {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Dot-joined property path rooted at the queried entity.
    Column(String),
    Literal(Literal),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Membership of `item` in `collection`.
    Contains {
        collection: Box<Expr>,
        item: Box<Expr>,
    },
}

/// Reference a column (or `Relation.Column`) of the queried entity.
pub fn col(path: impl Into<String>) -> Expr {
    Expr::Column(path.into())
}

/// Capture a value.
pub fn lit(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

/// `contains(collection, item)`; same tree as `collection.contains(item)`.
pub fn contains(collection: impl Into<Expr>, item: impl Into<Expr>) -> Expr {
    Expr::Contains {
        collection: Box::new(collection.into()),
        item: Box::new(item.into()),
    }
}

pub fn not(operand: impl Into<Expr>) -> Expr {
    Expr::Not(Box::new(operand.into()))
}

impl Expr {
    fn binary(self, op: BinaryOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(rhs.into()),
        }
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Equal, rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::GreaterThan, rhs)
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::GreaterOrEqual, rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::LessThan, rhs)
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::LessOrEqual, rhs)
    }

    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::And, rhs)
    }

    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Or, rhs)
    }

    /// `self` is the collection.
    pub fn contains(self, item: impl Into<Expr>) -> Expr {
        contains(self, item)
    }

    /// `self` is the item.
    pub fn is_in(self, collection: impl Into<Expr>) -> Expr {
        contains(collection, self)
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl ops::BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl ops::BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

impl From<Literal> for Expr {
    fn from(value: Literal) -> Self {
        Expr::Literal(value)
    }
}

macro_rules! expr_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Literal(Literal::from(value))
                }
            }
        )*
    };
}

expr_from_value!(
    bool,
    i32,
    i64,
    u32,
    Decimal,
    String,
    NaiveDate,
    NaiveDateTime,
    Uuid,
    Vec<i32>,
    Vec<i64>,
);

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(Literal::from(value))
    }
}

impl From<&[i32]> for Expr {
    fn from(value: &[i32]) -> Self {
        Expr::Literal(Literal::from(value))
    }
}

impl From<&[i64]> for Expr {
    fn from(value: &[i64]) -> Self {
        Expr::Literal(Literal::from(value))
    }
}

impl<T: Into<Literal>> From<Option<T>> for Expr {
    fn from(value: Option<T>) -> Self {
        Expr::Literal(Literal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_spellings_build_same_tree() {
        let ids = vec![1_i32, 2, 3];
        let method = lit(ids.clone()).contains(col("ChannelId"));
        let free = contains(ids.clone(), col("ChannelId"));
        let is_in = col("ChannelId").is_in(ids);
        assert_eq!(method, free);
        assert_eq!(free, is_in);
    }

    #[test]
    fn test_operator_sugar() {
        let a = col("A").eq(1);
        let b = col("B").gt(2);
        assert_eq!(a.clone() & b.clone(), a.clone().and(b.clone()));
        assert_eq!(a.clone() | b.clone(), a.clone().or(b));
        assert_eq!(!a.clone(), not(a));
    }

    #[test]
    fn test_option_value_is_null_literal() {
        assert_eq!(
            col("CustSrcId").eq(None::<i32>),
            col("CustSrcId").eq(lit(Literal::Null))
        );
    }
}
