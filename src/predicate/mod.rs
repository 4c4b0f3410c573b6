//! # Predicate Compiler
//!
//! Build filters with combinators and lower them into the comparison tree of
//! [`crate::query_ast`]:
//!
//! ```ignore
//! use querywire::predicate::{col, contains};
//!
//! let filter = col("ProdId").eq(0).and(col("UnitCost").gt(10));
//! let by_channel = contains(vec![2, 3, 4], col("ChannelId"));
//! ```

mod compiler;
mod errors;
mod expr;
mod literal;

pub use compiler::PredicateCompiler;
pub use errors::PredicateError;
pub use expr::{col, contains, lit, not, BinaryOp, Expr};
pub use literal::{escape_string, Literal};
