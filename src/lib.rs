//! QueryWire - typed, composable queries over remote relational tables
//!
//! This crate lets a caller build a type-checked query without writing SQL:
//! - Predicate combinators compiled into a portable comparison tree
//! - A canonical wire format for filter, ordering, pagination and includes
//! - Server-side SQL generation against a static table catalog
//! - Row materialization into typed records with eagerly loaded relations

pub mod client;
pub mod config;
pub mod entities;
pub mod materializer;
pub mod predicate;
pub mod query_ast;
pub mod server;
pub mod sql_generator;
pub mod table_catalog;
