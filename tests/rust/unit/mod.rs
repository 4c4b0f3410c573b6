//! Unit tests - Pure compile pipeline checks
//!
//! Nothing here touches the network or a store: queries are built, encoded,
//! decoded, compiled to SQL and materialized in process.

mod catalog_file_tests;
mod query_pipeline_tests;
