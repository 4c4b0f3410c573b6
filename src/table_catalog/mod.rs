//! Table metadata registry: entity names, physical tables, property to
//! column mappings and relations. Consumed by the predicate compiler for
//! path validation and by the SQL generator for projection and aliasing.

pub mod config;
mod errors;
pub mod registry;
mod table_metadata;

pub use config::TableCatalogConfig;
pub use errors::TableCatalogError;
pub use registry::{load_catalog, sales_history};
pub use table_metadata::{
    column, nullable_column, ColumnMetadata, ColumnType, RelationMetadata, ResolvedPath,
    TableCatalog, TableMetadata,
};
