//! YAML definition of a table catalog.
//!
//! ```yaml
//! name: sales_history
//! tables:
//!   - entity: Cost
//!     schema: SH
//!     table: COSTS
//!     columns:
//!       - { property: ProdId, column: PROD_ID, type: int32 }
//!     relations:
//!       - { name: Prod, target: Product, local: ProdId, foreign: ProdId }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::TableCatalogError;
use super::table_metadata::{ColumnMetadata, ColumnType, RelationMetadata, TableCatalog, TableMetadata};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCatalogConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub entity: String,
    #[serde(default)]
    pub schema: String,
    pub table: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub property: String,
    pub column: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub name: String,
    pub target: String,
    pub local: String,
    pub foreign: String,
}

impl TableCatalogConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, TableCatalogError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TableCatalogError::ConfigReadError {
                error: format!("{}: {}", path.as_ref().display(), e),
            }
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, TableCatalogError> {
        serde_yaml::from_str(content).map_err(|e| TableCatalogError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Convert into an immutable, validated catalog.
    pub fn to_catalog(&self) -> Result<TableCatalog, TableCatalogError> {
        let tables = self
            .tables
            .iter()
            .map(TableDefinition::to_metadata)
            .collect();
        TableCatalog::new(self.name.clone(), tables)
    }
}

impl TableDefinition {
    fn to_metadata(&self) -> TableMetadata {
        let columns = self
            .columns
            .iter()
            .map(|c| ColumnMetadata {
                property: c.property.clone(),
                column: c.column.clone(),
                column_type: c
                    .column_type
                    .parse::<ColumnType>()
                    .unwrap_or_else(|never| match never {}),
                nullable: c.nullable,
            })
            .collect();

        let mut table = TableMetadata::new(&self.entity, &self.schema, &self.table, columns);
        table.description = self.description.clone();
        if let Some(key) = &self.key {
            table = table.with_key(key);
        }
        for relation in &self.relations {
            table = table.with_relation(RelationMetadata {
                name: relation.name.clone(),
                target_entity: relation.target.clone(),
                local_property: relation.local.clone(),
                foreign_property: relation.foreign.clone(),
            });
        }
        table
    }
}
