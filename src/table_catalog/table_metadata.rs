use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::errors::TableCatalogError;

/// Store-side type of a column, selecting the materializer conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int32,
    Int64,
    Uuid,
    Text,
    Decimal,
    Date,
    Timestamp,
    Bool,
    /// Declared in the catalog but not convertible by the materializer.
    Other(String),
}

impl ColumnType {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Uuid => "uuid",
            ColumnType::Text => "text",
            ColumnType::Decimal => "decimal",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Bool => "bool",
            ColumnType::Other(name) => name,
        }
    }
}

impl FromStr for ColumnType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "int32" | "int" => ColumnType::Int32,
            "int64" | "long" => ColumnType::Int64,
            "uuid" | "guid" => ColumnType::Uuid,
            "text" | "string" => ColumnType::Text,
            "decimal" => ColumnType::Decimal,
            "date" => ColumnType::Date,
            "timestamp" | "datetime" => ColumnType::Timestamp,
            "bool" | "boolean" => ColumnType::Bool,
            other => ColumnType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMetadata {
    pub property: String,
    pub column: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

/// A to-one navigation from one entity to another, joined on
/// `local_property = foreign_property`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationMetadata {
    pub name: String,
    pub target_entity: String,
    pub local_property: String,
    pub foreign_property: String,
}

/// Physical layout of one entity type.
///
/// Columns keep their declaration order; that order is the projection order
/// of generated SQL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMetadata {
    pub entity: String,
    pub schema: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    columns: Vec<ColumnMetadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    relations: Vec<RelationMetadata>,
}

impl TableMetadata {
    pub fn new(
        entity: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<ColumnMetadata>,
    ) -> Self {
        TableMetadata {
            entity: entity.into(),
            schema: schema.into(),
            table: table.into(),
            key_property: None,
            description: None,
            columns,
            relations: Vec::new(),
        }
    }

    pub fn with_key(mut self, property: impl Into<String>) -> Self {
        self.key_property = Some(property.into());
        self
    }

    pub fn with_relation(mut self, relation: RelationMetadata) -> Self {
        self.relations.push(relation);
        self
    }

    /// `SCHEMA.TABLE`, or just `TABLE` when no schema is set.
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.table.clone()
        } else {
            format!("{}.{}", self.schema, self.table)
        }
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn relations(&self) -> &[RelationMetadata] {
        &self.relations
    }

    pub fn column(&self, property: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.property == property)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationMetadata> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn physical_column(&self, property: &str) -> Result<&str, TableCatalogError> {
        self.column(property)
            .map(|c| c.column.as_str())
            .ok_or_else(|| TableCatalogError::UnknownColumn {
                entity: self.entity.clone(),
                path: property.to_string(),
            })
    }
}

/// Result of resolving a dot-joined property path.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPath<'a> {
    /// Relation navigated through, `None` for a column of the entity itself.
    pub relation: Option<&'a RelationMetadata>,
    /// Table owning the column.
    pub table: &'a TableMetadata,
    pub column: &'a ColumnMetadata,
}

/// Immutable set of table metadata, keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    name: Option<String>,
    tables: Vec<TableMetadata>,
    index: HashMap<String, usize>,
}

impl TableCatalog {
    /// Build a catalog, checking that names are unique and every relation
    /// points at an existing entity and existing properties.
    pub fn new(name: Option<String>, tables: Vec<TableMetadata>) -> Result<Self, TableCatalogError> {
        let mut index = HashMap::new();
        for (i, table) in tables.iter().enumerate() {
            if index.insert(table.entity.clone(), i).is_some() {
                return Err(TableCatalogError::InvalidConfig {
                    message: format!("entity `{}` is defined more than once", table.entity),
                });
            }
        }

        let catalog = TableCatalog {
            name,
            tables,
            index,
        };
        for table in &catalog.tables {
            catalog.validate_table(table)?;
        }
        Ok(catalog)
    }

    fn validate_table(&self, table: &TableMetadata) -> Result<(), TableCatalogError> {
        if table.columns.is_empty() {
            return Err(TableCatalogError::invalid_with_context(
                "table has no columns",
                &table.entity,
            ));
        }
        let mut seen = HashMap::new();
        for column in &table.columns {
            if seen.insert(column.property.as_str(), ()).is_some() {
                return Err(TableCatalogError::invalid_with_context(
                    format!("property `{}` is mapped twice", column.property),
                    &table.entity,
                ));
            }
        }
        if let Some(key) = &table.key_property {
            if table.column(key).is_none() {
                return Err(TableCatalogError::invalid_with_context(
                    format!("key property `{}` is not a column", key),
                    &table.entity,
                ));
            }
        }
        for relation in &table.relations {
            if table.column(&relation.name).is_some() {
                return Err(TableCatalogError::invalid_with_context(
                    format!("relation `{}` shadows a column", relation.name),
                    &table.entity,
                ));
            }
            let target = self.table(&relation.target_entity).map_err(|_| {
                TableCatalogError::invalid_with_context(
                    format!(
                        "relation `{}` targets unknown entity `{}`",
                        relation.name, relation.target_entity
                    ),
                    &table.entity,
                )
            })?;
            if table.column(&relation.local_property).is_none() {
                return Err(TableCatalogError::invalid_with_context(
                    format!(
                        "relation `{}` joins on unknown local property `{}`",
                        relation.name, relation.local_property
                    ),
                    &table.entity,
                ));
            }
            if target.column(&relation.foreign_property).is_none() {
                return Err(TableCatalogError::invalid_with_context(
                    format!(
                        "relation `{}` joins on unknown property `{}` of `{}`",
                        relation.name, relation.foreign_property, target.entity
                    ),
                    &table.entity,
                ));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn table(&self, entity: &str) -> Result<&TableMetadata, TableCatalogError> {
        self.index
            .get(entity)
            .map(|&i| &self.tables[i])
            .ok_or_else(|| TableCatalogError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableMetadata> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Resolve `Property` or `Relation.Property` against `entity`.
    pub fn resolve_path(&self, entity: &str, path: &str) -> Result<ResolvedPath<'_>, TableCatalogError> {
        let table = self.table(entity)?;
        let unknown = || TableCatalogError::UnknownColumn {
            entity: entity.to_string(),
            path: path.to_string(),
        };

        let segments: Vec<&str> = path.split('.').collect();
        match segments.as_slice() {
            [property] => {
                let column = table.column(property).ok_or_else(unknown)?;
                Ok(ResolvedPath {
                    relation: None,
                    table,
                    column,
                })
            }
            [relation_name, property] => {
                let relation = table.relation(relation_name).ok_or_else(unknown)?;
                let target = self.table(&relation.target_entity)?;
                let column = target.column(property).ok_or_else(unknown)?;
                Ok(ResolvedPath {
                    relation: Some(relation),
                    table: target,
                    column,
                })
            }
            _ => Err(unknown()),
        }
    }

    /// Look up a relation of `entity` by name.
    pub fn relation(&self, entity: &str, name: &str) -> Result<&RelationMetadata, TableCatalogError> {
        self.table(entity)?
            .relation(name)
            .ok_or_else(|| TableCatalogError::UnknownRelation {
                entity: entity.to_string(),
                relation: name.to_string(),
            })
    }
}

pub fn column(property: &str, column: &str, column_type: ColumnType) -> ColumnMetadata {
    ColumnMetadata {
        property: property.to_string(),
        column: column.to_string(),
        column_type,
        nullable: false,
    }
}

pub fn nullable_column(property: &str, column: &str, column_type: ColumnType) -> ColumnMetadata {
    ColumnMetadata {
        nullable: true,
        ..self::column(property, column, column_type)
    }
}
