//! # Row Materializer
//!
//! Turns label-addressed result rows into [`Record`]s. A [`RowMaterializer`]
//! is planned once per statement from the catalog and the compiled select,
//! then applied row by row as the cursor advances; nothing is buffered here.

use serde_json::{Map, Value};

use crate::sql_generator::{column_label, CompiledSelect, BASE_ALIAS};
use crate::table_catalog::{ColumnMetadata, ColumnType, TableCatalog};

mod errors;
mod field_reader;
mod record;

pub use errors::MaterializeError;
pub use field_reader::{read_field, FieldValue};
pub use record::Record;

/// A result row as delivered by the store, keyed by column label.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone)]
struct FieldPlan {
    label: String,
    column: ColumnMetadata,
}

#[derive(Debug, Clone)]
struct RelationPlan {
    name: String,
    entity: String,
    /// Label of the joined key column; null means no related row.
    key_label: String,
    fields: Vec<FieldPlan>,
}

#[derive(Debug, Clone)]
pub struct RowMaterializer {
    entity: String,
    fields: Vec<FieldPlan>,
    relations: Vec<RelationPlan>,
}

fn plan_fields(alias: &str, columns: &[ColumnMetadata]) -> Vec<FieldPlan> {
    columns
        .iter()
        .map(|c| FieldPlan {
            label: column_label(alias, &c.column),
            column: c.clone(),
        })
        .collect()
}

impl RowMaterializer {
    pub fn new(catalog: &TableCatalog, compiled: &CompiledSelect) -> Result<Self, MaterializeError> {
        let unknown = |entity: &str| MaterializeError::UnknownEntity(entity.to_string());
        let base = catalog.table(&compiled.entity).map_err(|_| unknown(&compiled.entity))?;

        let mut relations = Vec::new();
        for join in compiled.projected_joins() {
            let target = catalog
                .table(&join.target_entity)
                .map_err(|_| unknown(&join.target_entity))?;
            relations.push(RelationPlan {
                name: join.relation.clone(),
                entity: target.entity.clone(),
                key_label: column_label(&join.alias, &join.foreign_column),
                fields: plan_fields(&join.alias, target.columns()),
            });
        }

        Ok(RowMaterializer {
            entity: base.entity.clone(),
            fields: plan_fields(BASE_ALIAS, base.columns()),
            relations,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Materialize one row.
    pub fn materialize(&self, row: &Row) -> Result<Record, MaterializeError> {
        let mut record = Record::new(self.entity.as_str());
        fill(&mut record, &self.fields, row)?;

        for relation in &self.relations {
            let present = matches!(row.get(&relation.key_label), Some(v) if !v.is_null());
            if !present {
                continue;
            }
            let mut related = Record::new(relation.entity.as_str());
            fill(&mut related, &relation.fields, row)?;
            record.attach(&relation.name, related);
        }
        Ok(record)
    }
}

fn fill(record: &mut Record, fields: &[FieldPlan], row: &Row) -> Result<(), MaterializeError> {
    for field in fields {
        let raw = row.get(&field.label);
        // An absent identifier reads as nil; any other missing label means
        // the projection and the plan disagree.
        if raw.is_none() && field.column.column_type != ColumnType::Uuid {
            return Err(MaterializeError::MissingColumn {
                field: field.column.property.clone(),
                label: field.label.clone(),
            });
        }
        if let Some(value) = read_field(&field.column, raw)? {
            record.set(&field.column.property, value.to_json());
        }
    }
    Ok(())
}
