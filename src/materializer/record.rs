use serde_json::{Map, Value};

use super::errors::MaterializeError;

/// One hydrated entity: scalar properties plus attached relations, in
/// catalog column order.
///
/// Null properties are left out entirely so the wire form carries presence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entity: String,
    values: Map<String, Value>,
}

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Record {
            entity: entity.into(),
            values: Map::new(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn set(&mut self, property: &str, value: Value) {
        self.values.insert(property.to_string(), value);
    }

    pub fn attach(&mut self, relation: &str, related: Record) {
        self.values
            .insert(relation.to_string(), Value::Object(related.values));
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    pub fn relation(&self, name: &str) -> Option<&Map<String, Value>> {
        self.values.get(name).and_then(Value::as_object)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    /// Serialized entity message as carried in a select reply.
    pub fn to_wire(&self) -> Result<String, MaterializeError> {
        serde_json::to_string(&self.values).map_err(|e| MaterializeError::Encode {
            entity: self.entity.clone(),
            message: e.to_string(),
        })
    }
}
