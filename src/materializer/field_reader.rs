//! Conversion table from store values to typed fields.
//!
//! ClickHouse's `JSONEachRow` quotes some types (64-bit integers, decimals
//! depending on settings, dates) and not others, so every converter accepts
//! both the numeric and the string rendering.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use super::errors::MaterializeError;
use crate::table_catalog::{ColumnMetadata, ColumnType};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int32(i32),
    Int64(i64),
    Uuid(Uuid),
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Bool(bool),
}

impl FieldValue {
    /// Entity wire representation.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int32(i) => Value::from(*i),
            FieldValue::Int64(i) => Value::from(*i),
            FieldValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Decimal(d) => Value::String(d.normalize().to_string()),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Timestamp(ts) => Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            FieldValue::Bool(b) => Value::Bool(*b),
        }
    }
}

/// Read one field. `raw` is `None` when the row has no such label.
///
/// Returns `Ok(None)` for a nullable column holding null.
pub fn read_field(column: &ColumnMetadata, raw: Option<&Value>) -> Result<Option<FieldValue>, MaterializeError> {
    let field = column.property.as_str();
    let invalid = |value: &Value| MaterializeError::InvalidValue {
        field: field.to_string(),
        column_type: column.column_type.to_string(),
        value: value.to_string(),
    };

    let value = match raw {
        None | Some(Value::Null) => {
            return match &column.column_type {
                // Absent identifiers read as the nil UUID.
                ColumnType::Uuid if !column.nullable => Ok(Some(FieldValue::Uuid(Uuid::nil()))),
                ColumnType::Other(name) => Err(MaterializeError::UnsupportedFieldType {
                    field: field.to_string(),
                    column_type: name.clone(),
                }),
                _ if column.nullable => Ok(None),
                ColumnType::Text => Ok(Some(FieldValue::Text(String::new()))),
                _ => Err(MaterializeError::UnexpectedNull {
                    field: field.to_string(),
                }),
            };
        }
        Some(value) => value,
    };

    let converted = match &column.column_type {
        ColumnType::Int32 => read_i64(value)
            .and_then(|i| i32::try_from(i).ok())
            .map(FieldValue::Int32),
        ColumnType::Int64 => read_i64(value).map(FieldValue::Int64),
        ColumnType::Uuid => read_uuid(value).map(FieldValue::Uuid),
        ColumnType::Text => read_text(value).map(FieldValue::Text),
        ColumnType::Decimal => read_decimal(value).map(FieldValue::Decimal),
        ColumnType::Date => read_date(value).map(FieldValue::Date),
        ColumnType::Timestamp => read_timestamp(value).map(FieldValue::Timestamp),
        ColumnType::Bool => read_bool(value).map(FieldValue::Bool),
        ColumnType::Other(name) => {
            return Err(MaterializeError::UnsupportedFieldType {
                field: field.to_string(),
                column_type: name.clone(),
            })
        }
    };
    converted.map(Some).ok_or_else(|| invalid(value))
}

fn read_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_uuid(value: &Value) -> Option<Uuid> {
    match value {
        Value::String(s) if s.trim().is_empty() => Some(Uuid::nil()),
        Value::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    }
}

fn read_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn read_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn read_date(value: &Value) -> Option<NaiveDate> {
    let Value::String(s) = value else {
        return None;
    };
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
}

fn read_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        // Unix seconds
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        Value::String(s) => {
            let s = s.trim();
            parse_timestamp(s).or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        }
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn read_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
