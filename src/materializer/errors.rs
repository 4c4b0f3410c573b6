use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MaterializeError {
    #[error("Result row has no column labeled `{label}` (field `{field}`)")]
    MissingColumn { field: String, label: String },
    #[error("Field `{field}` is not nullable but the store returned null")]
    UnexpectedNull { field: String },
    #[error("Field `{field}` expects {column_type}, got {value}")]
    InvalidValue {
        field: String,
        column_type: String,
        value: String,
    },
    #[error("Field `{field}` has unsupported type `{column_type}`")]
    UnsupportedFieldType { field: String, column_type: String },
    #[error("Table metadata for `{0}` is unavailable")]
    UnknownEntity(String),
    #[error("Failed to encode `{entity}` record: {message}")]
    Encode { entity: String, message: String },
}
