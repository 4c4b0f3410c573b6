//! Closed-over values and their SQL literal rendering.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A value captured at query-construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    IntegerList(Vec<i64>),
}

impl Literal {
    /// Enum values travel as their underlying integer.
    pub fn enumeration<E: Into<i64>>(value: E) -> Self {
        Literal::Integer(value.into())
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Literal::Bool(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Literal::IntegerList(_))
    }

    /// Render as SQL literal text.
    ///
    /// An empty integer list renders as `null` so `x IN (null)` matches nothing
    /// instead of producing `IN ()`.
    pub fn to_sql(&self) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Literal::Integer(i) => i.to_string(),
            Literal::Decimal(d) => d.normalize().to_string(),
            Literal::Text(s) => format!("'{}'", escape_string(s)),
            Literal::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Literal::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
            Literal::Uuid(u) => format!("'{}'", u.hyphenated()),
            Literal::IntegerList(items) if items.is_empty() => "null".to_string(),
            Literal::IntegerList(items) => items
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Escape a string body for a single-quoted SQL literal.
///
/// Backslash is the escape character, so it is doubled first.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .replace('\0', "\\0")
}

macro_rules! literal_from {
    ($($ty:ty => $variant:expr),* $(,)?) => {
        $(
            impl From<$ty> for Literal {
                fn from(value: $ty) -> Self {
                    $variant(value)
                }
            }
        )*
    };
}

literal_from! {
    bool => Literal::Bool,
    i64 => Literal::Integer,
    Decimal => Literal::Decimal,
    String => Literal::Text,
    NaiveDate => Literal::Date,
    NaiveDateTime => Literal::Timestamp,
    Uuid => Literal::Uuid,
    Vec<i64> => Literal::IntegerList,
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(value.into())
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Integer(value.into())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<Vec<i32>> for Literal {
    fn from(value: Vec<i32>) -> Self {
        Literal::IntegerList(value.into_iter().map(i64::from).collect())
    }
}

impl From<&[i32]> for Literal {
    fn from(value: &[i32]) -> Self {
        Literal::IntegerList(value.iter().copied().map(i64::from).collect())
    }
}

impl From<&[i64]> for Literal {
    fn from(value: &[i64]) -> Self {
        Literal::IntegerList(value.to_vec())
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}
