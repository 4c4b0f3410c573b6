//! Record types for the tables in the catalog.
//!
//! Field names follow the catalog's property names. Nullable columns are
//! `Option`s and eager-loadable relations are boxed optional children,
//! left `None` unless the query included them.

use serde::de::DeserializeOwned;

mod sh;

pub use sh::{Channel, Cost, Country, Customer, Product, Promotion, Sale, Time};

/// A record type bound to one catalog entity.
pub trait Entity: DeserializeOwned {
    /// Catalog entity name, e.g. `"Cost"`.
    const NAME: &'static str;
}
