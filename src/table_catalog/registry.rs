//! Catalog loading: the embedded Sales History schema or a YAML file.
//! Redefining tables needs a restart.

use super::config::TableCatalogConfig;
use super::errors::TableCatalogError;
use super::table_metadata::TableCatalog;

const SALES_HISTORY_YAML: &str = include_str!("../../schemas/sh.yaml");

/// The embedded Sales History catalog.
pub fn sales_history() -> Result<TableCatalog, TableCatalogError> {
    TableCatalogConfig::from_yaml_str(SALES_HISTORY_YAML)?.to_catalog()
}

/// Load the catalog from `path`, or the embedded one when no path is given.
pub fn load_catalog(path: Option<&str>) -> Result<TableCatalog, TableCatalogError> {
    match path {
        Some(path) => {
            log::info!("Loading table catalog from {}", path);
            TableCatalogConfig::from_yaml_file(path)?.to_catalog()
        }
        None => {
            log::info!("Using embedded sales history catalog");
            sales_history()
        }
    }
}
