//! Catalogs loaded from YAML files instead of the embedded schema.

#[cfg(test)]
mod catalog_file_tests {
    use std::io::Write;

    use querywire::materializer::{MaterializeError, Row, RowMaterializer};
    use querywire::predicate::{col, PredicateCompiler};
    use querywire::query_ast::RequestAst;
    use querywire::sql_generator::compile_select;
    use querywire::table_catalog::{load_catalog, TableCatalogError};
    use serde_json::json;
    use tempfile::NamedTempFile;

    const ACCOUNTS: &str = r#"
name: accounts
tables:
  - entity: Account
    schema: CRM
    table: ACCOUNTS
    key: Id
    columns:
      - { property: Id, column: ID, type: uuid }
      - { property: Name, column: NAME, type: text }
      - { property: IsActive, column: IS_ACTIVE, type: bool }
      - { property: Balance, column: BALANCE, type: int64 }
      - { property: OpenedAt, column: OPENED_AT, type: timestamp }
      - { property: OwnerId, column: OWNER_ID, type: int32, nullable: true }
      - { property: Avatar, column: AVATAR, type: blob, nullable: true }
    relations:
      - { name: Owner, target: User, local: OwnerId, foreign: UserId }
  - entity: User
    schema: CRM
    table: USERS
    key: UserId
    columns:
      - { property: UserId, column: USER_ID, type: int32 }
      - { property: Login, column: LOGIN, type: text }
"#;

    fn write_catalog(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_boolean_shorthand_against_file_catalog() {
        let file = write_catalog(ACCOUNTS);
        let catalog = load_catalog(file.path().to_str()).unwrap();
        assert_eq!(catalog.name(), Some("accounts"));

        let compiler = PredicateCompiler::new(&catalog, "Account").unwrap();
        let condition = compiler
            .compile(&(col("IsActive") & col("Owner.Login").eq("root")))
            .unwrap();
        let ast = RequestAst {
            condition: Some(condition),
            ..Default::default()
        };

        let compiled = compile_select(&catalog, "Account", &ast).unwrap();
        assert!(compiled
            .sql
            .contains("LEFT JOIN CRM.USERS t1 ON t1.USER_ID = t0.OWNER_ID"));
        assert!(compiled
            .sql
            .contains("WHERE t0.IS_ACTIVE = 1 AND t1.LOGIN = 'root'"));
        // Filter-only joins add no projected columns.
        assert!(!compiled.sql.contains("t1_LOGIN"));
    }

    #[test]
    fn test_unsupported_column_type_fails_materialization() {
        let file = write_catalog(ACCOUNTS);
        let catalog = load_catalog(file.path().to_str()).unwrap();
        let compiled = compile_select(&catalog, "Account", &RequestAst::default()).unwrap();
        let materializer = RowMaterializer::new(&catalog, &compiled).unwrap();

        let row: Row = json!({
            "t0_ID": "",
            "t0_NAME": "Acme",
            "t0_IS_ACTIVE": 1,
            "t0_BALANCE": "9007199254740993",
            "t0_OPENED_AT": "2024-03-01 10:15:00",
            "t0_OWNER_ID": null,
            "t0_AVATAR": null
        })
        .as_object()
        .unwrap()
        .clone();

        let err = materializer.materialize(&row).unwrap_err();
        assert!(matches!(
            err,
            MaterializeError::UnsupportedFieldType { ref field, .. } if field == "Avatar"
        ));
    }

    #[test]
    fn test_relation_to_missing_entity_is_rejected() {
        let broken = ACCOUNTS.replace("target: User", "target: Person");
        let file = write_catalog(&broken);
        assert!(matches!(
            load_catalog(file.path().to_str()),
            Err(TableCatalogError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_missing_catalog_file() {
        assert!(matches!(
            load_catalog(Some("/nonexistent/querywire/catalog.yaml")),
            Err(TableCatalogError::ConfigReadError { .. })
        ));
    }
}
