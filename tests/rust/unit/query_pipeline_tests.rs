//! Builder -> wire -> SQL -> record, without a server in between.

#[cfg(test)]
mod query_pipeline_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use querywire::client::{ClientError, OrmClient, Transport};
    use querywire::config::ClientConfig;
    use querywire::entities::{Cost, Customer, Sale};
    use querywire::materializer::{Row, RowMaterializer};
    use querywire::predicate::{col, contains, not};
    use querywire::query_ast::{decode, encode, RequestAst};
    use querywire::server::{SelectReply, SelectRequest, SqlPreviewReply};
    use querywire::sql_generator::compile_select;
    use querywire::table_catalog::{sales_history, TableCatalog};
    use serde_json::json;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn select(&self, _: &str, _: SelectRequest) -> Result<SelectReply, ClientError> {
            Err(ClientError::TransportError("offline".to_string()))
        }

        async fn sql_preview(
            &self,
            _: &str,
            _: SelectRequest,
        ) -> Result<SqlPreviewReply, ClientError> {
            Err(ClientError::TransportError("offline".to_string()))
        }
    }

    fn offline_client() -> (OrmClient, Arc<TableCatalog>) {
        let catalog = Arc::new(sales_history().unwrap());
        let client = OrmClient::with_transport(
            ClientConfig {
                transport_retries: 0,
                ..Default::default()
            },
            Arc::new(Offline),
            catalog.clone(),
        );
        (client, catalog)
    }

    /// Encode on the client side, decode and compile on the server side.
    fn server_sql(
        client: &OrmClient,
        catalog: &TableCatalog,
        entity: &str,
        ast: &RequestAst,
    ) -> String {
        let wire = encode(ast).unwrap();
        let decoded = decode(&wire).unwrap();
        assert_eq!(&decoded, ast);
        assert_eq!(client.catalog().len(), catalog.len());
        compile_select(catalog, entity, &decoded).unwrap().sql
    }

    #[test]
    fn test_cost_filter_order_and_page() {
        let (client, catalog) = offline_client();
        let ast = client
            .table::<Cost>()
            .filter(col("ProdId").eq(0) & col("UnitCost").gt(10))
            .order_by(col("ChannelId"))
            .take(10)
            .to_request()
            .unwrap();

        let sql = server_sql(&client, &catalog, "Cost", &ast);
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines[1], "FROM SH.COSTS t0");
        assert_eq!(lines[2], "WHERE t0.PROD_ID = 0 AND t0.UNIT_COST > 10");
        assert_eq!(lines[3], "ORDER BY t0.CHANNEL_ID");
        assert_eq!(lines[4], "FETCH NEXT 10 ROWS ONLY");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_membership_and_negation() {
        let (client, catalog) = offline_client();
        let ids = vec![13_i32, 14, 15];
        let ast = client
            .table::<Sale>()
            .filter(contains(ids, col("ProdId")))
            .filter(not(col("QuantitySold").le(1)))
            .skip(40)
            .take(20)
            .to_request()
            .unwrap();

        let sql = server_sql(&client, &catalog, "Sale", &ast);
        assert!(sql.contains("WHERE t0.PROD_ID IN (13, 14, 15) AND NOT (t0.QUANTITY_SOLD <= 1)"));
        assert!(sql.contains("OFFSET 40 ROWS\nFETCH NEXT 20 ROWS ONLY"));
    }

    #[test]
    fn test_string_literals_are_escaped() {
        let (client, catalog) = offline_client();
        let ast = client
            .table::<Customer>()
            .filter(col("CustLastName").eq("O'Brien"))
            .to_request()
            .unwrap();

        let sql = server_sql(&client, &catalog, "Customer", &ast);
        assert!(sql.contains(r"WHERE t0.CUST_LAST_NAME = 'O\'Brien'"));
    }

    #[test]
    fn test_navigation_filter_and_include_share_one_join() {
        let (client, catalog) = offline_client();
        let ast = client
            .table::<Customer>()
            .include("Country")
            .filter(col("Country.CountryIsoCode").eq("DE"))
            .to_request()
            .unwrap();

        let wire = encode(&ast).unwrap();
        let compiled = compile_select(&catalog, "Customer", &decode(&wire).unwrap()).unwrap();
        assert_eq!(compiled.joins.len(), 1);
        assert!(compiled.joins[0].projected);
        assert!(compiled
            .sql
            .contains("LEFT JOIN SH.COUNTRIES t1 ON t1.COUNTRY_ID = t0.COUNTRY_ID"));
        assert!(compiled.sql.contains("WHERE t1.COUNTRY_ISO_CODE = 'DE'"));
        assert!(compiled.sql.contains("t1.COUNTRY_NAME AS t1_COUNTRY_NAME"));
    }

    #[test]
    fn test_compile_errors_surface_before_any_round_trip() {
        let (client, _) = offline_client();

        let err = client
            .table::<Cost>()
            .filter(col("Prod.NoSuchColumn").eq(1))
            .to_request()
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownColumn { .. }));

        let err = client.table::<Cost>().include("Cust").to_request().unwrap_err();
        assert!(matches!(err, ClientError::UnknownRelation { .. }));

        let err = client
            .table::<Cost>()
            .filter(col("UnitCost").eq(col("UnitPrice").gt(1)))
            .to_request()
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedExpression(_)));

        let err = client.table_named("Widget").to_request().unwrap_err();
        assert!(matches!(err, ClientError::UnknownEntity(_)));
    }

    #[tokio::test]
    async fn test_offline_fetch_reports_transport_error() {
        let (client, _) = offline_client();
        let err = client.table::<Cost>().take(1).fetch().await.unwrap_err();
        assert!(matches!(err, ClientError::TransportError(_)));
    }

    #[test]
    fn test_included_rows_materialize_into_typed_records() {
        let (client, catalog) = offline_client();
        let ast = client.table::<Cost>().include("Prod").to_request().unwrap();
        let compiled = compile_select(&catalog, "Cost", &ast).unwrap();
        let materializer = RowMaterializer::new(&catalog, &compiled).unwrap();

        let mut row: Row = json!({
            "t0_PROD_ID": 13,
            "t0_TIME_ID": "1998-01-10",
            "t0_PROMO_ID": 999,
            "t0_CHANNEL_ID": 2,
            "t0_UNIT_COST": "883.79",
            "t0_UNIT_PRICE": "1176.23"
        })
        .as_object()
        .unwrap()
        .clone();
        let product = catalog.table("Product").unwrap();
        for column in product.columns() {
            let label = format!("t1_{}", column.column);
            let value = match column.column_type.as_str() {
                "int32" => json!(13),
                "decimal" => json!("899.99"),
                "date" => serde_json::Value::Null,
                _ if column.nullable => serde_json::Value::Null,
                _ => json!("Cameras"),
            };
            row.insert(label, value);
        }

        let wire = materializer.materialize(&row).unwrap().to_wire().unwrap();
        let cost: Cost = serde_json::from_str(&wire).unwrap();
        let prod = cost.prod.expect("Prod was included");
        assert_eq!(prod.prod_id, 13);
        assert_eq!(prod.prod_list_price.to_string(), "899.99");
        assert!(prod.prod_eff_from.is_none());
        assert!(cost.channel.is_none());
    }
}
