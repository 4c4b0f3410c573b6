use std::sync::Arc;
use std::time::Duration;

use querywire::entities::{Channel, Cost};
use querywire::predicate::{col, PredicateCompiler};
use querywire::query_ast::{encode, RequestAst};
use querywire::server::{ClickHouseStore, SelectRequest, SelectService};
use querywire::table_catalog::sales_history;
use tokio_util::sync::CancellationToken;

fn clickhouse() -> clickhouse::Client {
    let url = std::env::var("CLICKHOUSE_URL").unwrap_or_else(|_| "http://localhost:8123".to_string());
    let mut client = clickhouse::Client::default()
        .with_url(url)
        .with_option("join_use_nulls", "1")
        .with_option("output_format_json_quote_64bit_integers", "1")
        .with_option("output_format_json_quote_decimals", "1");
    if let Ok(user) = std::env::var("CLICKHOUSE_USER") {
        client = client.with_user(user);
    }
    if let Ok(password) = std::env::var("CLICKHOUSE_PASSWORD") {
        client = client.with_password(password);
    }
    client
}

fn service() -> SelectService {
    SelectService::new(
        Arc::new(ClickHouseStore::new(clickhouse())),
        Arc::new(sales_history().unwrap()),
        Duration::from_secs(30),
    )
}

async fn select(entity: &str, ast: &RequestAst) -> Vec<String> {
    let request = SelectRequest {
        request: encode(ast).unwrap(),
        timeout_ms: None,
    };
    let reply = service()
        .select(entity, &request, &CancellationToken::new())
        .await;
    assert!(!reply.is_error(), "select failed: {}", reply.error_message);
    reply.objects
}

#[tokio::test]
#[ignore]
async fn test_channels_from_clickhouse() -> anyhow::Result<()> {
    let objects = select("Channel", &RequestAst::default()).await;
    assert!(!objects.is_empty());
    for object in &objects {
        let channel: Channel = serde_json::from_str(object)?;
        assert!(channel.channel_id > 0);
    }
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_costs_with_included_product() -> anyhow::Result<()> {
    let catalog = sales_history()?;
    let compiler = PredicateCompiler::new(&catalog, "Cost")?;
    let mut ast = RequestAst {
        condition: Some(compiler.compile(&col("UnitCost").gt(10))?),
        ..Default::default()
    };
    ast.limit.take = 5;
    ast.add_include("Prod");

    let objects = select("Cost", &ast).await;
    assert!(objects.len() <= 5);
    for object in &objects {
        let cost: Cost = serde_json::from_str(object)?;
        assert!(cost.unit_cost > rust_decimal::Decimal::TEN);
        assert_eq!(cost.prod.map(|p| p.prod_id), Some(cost.prod_id));
    }
    Ok(())
}
