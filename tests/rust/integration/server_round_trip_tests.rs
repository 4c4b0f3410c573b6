use std::sync::Arc;
use std::time::Duration;

use querywire::client::{ClientError, OrmClient};
use querywire::config::{ClientConfig, ServerConfig};
use querywire::entities::Channel;
use querywire::materializer::Row;
use querywire::predicate::col;
use querywire::query_ast::{encode, RequestAst, WhereCondition, WhereOperator};
use querywire::server::{router, AppState, MemoryStore, SelectReply, SelectRequest};
use querywire::table_catalog::sales_history;
use serde_json::{json, Value};
use tokio::net::TcpListener;

fn channel_row(id: i32, desc: &str) -> Row {
    json!({
        "t0_CHANNEL_ID": id,
        "t0_CHANNEL_DESC": desc,
        "t0_CHANNEL_CLASS": "Direct",
        "t0_CHANNEL_CLASS_ID": 12,
        "t0_CHANNEL_TOTAL": "Channel total",
        "t0_CHANNEL_TOTAL_ID": 1
    })
    .as_object()
    .unwrap()
    .clone()
}

async fn spawn_server(store: MemoryStore) -> String {
    spawn_server_with(store, ServerConfig::default()).await
}

async fn spawn_server_with(store: MemoryStore, config: ServerConfig) -> String {
    let catalog = Arc::new(sales_history().unwrap());
    let state = Arc::new(AppState::new(Arc::new(store), catalog, config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base_url: &str) -> OrmClient {
    let config = ClientConfig {
        base_url: base_url.to_string(),
        request_timeout_ms: 5_000,
        transport_retries: 0,
    };
    OrmClient::connect(config).unwrap()
}

async fn post_raw(base_url: &str, entity: &str, request: &SelectRequest) -> SelectReply {
    reqwest::Client::new()
        .post(format!("{}/select/{}", base_url, entity))
        .json(request)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_typed_fetch_over_http() {
    let store = MemoryStore::new(vec![
        channel_row(3, "Direct Sales"),
        channel_row(9, "Tele Sales"),
    ]);
    let base_url = spawn_server(store.clone()).await;
    let client = client_for(&base_url);

    let channels: Vec<Channel> = client
        .table::<Channel>()
        .filter(col("ChannelClass").eq("Direct"))
        .order_by(col("ChannelDesc"))
        .take(2)
        .fetch()
        .await
        .unwrap();

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].channel_id, 3);
    assert_eq!(channels[1].channel_desc, "Tele Sales");

    let executed = store.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].contains("FROM SH.CHANNELS t0"));
    assert!(executed[0].contains("WHERE t0.CHANNEL_CLASS = 'Direct'"));
    assert!(executed[0].contains("ORDER BY t0.CHANNEL_DESC"));
    assert!(executed[0].ends_with("FETCH NEXT 2 ROWS ONLY"));
}

#[tokio::test]
async fn test_first_variants_over_http() {
    let base_url = spawn_server(MemoryStore::default()).await;
    let client = client_for(&base_url);
    let query = client.table::<Channel>().filter(col("ChannelId").eq(-1));

    assert_eq!(query.first().await.unwrap_err(), ClientError::EmptyResult);
    assert_eq!(query.first_or_default().await.unwrap(), Channel::default());
}

#[tokio::test]
async fn test_store_failure_keeps_message() {
    let store = MemoryStore::new(vec![channel_row(3, "Direct Sales"), channel_row(4, "Internet")])
        .failing_after(1, "Code: 241. Memory limit exceeded");
    let base_url = spawn_server(store).await;
    let client = client_for(&base_url);

    let err = client.table::<Channel>().fetch().await.unwrap_err();
    match err {
        ClientError::StoreError(message) => {
            assert!(message.contains("after 1 rows"));
            assert!(message.contains("Memory limit exceeded"));
        }
        other => panic!("expected StoreError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_rejects_non_literal_values() {
    let store = MemoryStore::default();
    let base_url = spawn_server(store.clone()).await;

    let ast = RequestAst {
        condition: Some(WhereCondition::binary(
            WhereCondition::parameter("ChannelId"),
            WhereOperator::Equal,
            WhereCondition::value("1; DROP TABLE SH.CHANNELS"),
        )),
        ..Default::default()
    };
    let request = SelectRequest {
        request: encode(&ast).unwrap(),
        timeout_ms: None,
    };

    let reply = post_raw(&base_url, "Channel", &request).await;
    assert_eq!(reply.error_kind, "unsupported_expression");
    assert!(reply.objects.is_empty());
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_server_reports_unknown_entity_and_bad_payload() {
    let base_url = spawn_server(MemoryStore::default()).await;

    let reply = post_raw(
        &base_url,
        "Widget",
        &SelectRequest {
            request: "{}".to_string(),
            timeout_ms: None,
        },
    )
    .await;
    assert_eq!(reply.error_kind, "unknown_entity");

    let reply = post_raw(
        &base_url,
        "Channel",
        &SelectRequest {
            request: "not json".to_string(),
            timeout_ms: None,
        },
    )
    .await;
    assert_eq!(reply.error_kind, "decode");
}

#[tokio::test]
async fn test_request_deadline_cancels_slow_query() {
    let store = MemoryStore::new(vec![channel_row(3, "Direct Sales")])
        .with_row_delay(Duration::from_millis(500));
    let base_url = spawn_server(store).await;

    let reply = post_raw(
        &base_url,
        "Channel",
        &SelectRequest {
            request: "{}".to_string(),
            timeout_ms: Some(20),
        },
    )
    .await;
    assert_eq!(reply.error_kind, "cancelled");
    assert!(reply.objects.is_empty());
}

#[tokio::test]
async fn test_sql_preview_and_table_listing() {
    let base_url = spawn_server(MemoryStore::default()).await;
    let client = client_for(&base_url);

    let sql = client
        .table::<Channel>()
        .skip(10)
        .take(5)
        .to_sql()
        .await
        .unwrap();
    assert!(sql.starts_with("SELECT t0.CHANNEL_ID AS t0_CHANNEL_ID"));
    assert!(sql.ends_with("OFFSET 10 ROWS\nFETCH NEXT 5 ROWS ONLY"));

    let tables: Value = reqwest::get(format!("{}/tables", base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tables["catalog"], "sales_history");
    assert_eq!(tables["tables"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig {
        base_url: format!("http://{}", addr),
        request_timeout_ms: 1_000,
        transport_retries: 1,
    };
    let client = OrmClient::connect(config).unwrap();
    let err = client.table::<Channel>().fetch().await.unwrap_err();
    assert!(matches!(err, ClientError::TransportError(_)));
}

#[tokio::test]
async fn test_client_errors_from_http_are_not_retried() {
    let store = MemoryStore::new(vec![channel_row(3, "Direct Sales")]);
    let base_url = spawn_server_with(
        store.clone(),
        ServerConfig {
            max_request_bytes: 1024,
            ..Default::default()
        },
    )
    .await;
    let config = ClientConfig {
        base_url: base_url.clone(),
        request_timeout_ms: 5_000,
        transport_retries: 3,
    };
    let client = OrmClient::connect(config).unwrap();

    let ids: Vec<i64> = (1_000_000..1_000_400).collect();
    let err = client
        .table::<Channel>()
        .filter(col("ChannelId").is_in(ids))
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::RequestRejected(ref m) if m.contains("413")));
    assert!(store.executed().is_empty());

    let wrong_route = OrmClient::connect(ClientConfig {
        base_url: format!("{}/v2", base_url),
        request_timeout_ms: 5_000,
        transport_retries: 3,
    })
    .unwrap();
    let err = wrong_route.table::<Channel>().fetch().await.unwrap_err();
    assert!(matches!(err, ClientError::RequestRejected(ref m) if m.contains("404")));
    assert!(!err.is_retryable());
}
