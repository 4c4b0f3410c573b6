use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tokio_util::sync::CancellationToken;

use super::{
    models::{SelectRequest, SqlPreviewReply, TablesResponse},
    AppState,
};

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "querywire",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List the table catalog.
pub async fn list_tables_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let catalog = app_state.select_service.catalog();
    Json(serde_json::to_value(TablesResponse {
        catalog: catalog.name(),
        tables: catalog.tables().collect(),
    })
    .unwrap_or_default())
}

/// The select RPC. Always answers 200; failures are carried in the reply.
pub async fn select_handler(
    State(app_state): State<Arc<AppState>>,
    Path(entity): Path<String>,
    Json(payload): Json<SelectRequest>,
) -> impl IntoResponse {
    log::debug!("Select handler called for {}: {}", entity, payload.request);

    // Cancelled when the connection drops and this future is dropped.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let reply = app_state
        .select_service
        .select(&entity, &payload, &cancel)
        .await;
    Json(reply)
}

/// Compile a request and return the SQL it would run, without executing.
pub async fn sql_preview_handler(
    State(app_state): State<Arc<AppState>>,
    Path(entity): Path<String>,
    Json(payload): Json<SelectRequest>,
) -> impl IntoResponse {
    let reply = match app_state.select_service.compile(&entity, &payload.request) {
        Ok(compiled) => SqlPreviewReply {
            sql: compiled.sql,
            ..Default::default()
        },
        Err(err) => SqlPreviewReply {
            sql: String::new(),
            error_message: err.to_string(),
            error_kind: err.kind().to_string(),
        },
    };
    Json(reply)
}
