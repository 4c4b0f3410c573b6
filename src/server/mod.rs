use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use handlers::{health_check, list_tables_handler, select_handler, sql_preview_handler};

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer};

use crate::config::ServerConfig;
use crate::table_catalog::{self, TableCatalog};

mod clickhouse_client;
pub mod handlers;
pub mod models;
pub mod select_service;
pub mod store;

pub use models::{error_kind, SelectReply, SelectRequest, SqlPreviewReply};
pub use select_service::{SelectError, SelectService};
pub use store::{ClickHouseStore, JsonLinesCursor, MemoryStore, RowCursor, Store, StoreError};

pub struct AppState {
    pub select_service: SelectService,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, catalog: Arc<TableCatalog>, config: ServerConfig) -> Self {
        let query_timeout = Duration::from_millis(config.query_timeout_ms);
        AppState {
            select_service: SelectService::new(store, catalog, query_timeout),
            config,
        }
    }
}

/// HTTP routes with the request size limit and panic catching applied.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_request_bytes = app_state.config.max_request_bytes;
    Router::new()
        .route("/health", get(health_check))
        .route("/tables", get(list_tables_handler))
        .route("/select/{entity}", post(select_handler))
        .route("/sql/{entity}", post(sql_preview_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_request_bytes))
        .layer(CatchPanicLayer::new())
        .with_state(app_state)
}

pub async fn run_with_config(config: ServerConfig) {
    dotenv().ok();

    log::info!(
        "Server configuration: http={}:{}, query_timeout={}ms",
        config.http_host,
        config.http_port,
        config.query_timeout_ms
    );

    let catalog = match table_catalog::load_catalog(config.catalog_path.as_deref()) {
        Ok(catalog) => {
            log::info!("Table catalog loaded with {} tables", catalog.len());
            Arc::new(catalog)
        }
        Err(e) => {
            log::error!("✗ Failed to load table catalog: {}", e);
            log::error!("  Server cannot start without a table catalog.");
            std::process::exit(1);
        }
    };

    let client = match clickhouse_client::try_get_client() {
        Some(client) => {
            log::info!("✓ ClickHouse client created successfully");
            client
        }
        None => {
            log::warn!("⚠ ClickHouse client could not be created (missing env vars?)");
            log::warn!("  Falling back to http://localhost:8123; selects will fail until it is reachable.");
            clickhouse::Client::default().with_url("http://localhost:8123")
        }
    };

    let app_state = Arc::new(AppState::new(
        Arc::new(ClickHouseStore::new(client)),
        catalog,
        config.clone(),
    ));

    let http_bind_address = format!("{}:{}", config.http_host, config.http_port);
    log::info!("Starting HTTP server on {}", http_bind_address);

    let app = router(app_state);

    let http_listener = match TcpListener::bind(&http_bind_address).await {
        Ok(listener) => {
            log::info!("Successfully bound HTTP listener to {}", http_bind_address);
            listener
        }
        Err(e) => {
            log::error!(
                "✗ FATAL: Failed to bind HTTP listener to {}: {}",
                http_bind_address,
                e
            );
            log::error!("  Is another process using port {}?", config.http_port);
            std::process::exit(1);
        }
    };

    let http_server = axum::serve(http_listener, app);

    println!("QueryWire server is running");
    println!("  HTTP API: http://{}", http_bind_address);

    if config.daemon {
        println!("Running in daemon mode - press Ctrl+C to stop");

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        log::error!("Failed to register signal handlers: {}. Server will run without graceful shutdown.", e);
                        if let Err(e) = http_server.await {
                            log::error!("HTTP server error: {:?}", e);
                        }
                        return;
                    }
                };

            tokio::select! {
                result = http_server => {
                    if let Err(e) = result {
                        log::error!("HTTP server error: {:?}", e);
                    }
                }
                _ = sigterm.recv() => println!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => println!("Received SIGINT, shutting down..."),
            }
        }

        #[cfg(windows)]
        {
            tokio::select! {
                result = http_server => {
                    if let Err(e) = result {
                        log::error!("HTTP server error: {:?}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("Received shutdown signal, shutting down...");
                }
            }
        }

        println!("Server stopped");
    } else if let Err(e) = http_server.await {
        log::error!("HTTP server fatal error: {:?}", e);
        std::process::exit(1);
    }
}
