use clap::Parser;
use querywire::{config, server};

/// QueryWire - typed query server over relational tables
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTTP server host address
    #[arg(long, default_value = "0.0.0.0")]
    http_host: String,

    /// HTTP server port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Table catalog YAML (defaults to the embedded Sales History catalog)
    #[arg(long, env = "QUERYWIRE_CATALOG_PATH")]
    catalog: Option<String>,

    /// Server-side deadline for one select, in milliseconds
    #[arg(long, default_value_t = 30000)]
    query_timeout_ms: u64,

    /// Largest accepted request body, in bytes
    #[arg(long, default_value_t = 1048576)]
    max_request_bytes: usize,

    /// Load the whole configuration from a YAML file instead
    #[arg(long, conflicts_with_all = ["http_host", "http_port", "catalog"])]
    config: Option<String>,

    /// Run server in daemon mode (background process)
    #[arg(long)]
    daemon: bool,
}

impl From<Cli> for config::CliConfig {
    fn from(cli: Cli) -> Self {
        config::CliConfig {
            http_host: cli.http_host,
            http_port: cli.http_port,
            catalog_path: cli.catalog,
            query_timeout_ms: cli.query_timeout_ms,
            max_request_bytes: cli.max_request_bytes,
            daemon: cli.daemon,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    println!("\nQueryWire v{}\n", env!("CARGO_PKG_VERSION"));

    let config = match cli.config.clone() {
        Some(path) => config::ServerConfig::from_yaml_file(path),
        None => config::ServerConfig::from_cli(cli.into()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    server::run_with_config(config).await;
}
