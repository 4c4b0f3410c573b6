use std::env;

use clickhouse::Client;

fn read_env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Build a client from `CLICKHOUSE_URL`, `CLICKHOUSE_USER`,
/// `CLICKHOUSE_PASSWORD` and `CLICKHOUSE_DATABASE`. `None` when any is unset.
pub fn try_get_client() -> Option<Client> {
    let url = read_env_var("CLICKHOUSE_URL")?;
    let user = read_env_var("CLICKHOUSE_USER")?;
    let password = read_env_var("CLICKHOUSE_PASSWORD")?;
    let database = read_env_var("CLICKHOUSE_DATABASE")?;

    log::info!("Connecting to ClickHouse at {} (database {})", url, database);
    Some(
        Client::default()
            .with_url(url)
            .with_user(user)
            .with_password(password)
            .with_database(database)
            .with_option("join_use_nulls", "1") // Return NULL for unmatched LEFT JOIN columns
            .with_option("output_format_json_quote_64bit_integers", "1")
            .with_option("output_format_json_quote_decimals", "1"),
    )
}
