mod command;

use clap::Parser;
use querywire::client::OrmClient;
use querywire::config::ClientConfig;
use reqwest::Client;
use rustyline::{error::ReadlineError, DefaultEditor};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "QUERYWIRE_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Extra attempts after a transport failure
    #[arg(long, default_value_t = 2)]
    retries: u32,
}

fn print_usage() {
    println!("QueryWire Client Commands:");
    println!("  <entity> [clauses]  - Fetch records (default)");
    println!("  :sql <entity> [clauses] - Show the SQL the server would run");
    println!("  :tables             - List catalog tables");
    println!("  :help               - Show this help");
    println!();
    println!("Clauses:");
    println!("  where <path> <op> <value>   ops: = > >= < <= in");
    println!("  and <path> <op> <value>");
    println!("  orderby <path> [desc]");
    println!("  skip <n>   take <n>   include <Relation>[,<Relation>]");
    println!();
    println!("Examples:");
    println!("  Channel");
    println!("  Cost where UnitCost > 1000 orderby UnitCost desc take 5 include Prod");
    println!("  Customer where Country.CountryIsoCode = 'DE' take 3");
    println!("  :sql Sale where ProdId in 13,14,15");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = ClientConfig {
        base_url: args.url.clone(),
        request_timeout_ms: args.timeout_ms,
        transport_retries: args.retries,
    };
    let orm = OrmClient::connect(config)?;
    let http = Client::new();

    println!("\nConnected to QueryWire server at {}.", args.url);
    println!("Type :help for commands.\n");

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("querywire :) ");
        match readline {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                rl.add_history_entry(input)?;

                if input.starts_with(':') {
                    let parts: Vec<&str> = input.splitn(2, ' ').collect();
                    let cmd = parts[0];
                    let arg = parts.get(1).map(|s| s.trim());

                    match cmd {
                        ":help" | ":h" => print_usage(),
                        ":tables" | ":t" => match list_tables(&http, &args.url).await {
                            Ok(response) => print_tables(&response),
                            Err(e) => eprintln!("Error: {}", e),
                        },
                        ":sql" => match arg {
                            Some(query) => match show_sql(&orm, query).await {
                                Ok(sql) => println!("\n{}\n", sql),
                                Err(e) => eprintln!("Error: {}", e),
                            },
                            None => println!("Usage: :sql <entity> [clauses]"),
                        },
                        _ => {
                            println!(
                                "Unknown command: {}. Type :help for available commands.",
                                cmd
                            );
                        }
                    }
                    continue;
                }

                match run_query(&orm, input).await {
                    Ok(records) => print_records(&records),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nBye");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

async fn run_query(orm: &OrmClient, input: &str) -> anyhow::Result<Vec<Value>> {
    let command = command::parse_query(input)?;
    let query = command.apply(orm.table_named(&command.entity));
    Ok(query.fetch().await?)
}

async fn show_sql(orm: &OrmClient, input: &str) -> anyhow::Result<String> {
    let command = command::parse_query(input)?;
    let query = command.apply(orm.table_named(&command.entity));
    Ok(query.to_sql().await?)
}

fn print_records(records: &[Value]) {
    for record in records {
        println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string())
        );
    }
    println!("\n({} rows)\n", records.len());
}

async fn list_tables(client: &Client, url: &str) -> Result<Value, String> {
    let endpoint = format!("{}/tables", url.trim_end_matches('/'));

    let response = client
        .get(&endpoint)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        let text = response.text().await.unwrap_or_default();
        Err(text)
    }
}

fn print_tables(response: &Value) {
    let catalog = response
        .get("catalog")
        .and_then(|c| c.as_str())
        .unwrap_or("?");
    println!("\n=== Catalog: {} ===\n", catalog);

    if let Some(tables) = response.get("tables").and_then(|t| t.as_array()) {
        for table in tables {
            let entity = table.get("entity").and_then(|e| e.as_str()).unwrap_or("?");
            let schema = table.get("schema").and_then(|s| s.as_str()).unwrap_or("");
            let name = table.get("table").and_then(|t| t.as_str()).unwrap_or("?");
            let columns = table
                .get("columns")
                .and_then(|c| c.as_array())
                .map_or(0, |c| c.len());
            print!("  {} -> {}.{} ({} columns)", entity, schema, name, columns);

            if let Some(relations) = table.get("relations").and_then(|r| r.as_array()) {
                let names: Vec<&str> = relations
                    .iter()
                    .filter_map(|r| r.get("name").and_then(|n| n.as_str()))
                    .collect();
                if !names.is_empty() {
                    print!(" includes: {}", names.join(", "));
                }
            }
            println!();
        }
    }
    println!();
}
