//! like-mysql - command line entry point.
//!
//! Runs one schema or query operation against the configured server and
//! prints its result as JSON.

use like_mysql::config::{Command, Config};
use like_mysql::{DatabaseOptions, Find, Mysql, MysqlResult, Value};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout carries only the JSON result
    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn find_from(clause: Option<String>, values: Vec<String>) -> Find {
    let find = clause.map(Find::new).unwrap_or_default();
    values
        .into_iter()
        .fold(find, |find, value| find.bind(Value::String(value)))
}

async fn run(db: &Mysql, command: Command) -> MysqlResult<serde_json::Value> {
    let output = match command {
        Command::Ready { timeout_ms } => {
            db.ready(Duration::from_millis(timeout_ms)).await?;
            serde_json::json!({ "ready": true })
        }
        Command::CreateDatabase {
            name,
            charset,
            collate,
        } => {
            let options = DatabaseOptions { charset, collate };
            serde_json::json!({ "created": db.create_database(&name, &options).await? })
        }
        Command::DropDatabase { name } => {
            serde_json::json!({ "dropped": db.drop_database(&name).await? })
        }
        Command::DropTable { names } => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            serde_json::json!({ "dropped": db.drop_table(&names).await? })
        }
        Command::Select {
            table,
            columns,
            find,
            values,
        } => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let rows = db.select(&table, &columns, &find_from(find, values)).await?;
            serde_json::Value::Array(rows.into_iter().map(serde_json::Value::Object).collect())
        }
        Command::Count {
            table,
            find,
            values,
        } => {
            serde_json::json!({ "count": db.count(&table, &find_from(find, values)).await? })
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() {
    let config = Config::parse_args();

    init_tracing(&config);

    let options = match config.mysql_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    info!(
        options = ?options,
        "Starting like-mysql v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db = Mysql::new(options);
    let result = run(&db, config.command).await;
    db.end().await;

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            let code = e.code().unwrap_or("UNKNOWN");
            error!(code, error = %e, "Operation failed");
            eprintln!("Error [{code}]: {e}");
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {suggestion}");
            }
            std::process::exit(1);
        }
    }
}
