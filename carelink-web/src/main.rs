//! carelink-web server binary

use carelink_core::{init_logging, LoggingConfig};
use carelink_web::{server, WebConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "carelink-web", about = "Carelink REST API server")]
struct Args {
    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database URL (falls back to DATABASE_URL, then in-memory)
    #[arg(long)]
    database_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let logging = LoggingConfig {
        level: args.log_level.clone(),
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(|e| anyhow::anyhow!("failed to init logging: {}", e))?;

    let mut config = WebConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = Some(database_url);
    }

    server::run(config).await
}
