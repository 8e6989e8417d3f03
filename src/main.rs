use clap::Parser;
use tablegql::{config, server};

/// TableGQL - GraphQL surface derivation and query resolution for ClickHouse
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTTP server host address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP server port
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to the entity catalog file (overrides TABLEGQL_CATALOG_PATH)
    #[arg(long)]
    catalog: Option<String>,
}

impl From<Cli> for config::CliConfig {
    fn from(cli: Cli) -> Self {
        config::CliConfig {
            http_host: cli.host,
            http_port: cli.port,
            catalog_path: cli.catalog,
        }
    }
}

#[tokio::main]
async fn main() {
    // Defaults to INFO; override with RUST_LOG.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cli_config: config::CliConfig = cli.into();
    let config = match config::ServerConfig::from_cli(cli_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    server::run_with_config(config).await;
}
