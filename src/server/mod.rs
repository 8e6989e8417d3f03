//! HTTP server assembly and process-wide startup state.
//!
//! Startup is a single-writer phase: the catalog is built and the resolver
//! registry populated before the listener binds, so request handlers only
//! ever read. Bootstrap failures are fatal; the process refuses to serve a
//! partial schema.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::sync::OnceCell;

use crate::config::ServerConfig;
use crate::query_engine::{ClickHouseExecutor, QueryEngine, ResolverRegistry};
use handlers::{find_handler, health_check, operation_handler, schema_handler};

pub mod bootstrap;
pub mod handlers;
mod models;

/// Process-wide resolver registry, set exactly once during bootstrap.
pub static GLOBAL_RESOLVERS: OnceCell<Arc<ResolverRegistry>> = OnceCell::const_new();

pub struct AppState {
    pub engine: Arc<QueryEngine>,
    pub catalog: Arc<bootstrap::Catalog>,
    pub config: ServerConfig,
}

pub async fn run() {
    dotenv().ok();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    run_with_config(config).await;
}

pub async fn run_with_config(config: ServerConfig) {
    dotenv().ok();

    let executor = match ClickHouseExecutor::try_from_env() {
        Some(executor) => executor,
        None => {
            log::warn!(
                "ClickHouse environment variables not set; \
                 using http://localhost:8123 with defaults"
            );
            ClickHouseExecutor::new(
                clickhouse::Client::default().with_url("http://localhost:8123"),
            )
        }
    };

    let Some(catalog_path) = config.catalog_path.clone() else {
        log::error!("no catalog configured; set TABLEGQL_CATALOG_PATH or pass --catalog");
        std::process::exit(1);
    };

    let declaration = match bootstrap::load_catalog_declaration(&catalog_path) {
        Ok(declaration) => declaration,
        Err(e) => {
            log::error!("failed to load catalog `{catalog_path}`: {e:#}");
            std::process::exit(1);
        }
    };

    let catalog =
        match bootstrap::build_catalog(declaration, Some(executor.client())).await {
            Ok(catalog) => catalog,
            Err(e) => {
                log::error!("catalog bootstrap failed: {e:#}");
                log::error!("the server cannot start with a broken schema");
                std::process::exit(1);
            }
        };

    // Re-invocation is inert: the first registry wins, matching resolver
    // registration semantics.
    let _ = GLOBAL_RESOLVERS.set(catalog.resolvers.clone());

    let engine = Arc::new(QueryEngine::new(
        catalog.resolvers.clone(),
        Arc::new(executor),
    ));
    let state = Arc::new(AppState {
        engine,
        catalog: Arc::new(catalog),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/schema", get(schema_handler))
        .route("/operation", post(operation_handler))
        .route("/api/{entity}/{field}/{value}", get(find_handler))
        .with_state(state);

    let bind_address = format!("{}:{}", config.http_host, config.http_port);
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => {
            log::info!("listening on {bind_address}");
            listener
        }
        Err(e) => {
            log::error!("failed to bind {bind_address}: {e}");
            log::error!("is another process using port {}?", config.http_port);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("server error: {e:?}");
        std::process::exit(1);
    }
}
