//! Query execution against ClickHouse.
//!
//! Every generated query returns at most one payload row (single fetches via
//! `LIMIT 1`, list fetches via aggregation), so the executor contract is a
//! single forward read from the row cursor. The cursor is dropped on every
//! exit path, which releases the underlying connection slot whether the read
//! succeeded, matched nothing, or was cancelled.

use std::env;

use async_trait::async_trait;
use clickhouse::Client;
use tokio::io::AsyncBufReadExt;

use super::errors::ExecutionError;

/// Backend seam: execute query text and hand back the first pre-shaped JSON
/// payload row, if any.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch_first(&self, sql: &str) -> Result<Option<String>, ExecutionError>;
}

/// Production executor over the ClickHouse HTTP client.
#[derive(Clone)]
pub struct ClickHouseExecutor {
    client: Client,
}

impl ClickHouseExecutor {
    pub fn new(client: Client) -> Self {
        ClickHouseExecutor { client }
    }

    /// Build a client from `CLICKHOUSE_URL`/`_USER`/`_PASSWORD`/`_DATABASE`.
    /// Returns `None` when any of them is unset.
    pub fn try_from_env() -> Option<Self> {
        let url = env::var("CLICKHOUSE_URL").ok()?;
        let user = env::var("CLICKHOUSE_USER").ok()?;
        let password = env::var("CLICKHOUSE_PASSWORD").ok()?;
        let database = env::var("CLICKHOUSE_DATABASE").ok()?;

        log::info!("connecting to ClickHouse at {url} (database `{database}`)");
        let client = Client::default()
            .with_url(url)
            .with_user(user)
            .with_password(password)
            .with_database(database)
            .with_option("join_use_nulls", "1");
        Some(ClickHouseExecutor { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl QueryExecutor for ClickHouseExecutor {
    async fn fetch_first(&self, sql: &str) -> Result<Option<String>, ExecutionError> {
        log::debug!("executing SQL:\n{sql}");

        // TabSeparatedRaw keeps the payload column byte-for-byte; the JSON
        // documents inside never contain literal newlines or tabs (JSON
        // escapes all control characters), so one line is one row.
        let mut lines = self
            .client
            .query(sql)
            .fetch_bytes("TabSeparatedRaw")
            .map_err(|e| {
                log::error!("ClickHouse query failed. SQL was:\n{sql}\nError: {e}");
                ExecutionError::Backend(e)
            })?
            .lines();

        let line = lines.next_line().await?;
        Ok(line.filter(|payload| !payload.is_empty()))
    }
}
