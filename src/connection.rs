//! Connection provider and pooling utilities
//!
//! [`Connection`] is the seam every helper talks to: it runs one raw
//! statement and either reports the execution result or returns the rows as
//! text. [`PoolRegistry`] resolves connection names to sqlx pools, creating
//! each pool on first use.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::any::AnyRow;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};

use crate::config::{DbUtilConfig, PoolSettings};
use crate::dsn::{driver_url, parse_dsn};
use crate::error::DatabaseError;
use crate::timeout::execute_with_timeout;
use crate::types::{DatabaseType, StatementOutcome};

type ConnectionCell = Arc<OnceCell<Arc<dyn Connection>>>;

/// A live database handle able to run raw SQL
#[async_trait]
pub trait Connection: Send + Sync {
    /// Logical connection name
    fn name(&self) -> &str;

    /// Execute a statement and return the driver's execution result
    async fn execute(&self, sql: &str) -> Result<StatementOutcome, DatabaseError>;

    /// Run a query and collect the first column of every row, in server order
    async fn fetch_first_column(&self, sql: &str) -> Result<Vec<String>, DatabaseError>;

    /// Run a query and return every row as text, NULL read as an empty string
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Vec<String>>, DatabaseError>;

    /// Release underlying resources
    async fn close(&self) {}
}

/// Resolves an optional connection name to a live [`Connection`]
///
/// `None` selects the provider's default connection.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connection(&self, name: Option<&str>) -> Result<Arc<dyn Connection>, DatabaseError>;
}

/// [`Connection`] backed by a sqlx `AnyPool`
///
/// Statements go out unprepared over the text protocol, the same way the
/// `mysql` client sends them.
pub struct SqlxConnection {
    name: String,
    pool: AnyPool,
    statement_timeout: Option<Duration>,
}

impl SqlxConnection {
    pub fn new(
        name: impl Into<String>,
        pool: AnyPool,
        statement_timeout: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            statement_timeout,
        }
    }
}

#[async_trait]
impl Connection for SqlxConnection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, sql: &str) -> Result<StatementOutcome, DatabaseError> {
        log::debug!("[{}] execute: {}", self.name, sql);
        let result = execute_with_timeout(
            self.statement_timeout,
            sql,
            sqlx::raw_sql(sql).execute(&self.pool),
        )
        .await?;
        Ok(result.into())
    }

    async fn fetch_first_column(&self, sql: &str) -> Result<Vec<String>, DatabaseError> {
        log::debug!("[{}] query: {}", self.name, sql);
        let rows = execute_with_timeout(
            self.statement_timeout,
            sql,
            sqlx::raw_sql(sql).fetch_all(&self.pool),
        )
        .await?;

        rows.iter()
            .map(|row| first_column(row).map_err(|e| DatabaseError::statement(sql, e)))
            .collect()
    }

    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Vec<String>>, DatabaseError> {
        log::debug!("[{}] query: {}", self.name, sql);
        let rows = execute_with_timeout(
            self.statement_timeout,
            sql,
            sqlx::raw_sql(sql).fetch_all(&self.pool),
        )
        .await?;

        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|index| column_text(row, index))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| DatabaseError::statement(sql, e))
            })
            .collect()
    }

    async fn close(&self) {
        log::info!("Closing connection pool '{}'", self.name);
        self.pool.close().await;
    }
}

/// Read column 0 as text, decoding binary-typed names lossily
fn first_column(row: &AnyRow) -> Result<String, sqlx::Error> {
    match row.try_get::<String, _>(0) {
        Ok(value) => Ok(value),
        Err(_) => row
            .try_get::<Vec<u8>, _>(0)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
    }
}

fn column_text(row: &AnyRow, index: usize) -> Result<String, sqlx::Error> {
    match row.try_get::<Option<String>, _>(index) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(_) => row.try_get::<Option<Vec<u8>>, _>(index).map(|bytes| {
            bytes
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default()
        }),
    }
}

/// Warm up connection pool by pre-establishing min_connections
///
/// Concurrently acquires min_connections to force pool establishment, so an
/// unreachable server is reported when the connection is first resolved.
///
/// # Errors
/// Returns error if all warmup connections fail
pub async fn warmup_pool(pool: &AnyPool, min_connections: u32) -> Result<(), DatabaseError> {
    if min_connections == 0 {
        return Ok(());
    }

    let start = Instant::now();

    let mut handles = Vec::new();
    for i in 0..min_connections {
        let pool_clone = pool.clone();
        let handle = tokio::spawn(async move {
            sqlx::query("SELECT 1")
                .fetch_one(&pool_clone)
                .await
                .map_err(|e| format!("Warmup connection {} failed: {}", i + 1, e))
        });
        handles.push(handle);
    }

    let mut success_count = 0;
    let mut last_error = None;
    for (i, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(_)) => success_count += 1,
            Ok(Err(e)) => {
                log::warn!("Connection {} warmup failed: {}", i + 1, e);
                last_error = Some(e);
            }
            Err(e) => log::warn!("Connection {} warmup task panicked: {}", i + 1, e),
        }
    }

    let elapsed = start.elapsed();

    if success_count == 0 {
        return Err(DatabaseError::ConnectionError(format!(
            "Pool warmup failed: 0/{} connections established ({})",
            min_connections,
            last_error.unwrap_or_else(|| "no error reported".to_string())
        )));
    }

    log::info!(
        "Connection pool warmed up: {}/{} connections ready ({:?})",
        success_count,
        min_connections,
        elapsed
    );

    if elapsed > Duration::from_secs(2) {
        log::warn!(
            "Pool warmup was slow ({:?}), statements may see high latency",
            elapsed
        );
    }

    Ok(())
}

/// Build a connection pool for one DSN
///
/// Installs the sqlx drivers, applies the pool settings, pings every new
/// connection and warms up `min_connections`.
pub async fn setup_pool(dsn: &str, settings: &PoolSettings) -> Result<AnyPool, DatabaseError> {
    let safe_dsn = parse_dsn(dsn)
        .map(|info| info.to_safe_dsn())
        .map_err(|e| DatabaseError::Configuration(e.to_string()))?;

    // Registers the compiled-in drivers; must run before any AnyPool exists
    sqlx::any::install_default_drivers();

    let pool = PoolOptions::<Any>::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(Some(settings.idle_timeout()))
        .max_lifetime(Some(settings.max_lifetime()))
        .test_before_acquire(true)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("SELECT 1").fetch_one(conn).await?;
                Ok(())
            })
        })
        .connect(&driver_url(dsn))
        .await
        .map_err(|e| {
            DatabaseError::ConnectionError(format!("Failed to connect to {}: {}", safe_dsn, e))
        })?;

    warmup_pool(&pool, settings.min_connections).await?;

    log::info!("Database connected: {}", safe_dsn);

    Ok(pool)
}

/// Connection provider backed by one lazily created pool per configured name
///
/// The map lock is only held to find a name's slot. Opening a pool happens
/// outside it, so a slow server never stalls lookups of other names.
pub struct PoolRegistry {
    config: DbUtilConfig,
    connections: Mutex<HashMap<String, ConnectionCell>>,
}

impl PoolRegistry {
    pub fn new(config: DbUtilConfig) -> Self {
        Self {
            config,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Name an operation will use for `name`
    pub fn resolve_name<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.unwrap_or(&self.config.default_connection)
    }

    /// Close every pool opened so far
    pub async fn close(&self) {
        let cells: Vec<ConnectionCell> = {
            let mut connections = self.connections.lock().await;
            connections.drain().map(|(_, cell)| cell).collect()
        };
        for cell in cells {
            if let Some(connection) = cell.get() {
                connection.close().await;
            }
        }
    }

    async fn slot(&self, name: &str) -> ConnectionCell {
        let mut connections = self.connections.lock().await;
        Arc::clone(connections.entry(name.to_string()).or_default())
    }

    async fn open(&self, name: &str) -> Result<Arc<dyn Connection>, DatabaseError> {
        let settings = self
            .config
            .connections
            .get(name)
            .ok_or_else(|| DatabaseError::UnknownConnection(name.to_string()))?;

        let dsn = settings.dsn.expose_secret();
        let db_type = DatabaseType::from_url(dsn)?;
        let pool = setup_pool(dsn, &self.config.pool).await?;

        log::info!("Opened {} connection '{}'", db_type, name);

        Ok(Arc::new(SqlxConnection::new(
            name,
            pool,
            self.config.statement_timeout(),
        )))
    }
}

#[async_trait]
impl ConnectionProvider for PoolRegistry {
    async fn connection(&self, name: Option<&str>) -> Result<Arc<dyn Connection>, DatabaseError> {
        let name = self.resolve_name(name);
        if !self.config.connections.contains_key(name) {
            return Err(DatabaseError::UnknownConnection(name.to_string()));
        }

        // A failed open leaves the cell empty, so the next call retries
        let cell = self.slot(name).await;
        let connection = cell.get_or_try_init(|| self.open(name)).await?;
        Ok(Arc::clone(connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_connection_fails_without_connecting() {
        let mut config = DbUtilConfig::default();
        config.add_connection("default", "mysql://app@127.0.0.1:1/shop");
        let registry = PoolRegistry::new(config);

        let result = registry.connection(Some("reporting")).await;
        assert!(matches!(
            result,
            Err(DatabaseError::UnknownConnection(ref name)) if name == "reporting"
        ));
    }

    #[tokio::test]
    async fn slow_open_does_not_hold_up_other_lookups() {
        // Accepts TCP but never sends the server greeting
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let silent_server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut config = DbUtilConfig::default();
        config.add_connection("slow", &format!("mysql://app@127.0.0.1:{}/shop", port));
        config.pool.acquire_timeout_secs = 2;
        let registry = Arc::new(PoolRegistry::new(config));

        let opening = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.connection(Some("slow")).await.is_ok() })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = Instant::now();
        let result = registry.connection(Some("missing")).await;
        registry.close().await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(
            result,
            Err(DatabaseError::UnknownConnection(ref name)) if name == "missing"
        ));

        opening.abort();
        silent_server.abort();
    }

    #[tokio::test]
    async fn mixed_case_scheme_reaches_the_driver() {
        let mut config = DbUtilConfig::default();
        config
            .apply_vars([
                ("DATABASE_DSN", "MySQL://app@127.0.0.1:1/shop"),
                ("DB_ACQUIRE_TIMEOUT_SECS", "1"),
            ])
            .expect("mixed-case scheme is valid");
        let registry = PoolRegistry::new(config);

        // Port 1 refuses the connection; the scheme itself must be accepted
        let result = registry.connection(None).await;
        assert!(matches!(result, Err(DatabaseError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn default_name_is_resolved_from_config() {
        let mut config = DbUtilConfig::default();
        config.default_connection = "primary".to_string();
        let registry = PoolRegistry::new(config);

        assert_eq!(registry.resolve_name(None), "primary");
        assert_eq!(registry.resolve_name(Some("other")), "other");
        assert!(matches!(
            registry.connection(None).await,
            Err(DatabaseError::UnknownConnection(ref name)) if name == "primary"
        ));
    }
}
