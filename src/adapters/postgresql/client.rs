//! PostgreSQL client implementation
//!
//! Pooled, TLS-aware connections with a per-statement timeout.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{Result, RosterError, SourceError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

/// PostgreSQL client for Roster
///
/// Read-only access to the LMS schema through a connection pool.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

/// TLS connector for a libpq-style `sslmode`
///
/// `require` encrypts without verifying the server, `verify-ca` checks the
/// chain only, `verify-full` checks chain and host name.
fn tls_connector(ssl_mode: &str) -> Result<MakeTlsConnector> {
    let mut builder = TlsConnector::builder();
    match ssl_mode {
        "verify-full" => {}
        "verify-ca" => {
            builder.danger_accept_invalid_hostnames(true);
        }
        _ => {
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
    }
    let connector = builder
        .build()
        .map_err(|e| RosterError::Database(format!("Failed to build TLS connector: {e}")))?;
    Ok(MakeTlsConnector::new(connector))
}

fn driver_ssl_mode(ssl_mode: &str) -> SslMode {
    match ssl_mode {
        "disable" => SslMode::Disable,
        "allow" | "prefer" => SslMode::Prefer,
        _ => SslMode::Require,
    }
}

/// Map a driver error onto the source error vocabulary
pub(crate) fn query_error(err: tokio_postgres::Error) -> SourceError {
    if err.code() == Some(&SqlState::QUERY_CANCELED) {
        return SourceError::Timeout(err.to_string());
    }
    if err.is_closed() {
        return SourceError::ConnectionFailed(err.to_string());
    }
    SourceError::QueryFailed(err.to_string())
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// # Arguments
    ///
    /// * `config` - PostgreSQL configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or the pool
    /// cannot be built. No connection is opened until the first query.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .parse()
            .map_err(|e| {
                RosterError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;
        pg_config.ssl_mode(driver_ssl_mode(&config.ssl_mode));
        pg_config.connect_timeout(Duration::from_secs(config.connection_timeout_seconds));
        pg_config.application_name("roster");

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = Manager::from_config(
            pg_config,
            tls_connector(&config.ssl_mode)?,
            manager_config,
        );

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .build()
            .map_err(|e| RosterError::Database(format!("Failed to create connection pool: {e}")))?;

        tracing::debug!(
            target_db = %config.connection_string.expose_secret().redacted_url(),
            max_connections = config.max_connections,
            ssl_mode = %config.ssl_mode,
            "PostgreSQL pool created"
        );

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    ///
    /// Attempts to get a connection from the pool and execute a simple query.
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client.query_one("SELECT 1", &[]).await.map_err(|e| {
            RosterError::Source(SourceError::ConnectionFailed(format!(
                "Connection test failed: {e}"
            )))
        })?;

        tracing::info!(
            target_db = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ConnectionFailed`] if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            RosterError::Source(SourceError::ConnectionFailed(format!(
                "Failed to get connection from pool: {e}"
            )))
        })
    }

    /// Execute a query and return rows
    ///
    /// # Arguments
    ///
    /// * `query` - SQL query
    /// * `params` - Query parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails; a cancelled statement is a
    /// [`SourceError::Timeout`].
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.get_connection().await?;

        // Set statement timeout
        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .batch_execute(&timeout_query)
            .await
            .map_err(query_error)?;

        let statement = client.prepare_cached(query).await.map_err(query_error)?;
        Ok(client.query(&statement, params).await.map_err(query_error)?)
    }

    /// Get the connection string (without password)
    pub fn connection_string_safe(&self) -> String {
        self.config.connection_string.expose_secret().redacted_url()
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}
