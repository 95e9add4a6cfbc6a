use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::policies::host_filter::DcHostFilter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::ClusterConfig;
use super::error::{CassandraError, CassandraResult};

/// Cassandra session shared by the bootstrap steps
pub type CassandraSession = Arc<Session>;

/// The statements the bootstrap issues against an open session
///
/// Implemented for the driver [`Session`]; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CqlExecutor: Send + Sync {
    /// Execute a statement, discarding any rows
    async fn execute(&self, cql: &str) -> CassandraResult<()>;

    /// Run a single-text-column catalog query bound to `keyspace`
    async fn query_names(&self, cql: &str, keyspace: &str) -> CassandraResult<Vec<String>>;
}

#[async_trait]
impl CqlExecutor for Session {
    async fn execute(&self, cql: &str) -> CassandraResult<()> {
        self.query_unpaged(cql, ()).await?;
        Ok(())
    }

    async fn query_names(&self, cql: &str, keyspace: &str) -> CassandraResult<Vec<String>> {
        let rows = self
            .query_unpaged(cql, (keyspace,))
            .await?
            .into_rows_result()
            .map_err(|e| CassandraError::Query(e.to_string()))?;

        rows.rows::<(String,)>()
            .map_err(|e| CassandraError::Query(e.to_string()))?
            .map(|row| {
                row.map(|(name,)| name)
                    .map_err(|e| CassandraError::Query(e.to_string()))
            })
            .collect()
    }
}

/// Open a session from a ClusterConfig
///
/// A config without hosts fails here, not when it was built.
///
/// # Example
/// ```ignore
/// use database::cassandra::{ClusterConfig, connect};
///
/// let config = ClusterConfig::new("127.0.0.1", None);
/// let session = connect(&config).await?;
/// ```
pub async fn connect(config: &ClusterConfig) -> CassandraResult<CassandraSession> {
    let points = config.contact_points();
    info!(
        hosts = ?points,
        data_center = config.data_center(),
        protocol_version = config.protocol_version(),
        "Attempting to connect to Cassandra"
    );

    let mut builder = SessionBuilder::new()
        .known_nodes(&points)
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs()));

    if let Some(dc) = config.data_center() {
        builder = builder.host_filter(Arc::new(DcHostFilter::new(dc.to_string())));
    }

    if let Some((username, password)) = config.credentials() {
        builder = builder.user(username, password);
    }

    if let Some(keyspace) = config.keyspace() {
        builder = builder.use_keyspace(keyspace, false);
    }

    let session = builder.build().await.map_err(|e| {
        error!(error = %e, hosts = ?points, "Failed to connect to Cassandra");
        CassandraError::from(e)
    })?;

    info!("Successfully connected to Cassandra");
    Ok(Arc::new(session))
}
