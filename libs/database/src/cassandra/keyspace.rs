use tracing::{debug, error, info, warn};

use super::connector::CqlExecutor;
use super::error::{CassandraError, CassandraResult};

/// Longest keyspace name Cassandra accepts.
const MAX_KEYSPACE_NAME_LEN: usize = 48;

/// A keyspace to create
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyspaceSpec {
    pub name: String,
    pub replication_factor: u32,
    /// Drop any existing keyspace of the same name first. Destroys its data.
    pub overwrite: bool,
}

impl KeyspaceSpec {
    pub fn new(name: impl Into<String>, replication_factor: u32) -> Self {
        Self {
            name: name.into(),
            replication_factor,
            overwrite: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// What `create_keyspace` does when the drop before an overwrite fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DropFailurePolicy {
    /// Log the drop error and issue the create anyway
    #[default]
    LogAndContinue,
    /// Return the drop error without issuing the create
    Propagate,
}

/// Creates and drops keyspaces against an open session
///
/// Calls are not coordinated: two overlapping overwrites of the same keyspace
/// can interleave their drop and create, so run one bootstrap per keyspace.
#[derive(Clone, Debug, Default)]
pub struct KeyspaceManager {
    drop_failure_policy: DropFailurePolicy,
}

impl KeyspaceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drop_failure_policy(mut self, policy: DropFailurePolicy) -> Self {
        self.drop_failure_policy = policy;
        self
    }

    pub fn drop_failure_policy(&self) -> DropFailurePolicy {
        self.drop_failure_policy
    }

    /// Create the keyspace with SimpleStrategy replication if it doesn't exist
    ///
    /// With `overwrite` set the keyspace is dropped first, unconditionally.
    /// DDL failures are logged and returned; nothing is retried.
    ///
    /// # Example
    /// ```ignore
    /// use database::cassandra::{KeyspaceManager, KeyspaceSpec, connect};
    ///
    /// let session = connect(&config).await?;
    /// KeyspaceManager::new()
    ///     .create_keyspace(session.as_ref(), &KeyspaceSpec::new("bootstrap", 1))
    ///     .await?;
    /// ```
    pub async fn create_keyspace<E>(&self, session: &E, spec: &KeyspaceSpec) -> CassandraResult<()>
    where
        E: CqlExecutor + ?Sized,
    {
        validate_keyspace_name(&spec.name)?;
        if spec.replication_factor == 0 {
            return Err(CassandraError::InvalidReplicationFactor(0));
        }

        if spec.overwrite {
            if let Err(e) = self.drop_keyspace(session, &spec.name).await {
                match self.drop_failure_policy {
                    DropFailurePolicy::LogAndContinue => {
                        warn!(keyspace = %spec.name, error = %e, "Continuing with create after failed drop");
                    }
                    DropFailurePolicy::Propagate => return Err(e),
                }
            }
        }

        let cql = create_keyspace_cql(&spec.name, spec.replication_factor);
        if let Err(e) = session.execute(&cql).await {
            error!(keyspace = %spec.name, error = %e, "create keyspace error");
            return Err(e);
        }

        debug!(
            keyspace = %spec.name,
            replication_factor = spec.replication_factor,
            "created keyspace"
        );
        Ok(())
    }

    /// Drop the keyspace if it exists
    ///
    /// Dropping a keyspace that doesn't exist succeeds.
    pub async fn drop_keyspace<E>(&self, session: &E, keyspace: &str) -> CassandraResult<()>
    where
        E: CqlExecutor + ?Sized,
    {
        validate_keyspace_name(keyspace)?;

        if let Err(e) = session.execute(&drop_keyspace_cql(keyspace)).await {
            error!(keyspace, error = %e, "drop keyspace error");
            return Err(e);
        }

        info!(keyspace, "dropped keyspace");
        Ok(())
    }
}

/// Create a keyspace with the default drop failure policy
pub async fn create_keyspace<E>(
    session: &E,
    keyspace: &str,
    replicas: u32,
    overwrite: bool,
) -> CassandraResult<()>
where
    E: CqlExecutor + ?Sized,
{
    let spec = KeyspaceSpec::new(keyspace, replicas).with_overwrite(overwrite);
    KeyspaceManager::new().create_keyspace(session, &spec).await
}

/// Drop a keyspace if it exists
pub async fn drop_keyspace<E>(session: &E, keyspace: &str) -> CassandraResult<()>
where
    E: CqlExecutor + ?Sized,
{
    KeyspaceManager::new().drop_keyspace(session, keyspace).await
}

/// Keyspace names are interpolated into CQL, so only unquoted identifiers pass.
pub fn validate_keyspace_name(keyspace: &str) -> CassandraResult<()> {
    let valid = !keyspace.is_empty()
        && keyspace.len() <= MAX_KEYSPACE_NAME_LEN
        && keyspace.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(CassandraError::InvalidKeyspace(keyspace.to_string()))
    }
}

pub(crate) fn create_keyspace_cql(keyspace: &str, replication_factor: u32) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {replication_factor}}}"
    )
}

pub(crate) fn drop_keyspace_cql(keyspace: &str) -> String {
    format!("DROP KEYSPACE IF EXISTS {keyspace}")
}
