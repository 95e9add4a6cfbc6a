use scylla::errors::{ExecutionError, NewSessionError};
use std::path::PathBuf;

/// Error type for Cassandra session and DDL operations
#[derive(Debug, thiserror::Error)]
pub enum CassandraError {
    #[error("Cassandra session error: {0}")]
    Session(#[from] NewSessionError),

    /// Driver execution failure, passed through unchanged
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid keyspace name '{0}': expected 1-48 characters of [A-Za-z0-9_]")]
    InvalidKeyspace(String),

    #[error("Invalid replication factor {0}: must be at least 1")]
    InvalidReplicationFactor(u32),
}

/// Error type for composing and applying schema scripts
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("error creating tmp file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("error reading contents of file {file}: {source}")]
    ReadFragment {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing composite schema script: {0}")]
    WriteScript(#[source] std::io::Error),

    #[error("error reading schema script {}: {source}", .path.display())]
    ReadScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error executing statement `{statement}`: {source}")]
    Statement {
        statement: String,
        #[source]
        source: CassandraError,
    },

    #[error("schema versioning is not supported; set disable_versioning")]
    VersioningUnsupported,

    #[error(transparent)]
    Cassandra(#[from] CassandraError),

    #[error("error loading schema: {0}")]
    Load(#[source] Box<SchemaError>),
}

pub type CassandraResult<T> = Result<T, CassandraError>;
pub type SchemaResult<T> = Result<T, SchemaError>;
