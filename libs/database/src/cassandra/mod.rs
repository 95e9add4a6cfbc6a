//! Cassandra/ScyllaDB schema bootstrap
//!
//! Builds cluster configuration, creates and drops keyspaces, loads schema
//! scripts assembled from ordered fragment files, and converts CQL timestamps.
//! Uses the `scylla` driver, which speaks to both Apache Cassandra and
//! ScyllaDB.
//!
//! # Example
//!
//! ```ignore
//! use database::cassandra::{
//!     ClusterConfig, CqlSchemaSetup, KeyspaceManager, KeyspaceSpec, SchemaBundle, connect,
//!     load_schema,
//! };
//!
//! let config = ClusterConfig::new("cass1, cass2", Some("dc1"));
//! let session = connect(&config).await?;
//!
//! let spec = KeyspaceSpec::new("bootstrap", 3).with_overwrite(true);
//! KeyspaceManager::new().create_keyspace(session.as_ref(), &spec).await?;
//!
//! let bundle = SchemaBundle::new("schema/cassandra", ["types.cql", "tables.cql"], "bootstrap");
//! load_schema(&bundle, &CqlSchemaSetup::new()).await?;
//! ```

mod applier;
mod config;
mod connector;
mod error;
mod keyspace;
mod schema;
pub mod timestamp;

pub use applier::{CqlSchemaSetup, apply_schema, parse_cql};
pub use config::{ClusterConfig, DEFAULT_PORT, PROTOCOL_VERSION, parse_hosts};
pub use connector::{CassandraSession, CqlExecutor, connect};
pub use error::{CassandraError, CassandraResult, SchemaError, SchemaResult};
pub use keyspace::{
    DropFailurePolicy, KeyspaceManager, KeyspaceSpec, create_keyspace, drop_keyspace,
    validate_keyspace_name,
};
pub use schema::{
    SCHEMA_HOST, SchemaBundle, SchemaSetup, SetupSchemaConfig, load_cassandra_schema,
    load_schema, write_composite_script,
};
pub use timestamp::{cql_timestamp_to_unix_nanos, unix_nanos_to_cql_timestamp};

// Re-export scylla types for convenience
pub use scylla::client::session::Session;
pub use scylla::client::session_builder::SessionBuilder;
pub use scylla::value::CqlTimestamp;
