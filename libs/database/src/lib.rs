//! Cassandra schema bootstrap library
//!
//! Everything needed to stand up a Cassandra-backed storage layer before the
//! application starts: cluster configuration, keyspace lifecycle, schema
//! loading from ordered fragment files, and timestamp unit conversion.
//!
//! # Features
//!
//! - `cassandra` (default) - Cassandra/ScyllaDB support via the `scylla` driver
//! - `config` - `ClusterConfig` loading with `core_config::FromEnv`
//! - `all` - All features
//!
//! # Examples
//!
//! ```ignore
//! use database::cassandra::{self, ClusterConfig};
//!
//! let session = cassandra::connect(&ClusterConfig::new("127.0.0.1", None)).await?;
//! cassandra::create_keyspace(session.as_ref(), "bootstrap", 1, false).await?;
//! ```

#[cfg(feature = "cassandra")]
pub mod cassandra;
