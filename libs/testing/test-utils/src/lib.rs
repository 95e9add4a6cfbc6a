//! Shared test utilities for the schema bootstrap crates
//!
//! - `TestCassandra`: Cassandra container with automatic cleanup (feature: "cassandra")
//! - `TestDataBuilder`: Deterministic keyspace and fragment names (always available)
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::{TestCassandra, TestDataBuilder};
//!
//! #[tokio::test]
//! #[ignore] // Requires Docker
//! async fn my_cassandra_test() {
//!     let cassandra = TestCassandra::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_cassandra_test");
//!
//!     let keyspace = builder.keyspace("bootstrap");
//! }
//! ```

#[cfg(feature = "cassandra")]
mod cassandra;

#[cfg(feature = "cassandra")]
pub use cassandra::TestCassandra;

/// Builder for test data with deterministic names
///
/// Tests sharing one Cassandra node get distinct keyspaces while reruns of the
/// same test reuse the same names.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_overwrite_keyspace");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a keyspace name that is a valid unquoted CQL identifier
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let keyspace = TestDataBuilder::new(42).keyspace("bootstrap");
    /// assert_eq!(keyspace, "test_bootstrap_000000000000002a");
    /// ```
    pub fn keyspace(&self, prefix: &str) -> String {
        format!("test_{}_{:016x}", prefix, self.seed)
    }

    /// Generate a schema fragment file name
    pub fn fragment_name(&self, suffix: &str) -> String {
        format!("{:016x}_{}.cql", self.seed, suffix)
    }
}
