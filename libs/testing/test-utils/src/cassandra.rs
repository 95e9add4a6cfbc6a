//! Cassandra test infrastructure
//!
//! Provides a `TestCassandra` helper that starts a single-node Cassandra
//! container for integration tests.

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

const CQL_PORT: u16 = 9042;

/// Test Cassandra wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestCassandra;
///
/// # async fn example() {
/// let cassandra = TestCassandra::new().await;
/// let contact_point = cassandra.contact_point();
/// // Build a ClusterConfig from `contact_point` and connect
/// # }
/// ```
pub struct TestCassandra {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    port: u16,
}

impl TestCassandra {
    /// Start a Cassandra 4.1 container and wait until it accepts CQL clients
    pub async fn new() -> Self {
        let image = GenericImage::new("cassandra", "4.1")
            .with_exposed_port(CQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout(
                "Starting listening for CQL clients",
            ))
            .with_env_var("MAX_HEAP_SIZE", "512M")
            .with_env_var("HEAP_NEWSIZE", "128M");

        let container = image
            .start()
            .await
            .expect("Failed to start Cassandra container");

        let port = container
            .get_host_port_ipv4(CQL_PORT)
            .await
            .expect("Failed to get Cassandra port");

        tracing::info!(port, "Test Cassandra ready (Cassandra 4.1)");

        Self { container, port }
    }

    /// Host port mapped to the container's CQL port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` contact point for the mapped CQL port, usable as a host list
    pub fn contact_point(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

// Container is automatically cleaned up when TestCassandra is dropped
impl Drop for TestCassandra {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Cassandra container");
    }
}
