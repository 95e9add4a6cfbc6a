use std::net::{IpAddr, SocketAddr};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_optional, env_parse, env_required};

/// CQL native protocol version used for every session.
pub const PROTOCOL_VERSION: u8 = 4;

/// Port appended to hosts that don't name one.
pub const DEFAULT_PORT: u16 = 9042;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Cassandra cluster connection configuration
///
/// Built once per bootstrap run from a comma-separated host list and an
/// optional data center. Hosts are never validated here: a configuration with
/// no hosts is accepted and fails when the session is opened.
///
/// # Example
///
/// ```ignore
/// use database::cassandra::ClusterConfig;
///
/// let config = ClusterConfig::new(" cass1, cass2,,cass3 ", Some("dc1"));
/// assert_eq!(config.hosts(), ["cass1", "cass2", "cass3"]);
///
/// // From environment variables (requires `config` feature)
/// let config = ClusterConfig::from_env()?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterConfig {
    hosts: Vec<String>,
    protocol_version: u8,
    data_center: Option<String>,
    port: u16,
    keyspace: Option<String>,
    username: Option<String>,
    password: Option<String>,
    connect_timeout_secs: u64,
}

/// Split a comma-separated host list, trimming entries and dropping empty ones.
pub fn parse_hosts(cluster_hosts: &str) -> Vec<String> {
    cluster_hosts
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(String::from)
        .collect()
}

impl ClusterConfig {
    /// Create a config from a comma-separated host list
    ///
    /// A blank `data_center` is the same as `None`.
    pub fn new(cluster_hosts: &str, data_center: Option<&str>) -> Self {
        let data_center = data_center
            .map(str::trim)
            .filter(|dc| !dc.is_empty())
            .map(String::from);

        Self {
            hosts: parse_hosts(cluster_hosts),
            protocol_version: PROTOCOL_VERSION,
            data_center,
            port: DEFAULT_PORT,
            keyspace: None,
            username: None,
            password: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Set the port used for hosts without an explicit one
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the session's current keyspace
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Data center that connections are restricted to, if any
    pub fn data_center(&self) -> Option<&str> {
        self.data_center.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs
    }

    /// Hosts as driver contact points, with the configured port where none is given
    pub fn contact_points(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| contact_point(host, self.port))
            .collect()
    }
}

fn contact_point(host: &str, port: u16) -> String {
    if host.parse::<SocketAddr>().is_ok() {
        return host.to_string();
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return SocketAddr::new(ip, port).to_string();
    }
    if host.contains(':') {
        // hostname:port
        return host.to_string();
    }
    format!("{host}:{port}")
}

/// Load ClusterConfig from environment variables
///
/// Environment variables:
/// - `CASSANDRA_HOSTS` (required) - Comma-separated host list
/// - `CASSANDRA_DATACENTER` (optional) - Restrict connections to this data center
/// - `CASSANDRA_PORT` (optional, default: 9042)
/// - `CASSANDRA_KEYSPACE` (optional) - Session keyspace
/// - `CASSANDRA_USERNAME` / `CASSANDRA_PASSWORD` (optional)
/// - `CASSANDRA_CONNECT_TIMEOUT_SECS` (optional, default: 10)
///
/// An empty host list is not rejected here.
#[cfg(feature = "config")]
impl FromEnv for ClusterConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let hosts = env_required("CASSANDRA_HOSTS")?;
        let data_center = env_optional("CASSANDRA_DATACENTER");

        let mut config = Self::new(&hosts, data_center.as_deref())
            .with_port(env_parse("CASSANDRA_PORT", DEFAULT_PORT)?)
            .with_connect_timeout(env_parse(
                "CASSANDRA_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?);

        if let Some(keyspace) = env_optional("CASSANDRA_KEYSPACE") {
            config = config.with_keyspace(keyspace);
        }

        if let (Some(username), Some(password)) = (
            env_optional("CASSANDRA_USERNAME"),
            env_optional("CASSANDRA_PASSWORD"),
        ) {
            config = config.with_credentials(username, password);
        }

        Ok(config)
    }
}
