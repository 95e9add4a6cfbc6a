use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::config::{ClusterConfig, DEFAULT_PORT};
use super::connector::{CqlExecutor, connect};
use super::error::{SchemaError, SchemaResult};
use super::schema::{SchemaSetup, SetupSchemaConfig};

const LIST_TABLES_CQL: &str = "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?";
const LIST_TYPES_CQL: &str = "SELECT type_name FROM system_schema.types WHERE keyspace_name = ?";

/// Applies schema scripts over a fresh driver session
///
/// The target keyspace must already exist. Version tracking is not
/// implemented, so configs must set `disable_versioning`.
#[derive(Clone, Debug)]
pub struct CqlSchemaSetup {
    port: u16,
    connect_timeout_secs: Option<u64>,
}

impl Default for CqlSchemaSetup {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_secs: None,
        }
    }
}

impl CqlSchemaSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Port for hosts in the config that don't carry one
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl SchemaSetup for CqlSchemaSetup {
    async fn setup_schema(&self, config: &SetupSchemaConfig) -> SchemaResult<()> {
        if !config.disable_versioning {
            return Err(SchemaError::VersioningUnsupported);
        }

        let mut cluster = ClusterConfig::new(&config.hosts, None)
            .with_port(self.port)
            .with_keyspace(&config.keyspace);
        if let Some(secs) = self.connect_timeout_secs {
            cluster = cluster.with_connect_timeout(secs);
        }

        let session = connect(&cluster).await?;
        apply_schema(session.as_ref(), config).await
    }
}

/// Apply the config's script through an open session
///
/// The script is read and split before anything is dropped, so an unreadable
/// script leaves the keyspace untouched. Statements run in file order and the
/// first failure stops the run.
pub async fn apply_schema<E>(session: &E, config: &SetupSchemaConfig) -> SchemaResult<()>
where
    E: CqlExecutor + ?Sized,
{
    if !config.disable_versioning {
        return Err(SchemaError::VersioningUnsupported);
    }

    let content = tokio::fs::read_to_string(&config.schema_file_path)
        .await
        .map_err(|source| SchemaError::ReadScript {
            path: config.schema_file_path.clone(),
            source,
        })?;
    let statements = parse_cql(&content);

    if config.overwrite {
        drop_all_tables_and_types(session, &config.keyspace).await?;
    }

    for statement in &statements {
        debug!(keyspace = %config.keyspace, %statement, "executing schema statement");
        session
            .execute(statement)
            .await
            .map_err(|source| SchemaError::Statement {
                statement: statement.clone(),
                source,
            })?;
    }

    info!(
        keyspace = %config.keyspace,
        statements = statements.len(),
        "applied schema"
    );
    Ok(())
}

/// Drop every table, then every user type, in the keyspace
///
/// Types are dropped in up to one pass per type, each pass retrying only the
/// types that failed before. The last drop error is returned if any remain.
async fn drop_all_tables_and_types<E>(session: &E, keyspace: &str) -> SchemaResult<()>
where
    E: CqlExecutor + ?Sized,
{
    // Unquoted keyspace names are stored lowercased in system_schema
    let catalog_name = keyspace.to_lowercase();

    let tables = session.query_names(LIST_TABLES_CQL, &catalog_name).await?;
    for table in &tables {
        let cql = format!(
            "DROP TABLE IF EXISTS {}.{}",
            quote_identifier(&catalog_name),
            quote_identifier(table)
        );
        session.execute(&cql).await?;
    }

    let types = session.query_names(LIST_TYPES_CQL, &catalog_name).await?;
    let type_count = types.len();

    // A type can't be dropped while another type still references it, so
    // retry whatever failed. Each pass frees at least one level of nesting.
    let mut pending = types;
    let mut last_error = None;
    for pass in 1..=type_count {
        if pending.is_empty() {
            break;
        }

        let mut failed = Vec::new();
        for user_type in pending {
            let cql = format!(
                "DROP TYPE IF EXISTS {}.{}",
                quote_identifier(&catalog_name),
                quote_identifier(&user_type)
            );
            if let Err(e) = session.execute(&cql).await {
                debug!(keyspace, user_type = %user_type, pass, error = %e, "drop type failed, will retry");
                last_error = Some(e);
                failed.push(user_type);
            }
        }
        pending = failed;
    }

    if !pending.is_empty() {
        warn!(keyspace, remaining = ?pending, "could not drop user types");
        if let Some(e) = last_error {
            return Err(e.into());
        }
    }

    info!(
        keyspace,
        tables = tables.len(),
        types = type_count,
        "dropped existing schema"
    );
    Ok(())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Split a CQL script into statements
///
/// Blank lines and whole-line `--` or `//` comments are skipped. Remaining
/// lines are trimmed and joined with a single space; a line ending in `;`
/// closes the statement. Text after the last `;` forms a final statement.
pub fn parse_cql(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("--") || line.starts_with("//") {
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line);

        if line.ends_with(';') {
            statements.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        statements.push(current);
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassandra::{CassandraError, CassandraResult};
    use crate::cassandra::connector::MockCqlExecutor;
    use mockall::Sequence;
    use mockall::predicate::eq;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const SCRIPT: &str = "\
-- user types first
CREATE TYPE address (
    street text,
    city text
);

// then tables
CREATE TABLE users (id uuid PRIMARY KEY, home frozen<address>);
";

    fn script_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn setup_config(path: PathBuf, overwrite: bool) -> SetupSchemaConfig {
        SetupSchemaConfig {
            hosts: "127.0.0.1".to_string(),
            keyspace: "Bootstrap".to_string(),
            schema_file_path: path,
            overwrite,
            disable_versioning: true,
        }
    }

    #[test]
    fn test_parse_cql_skips_comments_and_joins_lines() {
        assert_eq!(
            parse_cql(SCRIPT),
            [
                "CREATE TYPE address ( street text, city text );",
                "CREATE TABLE users (id uuid PRIMARY KEY, home frozen<address>);",
            ]
        );
    }

    #[test]
    fn test_parse_cql_keeps_unterminated_tail() {
        assert_eq!(
            parse_cql("CREATE TABLE a (id int PRIMARY KEY);\nCREATE TABLE b (id int PRIMARY KEY)"),
            [
                "CREATE TABLE a (id int PRIMARY KEY);",
                "CREATE TABLE b (id int PRIMARY KEY)",
            ]
        );
        assert!(parse_cql("\n-- nothing here\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_apply_schema_with_overwrite_wipes_then_creates() {
        let script = script_file(SCRIPT);
        let config = setup_config(script.path().to_path_buf(), true);

        let mut session = MockCqlExecutor::new();
        let mut seq = Sequence::new();
        session
            .expect_query_names()
            .with(eq(LIST_TABLES_CQL), eq("bootstrap"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec!["users".to_string(), "Events".to_string()]));
        session
            .expect_execute()
            .with(eq("DROP TABLE IF EXISTS \"bootstrap\".\"users\""))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        session
            .expect_execute()
            .with(eq("DROP TABLE IF EXISTS \"bootstrap\".\"Events\""))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        session
            .expect_query_names()
            .with(eq(LIST_TYPES_CQL), eq("bootstrap"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec!["address".to_string()]));
        session
            .expect_execute()
            .with(eq("DROP TYPE IF EXISTS \"bootstrap\".\"address\""))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        session
            .expect_execute()
            .with(eq("CREATE TYPE address ( street text, city text );"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        session
            .expect_execute()
            .with(eq("CREATE TABLE users (id uuid PRIMARY KEY, home frozen<address>);"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        apply_schema(&session, &config).await.unwrap();
    }

    fn expect_drop_type(
        session: &mut MockCqlExecutor,
        seq: &mut Sequence,
        name: &str,
        result: fn() -> CassandraResult<()>,
    ) {
        session
            .expect_execute()
            .with(eq(format!("DROP TYPE IF EXISTS \"bootstrap\".\"{name}\"")))
            .times(1)
            .in_sequence(seq)
            .returning(move |_| result());
    }

    fn still_used_by_person() -> CassandraResult<()> {
        Err(CassandraError::Query(
            "Cannot drop user type bootstrap.address as it is still used by user type person"
                .to_string(),
        ))
    }

    #[tokio::test]
    async fn test_overwrite_drops_nested_types_over_several_passes() {
        let script = script_file("CREATE TYPE address (street text);");
        let config = setup_config(script.path().to_path_buf(), true);

        let mut session = MockCqlExecutor::new();
        let mut seq = Sequence::new();
        session
            .expect_query_names()
            .with(eq(LIST_TABLES_CQL), eq("bootstrap"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        session
            .expect_query_names()
            .with(eq(LIST_TYPES_CQL), eq("bootstrap"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec!["address".to_string(), "person".to_string()]));
        expect_drop_type(&mut session, &mut seq, "address", still_used_by_person);
        expect_drop_type(&mut session, &mut seq, "person", || Ok(()));
        expect_drop_type(&mut session, &mut seq, "address", || Ok(()));
        session
            .expect_execute()
            .with(eq("CREATE TYPE address (street text);"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let result = apply_schema(&session, &config).await;
        assert!(result.is_ok(), "unexpected error: {result:?}");
    }

    #[tokio::test]
    async fn test_overwrite_fails_when_a_type_never_drops() {
        let script = script_file("CREATE TYPE address (street text);");
        let config = setup_config(script.path().to_path_buf(), true);

        let mut session = MockCqlExecutor::new();
        let mut seq = Sequence::new();
        session
            .expect_query_names()
            .with(eq(LIST_TABLES_CQL), eq("bootstrap"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        session
            .expect_query_names()
            .with(eq(LIST_TYPES_CQL), eq("bootstrap"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec!["address".to_string(), "person".to_string()]));
        // Two types, so two passes
        expect_drop_type(&mut session, &mut seq, "address", still_used_by_person);
        expect_drop_type(&mut session, &mut seq, "person", || Ok(()));
        expect_drop_type(&mut session, &mut seq, "address", still_used_by_person);

        let err = apply_schema(&session, &config).await.unwrap_err();
        assert!(matches!(err, SchemaError::Cassandra(CassandraError::Query(_))));
        assert!(err.to_string().contains("still used by user type person"));
    }

    #[tokio::test]
    async fn test_apply_schema_without_overwrite_keeps_existing_schema() {
        let script = script_file("CREATE TABLE IF NOT EXISTS t (id int PRIMARY KEY);");
        let config = setup_config(script.path().to_path_buf(), false);

        let mut session = MockCqlExecutor::new();
        session.expect_query_names().never();
        session.expect_execute().times(1).returning(|_| Ok(()));

        apply_schema(&session, &config).await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_schema_stops_at_first_failing_statement() {
        let script = script_file("CREATE TABLE a (id int PRIMARY KEY);\nCREATE TABLE a (;\nCREATE TABLE c (id int PRIMARY KEY);");
        let config = setup_config(script.path().to_path_buf(), false);

        let mut session = MockCqlExecutor::new();
        let mut seq = Sequence::new();
        session
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        session
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(CassandraError::Query("line 1:16 no viable alternative".to_string())));

        let err = apply_schema(&session, &config).await.unwrap_err();
        match err {
            SchemaError::Statement { statement, .. } => assert_eq!(statement, "CREATE TABLE a (;"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreadable_script_drops_nothing() {
        let config = setup_config(PathBuf::from("/nonexistent/_schema_.cql"), true);

        let mut session = MockCqlExecutor::new();
        session.expect_query_names().never();
        session.expect_execute().never();

        let err = apply_schema(&session, &config).await.unwrap_err();
        assert!(matches!(err, SchemaError::ReadScript { .. }));
    }

    #[tokio::test]
    async fn test_versioning_is_rejected() {
        let script = script_file(SCRIPT);
        let mut config = setup_config(script.path().to_path_buf(), true);
        config.disable_versioning = false;

        let session = MockCqlExecutor::new();
        let err = apply_schema(&session, &config).await.unwrap_err();
        assert!(matches!(err, SchemaError::VersioningUnsupported));

        let err = CqlSchemaSetup::new().setup_schema(&config).await.unwrap_err();
        assert!(matches!(err, SchemaError::VersioningUnsupported));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
