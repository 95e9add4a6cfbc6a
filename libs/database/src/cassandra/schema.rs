use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use super::error::{SchemaError, SchemaResult};

/// Host the composite script is applied against.
pub const SCHEMA_HOST: &str = "127.0.0.1";

/// Everything the schema applier needs for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupSchemaConfig {
    /// Comma-separated host list
    pub hosts: String,
    pub keyspace: String,
    /// Single CQL script holding every statement to apply
    pub schema_file_path: PathBuf,
    /// Drop the keyspace's existing tables and types before applying
    pub overwrite: bool,
    /// Skip schema version bookkeeping
    pub disable_versioning: bool,
}

/// Applies a single schema script to a keyspace
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaSetup: Send + Sync {
    async fn setup_schema(&self, config: &SetupSchemaConfig) -> SchemaResult<()>;
}

/// Ordered schema fragments under one directory, targeting one keyspace
///
/// Fragments are concatenated in the order given; later DDL may depend on
/// earlier DDL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaBundle {
    dir: PathBuf,
    file_names: Vec<String>,
    keyspace: String,
    script_dir: Option<PathBuf>,
}

impl SchemaBundle {
    pub fn new<I, S>(dir: impl Into<PathBuf>, file_names: I, keyspace: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dir: dir.into(),
            file_names: file_names.into_iter().map(Into::into).collect(),
            keyspace: keyspace.into(),
            script_dir: None,
        }
    }

    /// Write the composite script under `dir` instead of the system temp dir
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = Some(dir.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn script_dir(&self) -> Option<&Path> {
        self.script_dir.as_deref()
    }

    /// `<dir>/<name>` for each fragment, in order
    pub fn fragment_paths(&self) -> Vec<PathBuf> {
        self.file_names.iter().map(|name| self.dir.join(name)).collect()
    }
}

/// Concatenate the bundle's fragments into `script`, one newline after each
///
/// Returns the closed script as a [`TempPath`]; the file is removed when it
/// is dropped. On error the script is removed before returning.
pub async fn write_composite_script(
    bundle: &SchemaBundle,
    script: NamedTempFile,
) -> SchemaResult<TempPath> {
    let (file, path) = script.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    for (name, fragment) in bundle.file_names.iter().zip(bundle.fragment_paths()) {
        let content = tokio::fs::read(&fragment)
            .await
            .map_err(|source| SchemaError::ReadFragment {
                file: name.clone(),
                source,
            })?;

        file.write_all(&content).await.map_err(SchemaError::WriteScript)?;
        file.write_all(b"\n").await.map_err(SchemaError::WriteScript)?;

        debug!(file = %name, bytes = content.len(), "appended schema fragment");
    }

    file.flush().await.map_err(SchemaError::WriteScript)?;
    Ok(path)
}

/// Load the bundle's fragments into its keyspace through `setup`
///
/// The fragments are written to one temporary script which is applied with
/// overwrite on and versioning off. The script is deleted on every path out of
/// this function. A fragment that can't be read aborts before anything is
/// applied.
///
/// # Example
/// ```ignore
/// use database::cassandra::{CqlSchemaSetup, SchemaBundle, load_schema};
///
/// let bundle = SchemaBundle::new("schema/cassandra", ["keyspace.cql", "tables.cql"], "bootstrap");
/// load_schema(&bundle, &CqlSchemaSetup::new()).await?;
/// ```
pub async fn load_schema<S>(bundle: &SchemaBundle, setup: &S) -> SchemaResult<()>
where
    S: SchemaSetup + ?Sized,
{
    let mut builder = tempfile::Builder::new();
    builder.prefix("_schema_").suffix(".cql");
    let script = match bundle.script_dir() {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(SchemaError::TempFile)?;

    let script = write_composite_script(bundle, script).await.map_err(|e| {
        error!(keyspace = bundle.keyspace(), error = %e, "failed to build schema script");
        e
    })?;

    let config = SetupSchemaConfig {
        hosts: SCHEMA_HOST.to_string(),
        keyspace: bundle.keyspace().to_string(),
        schema_file_path: script.to_path_buf(),
        overwrite: true,
        disable_versioning: true,
    };

    if let Err(e) = setup.setup_schema(&config).await {
        error!(keyspace = bundle.keyspace(), error = %e, "error loading schema");
        return Err(SchemaError::Load(Box::new(e)));
    }

    info!(
        keyspace = bundle.keyspace(),
        fragments = bundle.file_names().len(),
        "loaded schema"
    );
    Ok(())
}

/// Load the named `.cql` files under `dir` into `keyspace`
pub async fn load_cassandra_schema<S>(
    dir: impl AsRef<Path>,
    file_names: &[&str],
    keyspace: &str,
    setup: &S,
) -> SchemaResult<()>
where
    S: SchemaSetup + ?Sized,
{
    let bundle = SchemaBundle::new(dir.as_ref(), file_names.iter().copied(), keyspace);
    load_schema(&bundle, setup).await
}
