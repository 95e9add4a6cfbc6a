//! Schema Tool
//!
//! Bootstraps a Cassandra keyspace and its schema before the storage layer
//! starts. Run one instance per keyspace at a time: overlapping overwrites of
//! the same keyspace race.

use clap::{Args, Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use database::cassandra::{
    self, ClusterConfig, CqlSchemaSetup, DEFAULT_PORT, DropFailurePolicy, KeyspaceManager,
    KeyspaceSpec, SchemaBundle, SetupSchemaConfig,
};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "schema-tool")]
#[command(about = "Create Cassandra keyspaces and load their schema")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ClusterArgs {
    /// Comma-separated Cassandra hosts. Without it, CASSANDRA_* env vars are used.
    #[arg(long)]
    hosts: Option<String>,

    /// Only connect to hosts in this data center
    #[arg(long)]
    datacenter: Option<String>,

    /// Port for hosts that don't name one
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

impl ClusterArgs {
    fn cluster_config(&self) -> Result<ClusterConfig> {
        match &self.hosts {
            Some(hosts) => {
                Ok(ClusterConfig::new(hosts, self.datacenter.as_deref()).with_port(self.port))
            }
            None => ClusterConfig::from_env().wrap_err("Invalid Cassandra configuration"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a keyspace with SimpleStrategy replication
    CreateKeyspace {
        #[command(flatten)]
        cluster: ClusterArgs,

        #[arg(short, long)]
        keyspace: String,

        #[arg(short, long, default_value_t = 1)]
        replication_factor: u32,

        /// Drop the keyspace first. Destroys all of its data.
        #[arg(long)]
        overwrite: bool,

        /// Abort if the drop before an overwrite fails
        #[arg(long)]
        strict_drop: bool,
    },

    /// Drop a keyspace if it exists
    DropKeyspace {
        #[command(flatten)]
        cluster: ClusterArgs,

        #[arg(short, long)]
        keyspace: String,
    },

    /// Concatenate schema fragments and apply them to a keyspace on localhost
    LoadSchema {
        /// Directory holding the fragments
        #[arg(short, long)]
        dir: PathBuf,

        /// Fragment file names, applied in the order given
        #[arg(short, long, value_delimiter = ',', required = true)]
        files: Vec<String>,

        #[arg(short, long)]
        keyspace: String,

        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Where to write the composite script. Defaults to the system temp dir.
        #[arg(long)]
        script_dir: Option<PathBuf>,
    },

    /// Apply a single schema script to a keyspace
    SetupSchema {
        #[command(flatten)]
        cluster: ClusterArgs,

        #[arg(short, long)]
        keyspace: String,

        /// CQL script to apply
        #[arg(short, long)]
        file: PathBuf,

        /// Drop the keyspace's tables and types first
        #[arg(long)]
        overwrite: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateKeyspace {
            cluster,
            keyspace,
            replication_factor,
            overwrite,
            strict_drop,
        } => {
            let session = cassandra::connect(&cluster.cluster_config()?)
                .await
                .wrap_err("Cassandra connection failed")?;

            let policy = if strict_drop {
                DropFailurePolicy::Propagate
            } else {
                DropFailurePolicy::LogAndContinue
            };
            let spec = KeyspaceSpec::new(&keyspace, replication_factor).with_overwrite(overwrite);

            KeyspaceManager::new()
                .with_drop_failure_policy(policy)
                .create_keyspace(session.as_ref(), &spec)
                .await
                .wrap_err_with(|| format!("Failed to create keyspace {keyspace}"))?;

            info!(%keyspace, replication_factor, overwrite, "Keyspace ready");
        }

        Commands::DropKeyspace { cluster, keyspace } => {
            let session = cassandra::connect(&cluster.cluster_config()?)
                .await
                .wrap_err("Cassandra connection failed")?;

            cassandra::drop_keyspace(session.as_ref(), &keyspace)
                .await
                .wrap_err_with(|| format!("Failed to drop keyspace {keyspace}"))?;
        }

        Commands::LoadSchema {
            dir,
            files,
            keyspace,
            port,
            script_dir,
        } => {
            let mut bundle = SchemaBundle::new(dir, files, keyspace);
            if let Some(script_dir) = script_dir {
                bundle = bundle.with_script_dir(script_dir);
            }
            let setup = CqlSchemaSetup::new().with_port(port);

            cassandra::load_schema(&bundle, &setup).await?;
        }

        Commands::SetupSchema {
            cluster,
            keyspace,
            file,
            overwrite,
        } => {
            let config = cluster.cluster_config()?;
            let session = cassandra::connect(&config.clone().with_keyspace(&keyspace))
                .await
                .wrap_err("Cassandra connection failed")?;

            let setup = SetupSchemaConfig {
                hosts: config.hosts().join(","),
                keyspace,
                schema_file_path: file,
                overwrite,
                disable_versioning: true,
            };
            cassandra::apply_schema(session.as_ref(), &setup).await?;
        }
    }

    Ok(())
}
