//! grantsync - registry agreements to cloud permission grants
//!
//! Usage:
//!   grantsync replicate                          → drain the event feed into the spool
//!   grantsync handle                             → apply spooled events
//!   grantsync handle --records batch.json        → apply a queue-trigger batch (- for stdin)
//!   grantsync synthesize --type T --locator L    → print the policy document
//!   grantsync dump-config                        → print the default config
//!   grantsync version                            → show version

use anyhow::Context;
use clap::{Parser, Subcommand};
use grantsync::{app, logging, GrantsyncConfig, QueueRecords};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "grantsync",
    about = "Keeps cloud permission grants in step with registry agreements",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML). Defaults to $GRANTSYNC_CONFIG, then grantsync.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward new registry events to the spool queue
    Replicate,
    /// Apply agreement lifecycle events to the permission store
    Handle {
        /// Queue-trigger records file; `-` reads stdin. Without it the spool is drained
        #[arg(short, long)]
        records: Option<String>,
    },
    /// Print the policy document for an output port
    Synthesize {
        /// Output port type, e.g. generic-bucket
        #[arg(short = 't', long = "type")]
        resource_type: String,
        /// Locator value; repeat for several
        #[arg(short, long = "locator", required = true)]
        locators: Vec<String>,
    },
    /// Print the default config as TOML
    DumpConfig,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("grantsync v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::DumpConfig => {
            print!("{}", GrantsyncConfig::default().to_toml()?);
            return Ok(());
        }
        _ => {}
    }

    let config_path = GrantsyncConfig::resolve_path(cli.config);
    let config = GrantsyncConfig::load(&config_path)?;
    let _log_guard = logging::init_tracing(&config.logging)?;
    tracing::debug!("config from {}", config_path.display());

    match cli.command {
        Commands::Replicate => {
            let client = Arc::new(app::registry_client(&config)?);
            let spool = Arc::new(app::spool(&config));
            let summary = app::replicator(&config, client, spool)
                .replicate_new_events()
                .await
                .context("replication failed")?;
            println!(
                "forwarded {} events ({} duplicates) in {} batches, cursor {}",
                summary.forwarded,
                summary.duplicates,
                summary.batches,
                summary.cursor.as_deref().unwrap_or("<none>")
            );
        }
        Commands::Handle { records } => {
            let client = Arc::new(app::registry_client(&config)?);
            let coordinator = app::coordinator(&config, client);
            let outcomes = match records {
                Some(source) => {
                    let input = read_input(&source)?;
                    let events = QueueRecords::parse(&input)?.events()?;
                    coordinator.handle_batch(&events).await?
                }
                None => app::drain_spool(&coordinator, &app::spool(&config)).await?,
            };
            for outcome in outcomes {
                println!("{:?}", outcome);
            }
        }
        Commands::Synthesize {
            resource_type,
            locators,
        } => {
            let document = app::synthesize_document(&config, &resource_type, &locators)?;
            println!("{}", document.to_json_pretty()?);
        }
        Commands::Version | Commands::DumpConfig => {}
    }

    Ok(())
}

fn read_input(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("cannot read records from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(source).with_context(|| format!("cannot read records from {}", source))
}
