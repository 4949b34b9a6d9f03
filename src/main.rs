use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use quasar_core::config::database::DatabaseUrl;
use quasar_core::config::loader::load_catalogue;
use quasar_core::engine::QuasarSync;
use quasar_core::events::interval::spawn_interval_trigger;
use quasar_core::events::Trigger;
use quasar_core::store::Store;
use quasar_core::sync::kart::KartCli;
use quasar_core::sync::{RepositorySyncer, SyncOrchestrator};
use quasar_core::transforms::{Registry, TransformOrchestrator};
use quasar_core::{credentials, logging, server};

#[derive(Parser)]
#[command(name = "quasar-sync", version, about = "Sync Kart repositories into PostGIS and normalize navigation aids")]
struct Cli {
    /// PostgreSQL/PostGIS connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<DatabaseUrl>,

    /// Repository catalogue (YAML)
    #[arg(long, env = "QUASAR_CATALOGUE", default_value = "repos.yaml")]
    catalogue: PathBuf,

    /// Base64-encoded SSH private key used for cloning
    #[arg(long, env = "SSH_PRIVATE_KEY", hide_env_values = true)]
    ssh_private_key: Option<String>,

    /// Root for per-dataset working directories [default: $TMPDIR/kart-sync]
    #[arg(long, env = "QUASAR_WORK_ROOT")]
    work_root: Option<PathBuf>,

    /// kart executable
    #[arg(long, env = "QUASAR_KART_BIN", default_value = "kart")]
    kart_bin: PathBuf,

    /// Log level (RUST_LOG overrides)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "QUASAR_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Serve the HTTP trigger API
    Serve {
        #[arg(long, env = "QUASAR_LISTEN", default_value = "0.0.0.0:3000")]
        listen: SocketAddr,

        /// Also run the pipeline every N seconds
        #[arg(long, env = "QUASAR_EVERY_SECS")]
        every_secs: Option<u64>,
    },
    /// Run the pipeline once and exit 0 on success, 1 otherwise
    Run {
        /// Print per-dataset and per-schema results as well as the summary
        #[arg(long)]
        verbose: bool,
    },
    /// Validate the catalogue and show which datasets have a normalizer
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "fatal");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Check => check(&cli.catalogue),
        Command::Run { verbose } => {
            let engine = build_engine(&cli).await?;
            let report = engine.trigger(Trigger::Manual).await?;
            if verbose {
                println!("{}", serde_json::to_string_pretty(&report.sync)?);
                println!("{}", serde_json::to_string_pretty(&report.transform)?);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Serve { listen, every_secs } => {
            let engine = build_engine(&cli).await?;
            let listener = TcpListener::bind(listen).with_context(|| format!("failed to bind {listen}"))?;
            let interval = every_secs
                .filter(|s| *s > 0)
                .map(|s| spawn_interval_trigger(engine.clone(), Duration::from_secs(s)));

            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            server::spawn_server(engine.clone(), listener, shutdown).await?;

            if let Some(handle) = interval {
                handle.abort();
            }
            if engine.is_running() {
                tracing::info!("waiting for the in-flight run to finish");
            }
            engine.wait_idle().await;
            tracing::info!("quasar-sync shutdown complete");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Credentials, database and the engine wired to kart and PostGIS.
async fn build_engine(cli: &Cli) -> anyhow::Result<Arc<QuasarSync>> {
    let database_url = cli
        .database_url
        .clone()
        .context("DATABASE_URL is required (--database-url)")?;

    match cli.ssh_private_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(encoded) => {
            let ssh_dir = credentials::default_ssh_dir()?;
            credentials::install(encoded, &ssh_dir)
                .await
                .context("failed to install SSH private key")?;
        }
        None => tracing::warn!("SSH_PRIVATE_KEY not set; cloning relies on existing SSH configuration"),
    }

    let store = Arc::new(
        Store::connect(&database_url)
            .await
            .with_context(|| format!("failed to connect to {database_url}"))?,
    );
    store.migrate().await.context("failed to create navigation_aids")?;

    let work_root = cli
        .work_root
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("kart-sync"));
    let syncer = RepositorySyncer::new(
        Arc::new(KartCli::new(cli.kart_bin.clone())),
        store.clone(),
        database_url,
        work_root,
    );
    let transform = TransformOrchestrator::new(store.clone(), store, Arc::new(Registry::builtin()));
    Ok(Arc::new(QuasarSync::new(
        cli.catalogue.clone(),
        SyncOrchestrator::new(syncer),
        transform,
    )))
}

fn check(catalogue: &std::path::Path) -> anyhow::Result<ExitCode> {
    let datasets = load_catalogue(catalogue)?;
    let registry = Registry::builtin();
    for dataset in &datasets {
        let mark = if registry.contains(&dataset.key) { "normalized" } else { "sync only" };
        println!("{:<40} {:<10} {}", dataset.key, dataset.scale, mark);
    }
    println!("{} datasets OK", datasets.len());
    Ok(ExitCode::SUCCESS)
}
