//! Command line host for the commerce provider.
//!
//! Each subcommand runs one lifecycle operation against a project. Resource
//! configuration and stored state are JSON files; results are printed to
//! stdout as JSON, or written to `--out`. Failures print a diagnostic to
//! stderr.
//!
//! Usage:
//!   commerce-provider --config provider.toml plan --kind commerce_state --resource state.json
//!   commerce-provider --memory apply --kind commerce_associate_role --resource role.json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commerce_engine::MemoryApi;
use commerce_model::ProjectRemote;
use commerce_provider::{
    CancellationToken, Diagnostic, PersistedState, Provider, ProviderConfig, ProviderError, ResourceKind,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "commerce-provider")]
#[command(about = "Reconciles commerce resources against a commerce project", version)]
struct Args {
    /// Provider configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Run against an in-memory project instead of the configured API
    #[arg(long, global = true)]
    memory: bool,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the attribute schema of one kind, or of all kinds
    Schema {
        #[arg(long)]
        kind: Option<ResourceKind>,
    },
    /// Validate a resource configuration and print the planned record
    Plan {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        resource: PathBuf,
        /// Stored state of an existing resource
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Create the resource, or update it when stored state is given
    Apply {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        resource: PathBuf,
        #[arg(long)]
        state: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Re-read stored state from the project
    Refresh {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete the resource, or release its configuration for attached kinds
    Destroy {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        state: PathBuf,
    },
    /// Produce stored state for an existing object
    Import {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rewrite stored state at the current schema version
    UpgradeState {
        #[arg(long)]
        kind: ResourceKind,
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = ProviderConfig::load(args.config.as_deref())
        .map_err(report)
        .context("Failed to load provider configuration")?;

    if let Command::Schema { kind } = &args.command {
        return match kind {
            Some(kind) => emit(&Provider::schema(*kind), None),
            None => emit(&Provider::schemas(), None),
        };
    }

    let provider = if args.memory {
        let key = if config.client.project_key.is_empty() {
            "memory".to_string()
        } else {
            config.client.project_key.clone()
        };
        info!(project = %key, "using in-memory project");
        let api = MemoryApi::new()
            .with_project(ProjectRemote::new(&key, &key))
            .await
            .map_err(|e| report(e.into()))?;
        Provider::with_api(Arc::new(api), config.engine.clone())
    } else {
        Provider::configure(&config).map_err(report)?
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight operation");
            on_interrupt.cancel();
        }
    });

    run(&provider, args.command, &cancel).await
}

async fn run(provider: &Provider, command: Command, cancel: &CancellationToken) -> Result<()> {
    match command {
        Command::Schema { .. } => Ok(()),
        Command::Plan { kind, resource, state } => {
            let config = read_json(&resource)?;
            let prior = state.as_deref().map(read_state).transpose()?;
            let planned = provider.plan(kind, config, prior.as_ref()).map_err(report)?;
            emit(&planned, None)
        }
        Command::Apply {
            kind,
            resource,
            state,
            out,
        } => {
            let config = read_json(&resource)?;
            let prior = state.as_deref().map(read_state).transpose()?;
            let stored = provider
                .apply(kind, config, prior.as_ref(), cancel)
                .await
                .map_err(report)?;
            info!(kind = %kind, "applied");
            emit(&stored, out.as_deref())
        }
        Command::Refresh { kind, state, out } => {
            let prior = read_state(&state)?;
            match provider.read(kind, &prior, cancel).await.map_err(report)? {
                Some(stored) => emit(&stored, out.as_deref()),
                None => {
                    warn!(kind = %kind, "resource no longer exists");
                    emit(&Value::Null, out.as_deref())
                }
            }
        }
        Command::Destroy { kind, state } => {
            let prior = read_state(&state)?;
            provider.delete(kind, &prior, cancel).await.map_err(report)?;
            info!(kind = %kind, "destroyed");
            Ok(())
        }
        Command::Import { kind, id, out } => {
            let stored = provider.import_state(kind, &id, cancel).await.map_err(report)?;
            emit(&stored, out.as_deref())
        }
        Command::UpgradeState { kind, state, out } => {
            let stored = provider.upgrade_state(kind, read_state(&state)?).map_err(report)?;
            emit(&stored, out.as_deref())
        }
    }
}

/// Prints the diagnostic for `err` and hands it on for the exit status.
fn report(err: ProviderError) -> anyhow::Error {
    let diagnostic = Diagnostic::from(&err);
    match serde_json::to_string_pretty(&diagnostic) {
        Ok(text) => eprintln!("{text}"),
        Err(_) => eprintln!("{}: {}", diagnostic.summary, diagnostic.detail),
    }
    anyhow::Error::new(err)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_state(path: &Path) -> Result<PersistedState> {
    let value = read_json(path)?;
    serde_json::from_value(value).with_context(|| format!("{} is not stored provider state", path.display()))
}

fn emit(value: &impl Serialize, out: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    match out {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote state");
        }
        None => println!("{text}"),
    }
    Ok(())
}

