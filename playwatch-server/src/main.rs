use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use playwatch_config::{
    ConfigLoad, ConfigLoader, PollerConfig, PollerConfigSource,
};
use playwatch_core::poller::{
    InMemorySessionStore, MediaServerClient, PollScheduler, PollSettings,
    SessionStore, build_client, load_inventory,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "playwatch-server")]
#[command(about = "Watches media server sessions and records playback history")]
struct Cli {
    /// Path to a TOML or JSON config file (overrides PLAYWATCH_CONFIG_PATH)
    #[arg(short, long, env = "PLAYWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the .env file loaded before the config is resolved
    #[arg(long, env = "PLAYWATCH_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Poll every server once, log what changed and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,playwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_runtime_config(&cli)?;
    let clients = build_clients(&config)?;
    if clients.is_empty() {
        warn!("no enabled servers configured; nothing to poll");
        return Ok(());
    }

    let settings = config.poll_settings();
    log_inventory(&clients, &settings).await;

    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let scheduler = PollScheduler::new(store, settings);

    if cli.once {
        let mut failures = 0usize;
        for (server, outcome) in scheduler.run_once(&clients).await {
            if let Err(err) = outcome {
                error!(server = %server, "poll failed: {err}");
                failures += 1;
            }
        }
        if failures == clients.len() {
            anyhow::bail!("every server failed to respond");
        }
        return Ok(());
    }

    for client in clients {
        scheduler.spawn(client).await;
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");
    scheduler.shutdown().await;

    Ok(())
}

fn load_runtime_config(cli: &Cli) -> anyhow::Result<PollerConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad {
        config,
        source,
        warnings,
        env_file_loaded,
    } = loader.load().context("failed to load configuration")?;

    if env_file_loaded {
        info!("loaded .env file");
    }

    match &source {
        PollerConfigSource::Default => {
            info!("no config file found, using defaults")
        }
        PollerConfigSource::EnvPath(path) => {
            info!(path = %path.display(), "config loaded from env path")
        }
        PollerConfigSource::EnvInline => info!("config loaded from inline env"),
        PollerConfigSource::File(path) => {
            info!(path = %path.display(), "config loaded from file")
        }
    }

    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }

    Ok(config)
}

fn build_clients(
    config: &PollerConfig,
) -> anyhow::Result<Vec<Arc<dyn MediaServerClient>>> {
    config
        .enabled_servers()
        .map(|server| -> anyhow::Result<Arc<dyn MediaServerClient>> {
            let connection = server.connection(config.fetch_timeout).with_context(|| {
                format!("invalid connection settings for server '{}'", server.id)
            })?;
            let client = build_client(server.server_type, connection)
                .with_context(|| format!("failed to build client for '{}'", server.id))?;
            info!(
                server = %server.id,
                name = %server.display_name(),
                server_type = %server.server_type,
                "server registered"
            );
            Ok(Arc::from(client))
        })
        .collect()
}

/// Log who and what each server knows about. Failures are not fatal; the
/// session poll reports unreachable servers on its own.
async fn log_inventory(clients: &[Arc<dyn MediaServerClient>], settings: &PollSettings) {
    for client in clients {
        match load_inventory(client.as_ref(), settings).await {
            Ok(inventory) => info!(
                server = %client.server_id(),
                users = inventory.users.len(),
                libraries = inventory.libraries.len(),
                history = inventory.history.len(),
                "server inventory"
            ),
            Err(err) => {
                warn!(server = %client.server_id(), "inventory unavailable: {err}")
            }
        }
    }
}
