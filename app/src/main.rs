use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

mod actors;
mod bus;
mod state;

use actors::Actor;
use bus::{BUS_CAPACITY, BusSender};
use rallypoint::RallypointMessage;
use state::SystemState;
use state::config::SystemConfig;
use state::history::{HistoryStore, JsonHistoryFile, MemoryHistory};

#[derive(Parser, Debug, Clone)]
#[command(name = "rallypoint", about = "Badminton rally-point scoring service")]
struct Config {
    /// Config file path (default: ~/.config/rallypoint/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Match history file (overrides `[history] path`)
    #[arg(long, conflicts_with = "no_history")]
    history: Option<PathBuf>,

    /// Keep finished matches in memory only
    #[arg(long)]
    no_history: bool,

    /// Bind address for the first web server, for this run only
    #[arg(long)]
    bind: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("rallypoint=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!("debug logging enabled");

    let cli = Config::parse();

    // Load (or create) config file
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(state::config::default_config_path);
    let system = SystemConfig::new(config_path);
    if let Some(bind) = &cli.bind {
        system.override_bind(bind);
    }

    let history: Arc<dyn HistoryStore> = if cli.no_history {
        tracing::info!("match history kept in memory only");
        Arc::new(MemoryHistory::default())
    } else {
        let path = cli
            .history
            .clone()
            .or_else(|| system.snapshot().history.path)
            .unwrap_or_else(state::history::default_history_path);
        let store = JsonHistoryFile::new(path);
        tracing::info!("match history at {}", store.path().display());
        Arc::new(store)
    };
    tracing::debug!("config at {}", system.path().display());

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    // Single unified bus
    let (bus_tx, _) = broadcast::channel::<RallypointMessage>(BUS_CAPACITY);

    // Build shared state root
    let (system_state, session_writer) = SystemState::new(system, history);
    let state = Arc::new(system_state);

    // System actor: sole owner of the session writer.
    // Must be fully up before other actors start so no bus events are missed.
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let sender = BusSender::new(
            actors::SYSTEM_ID.into(),
            bus_tx.clone(),
            Arc::clone(&shutdown),
        );
        let receiver = sender.subscribe();
        let (actor, ready_rx) = actors::system::SystemActor::new(session_writer);
        actor.start(Arc::clone(&state), sender, receiver);
        ready_rx
            .recv()
            .context("system actor failed to start")?;
        state.register_actor(actors::SYSTEM_ID.into(), Box::new(actor), shutdown);
    }

    actors::start_actor(
        actors::RECORDER_ID.into(),
        Box::new(actors::recorder::RecorderActor),
        &state,
        &bus_tx,
    );

    // Start config-driven actors (web servers)
    let snap = state.system.snapshot();
    for ra in actors::resolve_actors(&snap) {
        tracing::info!("starting actor '{}' ({})", ra.id, ra.name);
        actors::start_actor(ra.id, ra.actor, &state, &bus_tx);
    }

    // Drain bus (keeps broadcast channel healthy when no other subscriber)
    let mut drain_rx = bus_tx.subscribe();
    let drain_handle = tokio::spawn(async move {
        loop {
            match drain_rx.recv().await {
                Ok(_) => {}
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("drain subscriber lagged, dropped {n} events");
                }
            }
        }
    });

    rt.block_on(async { tokio::signal::ctrl_c().await })?;

    // Shutdown: stop all actors (including webservers) via registry
    tracing::info!("shutting down...");
    for id in state.actor_ids() {
        state.stop_actor(&id);
    }
    // Drop bus_tx closes the broadcast channel as secondary signal
    drop(bus_tx);
    drain_handle.abort();

    Ok(())
}
