//! Axum web server: REST endpoints + WebSocket event streaming.

pub mod routes;
pub mod types;
pub mod ws;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::{RwLock, broadcast, oneshot};
use tower_http::cors::CorsLayer;

use crate::actors::{Actor, actor_names};
use crate::bus::{BusReceiver, BusSender};
use crate::state::SystemState;
use rallypoint::{
    ActorState, ActorStatus, ActorStatusResponse, AlertLevel, AlertMessage, RallypointEvent,
    RallypointMessage,
};

/// How long a REST mutation waits for the system actor's reply.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

const TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);
const BIND_RETRY: Duration = Duration::from_secs(3);

/// Shared state for the web layer.
pub struct WebState {
    pub root: Arc<SystemState>,
    pub bus_tx: broadcast::Sender<RallypointMessage>,
    /// Last reported status per actor, fed by `ActorStatus` bus events.
    pub actors: RwLock<HashMap<String, ActorStatusResponse>>,
    pub addr: SocketAddr,
    pub actor_id: String,
    pub ws_count: AtomicU64,
    pub request_count: AtomicU64,
}

impl WebState {
    /// Seed the actor table with every known actor as disconnected.
    pub fn new(
        root: Arc<SystemState>,
        bus_tx: broadcast::Sender<RallypointMessage>,
        addr: SocketAddr,
        actor_id: String,
    ) -> Self {
        let actors = actor_names(&root.system.snapshot())
            .into_iter()
            .map(|(id, name)| {
                let entry = ActorStatusResponse {
                    name,
                    status: ActorStatus::Disconnected,
                    telemetry: HashMap::new(),
                };
                (id, entry)
            })
            .collect();
        Self {
            root,
            bus_tx,
            actors: RwLock::new(actors),
            addr,
            actor_id,
            ws_count: AtomicU64::new(0),
            request_count: AtomicU64::new(0),
        }
    }

    fn telemetry(&self) -> HashMap<String, String> {
        HashMap::from([
            ("bind".into(), self.addr.to_string()),
            (
                "websockets".into(),
                self.ws_count.load(Ordering::Relaxed).to_string(),
            ),
            (
                "requests".into(),
                self.request_count.load(Ordering::Relaxed).to_string(),
            ),
        ])
    }

    /// Publish this server's status and counters on the bus.
    fn publish_status(&self, status: ActorStatus) {
        let mut telemetry = self.telemetry();
        if status == ActorStatus::Disconnected {
            telemetry.insert("error".into(), "bind failed".into());
        }
        let msg = RallypointMessage::new(ActorState::new(status, telemetry)).source(&self.actor_id);
        let _ = self.bus_tx.send(msg);
    }

    /// Publish Connected telemetry (periodic emitter + ws connect/disconnect).
    pub(super) fn publish_telemetry(&self) {
        self.publish_status(ActorStatus::Connected);
    }

    async fn record_actor_status(&self, source: &str, update: &ActorState) {
        let mut actors = self.actors.write().await;
        let entry = actors
            .entry(source.to_string())
            .or_insert_with(|| ActorStatusResponse {
                name: String::new(),
                status: update.status,
                telemetry: HashMap::new(),
            });
        entry.status = update.status;
        entry.telemetry = update.telemetry.clone();
    }
}

// ---------------------------------------------------------------------------
// WebActor: one axum server per [webserver.<id>] section
// ---------------------------------------------------------------------------

/// Web server actor. Runs axum on a dedicated thread with its own tokio
/// runtime, so a slow client never stalls the scoring threads.
pub struct WebActor {
    addr: SocketAddr,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl WebActor {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            shutdown_tx: Mutex::new(None),
        }
    }
}

impl Actor for WebActor {
    fn start(&self, root: Arc<SystemState>, sender: BusSender, _receiver: BusReceiver) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *self.shutdown_tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(shutdown_tx);

        let state = Arc::new(WebState::new(
            root,
            sender.raw_sender().clone(),
            self.addr,
            sender.actor_id().to_string(),
        ));
        let spawned = std::thread::Builder::new()
            .name(state.actor_id.clone())
            .spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(serve(state, shutdown_rx)),
                Err(e) => tracing::error!("failed to create webserver tokio runtime: {e}"),
            });
        if let Err(e) = spawned {
            tracing::error!("failed to spawn webserver thread: {e}");
        }
    }

    fn stop(&self) {
        if let Some(tx) = self
            .shutdown_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            let _ = tx.send(());
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn router(state: Arc<WebState>) -> Router {
    let counted = Arc::clone(&state);
    let count_requests = axum::middleware::from_fn(move |req, next: axum::middleware::Next| {
        let state = Arc::clone(&counted);
        async move {
            state.request_count.fetch_add(1, Ordering::Relaxed);
            next.run(req).await
        }
    });

    Router::new()
        .route("/api/status", get(routes::get_status))
        .route(
            "/api/match",
            get(routes::get_match).post(routes::post_match),
        )
        .route("/api/match/score", post(routes::post_score))
        .route("/api/match/undo", post(routes::post_undo))
        .route("/api/match/reset", post(routes::post_reset))
        .route("/api/history", get(routes::get_history))
        .route("/api/settings", get(routes::get_settings))
        .route("/api/ws", get(ws::ws_upgrade))
        .layer(count_requests)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind, retrying every few seconds. `None` if shut down first.
async fn bind_with_retry(
    state: &WebState,
    shutdown_rx: &mut oneshot::Receiver<()>,
) -> Option<TcpListener> {
    let mut alerted = false;
    loop {
        match TcpListener::bind(state.addr).await {
            Ok(listener) => return Some(listener),
            Err(e) => {
                tracing::warn!(
                    "web server: failed to bind {}: {e}, retrying in {}s",
                    state.addr,
                    BIND_RETRY.as_secs()
                );
                state.publish_status(ActorStatus::Disconnected);
                if !alerted {
                    alerted = true;
                    let alert = AlertMessage {
                        level: AlertLevel::Warn,
                        message: format!("web server cannot bind {}: {e}", state.addr),
                    };
                    let _ = state
                        .bus_tx
                        .send(RallypointMessage::new(alert).source(&state.actor_id));
                }
                tokio::select! {
                    _ = tokio::time::sleep(BIND_RETRY) => {}
                    _ = &mut *shutdown_rx => return None,
                }
            }
        }
    }
}

/// Run the web server until the shutdown signal.
async fn serve(state: Arc<WebState>, mut shutdown_rx: oneshot::Receiver<()>) {
    tokio::spawn(status_tracker(
        Arc::clone(&state),
        state.bus_tx.subscribe(),
    ));

    state.publish_status(ActorStatus::Starting);
    let Some(listener) = bind_with_retry(&state, &mut shutdown_rx).await else {
        return;
    };
    tracing::info!("web server listening on {}", state.addr);

    // First tick fires immediately and reports Connected.
    let ticker = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TELEMETRY_INTERVAL);
        loop {
            interval.tick().await;
            ticker.publish_telemetry();
        }
    });

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async { drop(shutdown_rx.await) })
        .await
        .ok();
}

/// Keeps the actor table behind `/api/status` current.
async fn status_tracker(state: Arc<WebState>, mut bus_rx: broadcast::Receiver<RallypointMessage>) {
    loop {
        match bus_rx.recv().await {
            Ok(msg) => match &msg.event {
                RallypointEvent::ActorStatus(update) => {
                    state.record_actor_status(&msg.source, update).await;
                }
                RallypointEvent::Alert(alert) => {
                    tracing::debug!("alert from '{}': [{}] {}", msg.source, alert.level, alert.message);
                }
                // Match traffic goes to ws clients untouched.
                _ => {}
            },
            Err(broadcast::error::RecvError::Closed) => break,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("web status tracker: lagged, dropped {n} events");
            }
        }
    }
}
