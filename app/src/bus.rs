//! Bus abstraction layer: wraps `tokio::sync::broadcast` so callers never
//! touch the broadcast types directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;

use rallypoint::{MatchAction, MatchCommand, MatchUpdate, RallypointEvent, RallypointMessage};

/// Broadcast capacity of the unified bus.
pub const BUS_CAPACITY: usize = 1024;

/// Error from `BusReceiver::poll()`: the bus is closed or the actor's
/// shutdown flag is set.
#[derive(Debug)]
pub enum PollError {
    Shutdown,
}

// ---------------------------------------------------------------------------
// BusSender
// ---------------------------------------------------------------------------

/// Cloneable sender that auto-stamps `source` on every outbound message.
pub struct BusSender {
    actor_id: String,
    inner: broadcast::Sender<RallypointMessage>,
    shutdown: Arc<AtomicBool>,
}

impl BusSender {
    pub fn new(
        actor_id: String,
        inner: broadcast::Sender<RallypointMessage>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            actor_id,
            inner,
            shutdown,
        }
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Access the underlying broadcast sender (e.g. for WebState).
    pub fn raw_sender(&self) -> &broadcast::Sender<RallypointMessage> {
        &self.inner
    }

    /// Send a message, auto-stamping source from the actor ID.
    pub fn send(&self, mut msg: RallypointMessage) {
        msg.source = self.actor_id.clone();
        let _ = self.inner.send(msg);
    }

    /// Create a new receiver subscribed to this bus, sharing this sender's
    /// shutdown flag.
    pub fn subscribe(&self) -> BusReceiver {
        BusReceiver {
            inner: self.inner.subscribe(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl Clone for BusSender {
    fn clone(&self) -> Self {
        Self {
            actor_id: self.actor_id.clone(),
            inner: self.inner.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

// ---------------------------------------------------------------------------
// BusReceiver
// ---------------------------------------------------------------------------

/// Receiver wrapper. Holds the broadcast Receiver and a shutdown flag.
pub struct BusReceiver {
    inner: broadcast::Receiver<RallypointMessage>,
    shutdown: Arc<AtomicBool>,
}

impl BusReceiver {
    /// Check whether this actor's shutdown flag has been set.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Non-blocking drain: returns the next message, `Ok(None)` if empty,
    /// or `Err(PollError::Shutdown)` if the bus is closed or shutdown flag set.
    pub fn poll(&mut self) -> Result<Option<RallypointMessage>, PollError> {
        if self.is_shutdown() {
            return Err(PollError::Shutdown);
        }
        loop {
            match self.inner.try_recv() {
                Ok(msg) => return Ok(Some(msg)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(PollError::Shutdown),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("bus: lagged, dropped {n} events");
                    continue;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request-reply
// ---------------------------------------------------------------------------

/// Emit a `MatchCommand` tagged with a fresh request ID and wait for the
/// `MatchUpdate` carrying the same ID. `None` on timeout or closed bus.
pub async fn request(
    bus_tx: &broadcast::Sender<RallypointMessage>,
    source: &str,
    action: MatchAction,
    timeout: Duration,
) -> Option<MatchUpdate> {
    let request_id = uuid::Uuid::new_v4().to_string();
    // Subscribe before sending so the reply cannot slip past.
    let mut bus_rx = bus_tx.subscribe();
    let _ = bus_tx.send(
        RallypointMessage::new(MatchCommand {
            request_id: Some(request_id.clone()),
            action,
        })
        .source(source),
    );

    let reply = tokio::time::timeout(timeout, async {
        loop {
            match bus_rx.recv().await {
                Ok(msg) => {
                    if let RallypointEvent::MatchUpdate(update) = msg.event
                        && update.request_id.as_deref() == Some(request_id.as_str())
                    {
                        return Some(update);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
    })
    .await;

    match reply {
        Ok(update) => update,
        Err(_) => {
            tracing::warn!("bus request {request_id}: timed out waiting for MatchUpdate");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_stamps_source_and_poll_drains() {
        let (tx, _) = broadcast::channel(16);
        let sender = BusSender::new("system".into(), tx, Arc::new(AtomicBool::new(false)));
        let mut receiver = sender.subscribe();
        sender.send(RallypointMessage::new(MatchAction::Undo).source("ignored"));
        let msg = receiver.poll().unwrap().unwrap();
        assert_eq!(msg.source, "system");
        assert!(receiver.poll().unwrap().is_none());
    }

    #[test]
    fn poll_reports_shutdown() {
        let (tx, _) = broadcast::channel(16);
        let flag = Arc::new(AtomicBool::new(false));
        let sender = BusSender::new("recorder".into(), tx, Arc::clone(&flag));
        let mut receiver = sender.subscribe();
        flag.store(true, Ordering::Relaxed);
        assert!(matches!(receiver.poll(), Err(PollError::Shutdown)));
    }

    #[tokio::test]
    async fn request_times_out_without_responder() {
        let (tx, _keep) = broadcast::channel(16);
        let reply = request(&tx, "web", MatchAction::Undo, Duration::from_millis(20)).await;
        assert!(reply.is_none());
    }
}
