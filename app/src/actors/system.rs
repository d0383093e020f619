//! System actor: default actor that always runs and owns the match session.
//!
//! Subscribes to the bus and applies `MatchCommand` events to the live match
//! one at a time, in bus order. Every command is answered with a
//! `MatchUpdate` echoing its `request_id`; the rally that ends a match is
//! followed by a `MatchCompleted` record. This runs independently of the web
//! server, so the session is always consistent even with no clients.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::actors::Actor;
use crate::bus::{BusReceiver, BusSender, PollError};
use crate::state::{MatchSessionWriter, SystemState};
use rallypoint::{MatchCommand, MatchUpdate, RallypointEvent, RallypointMessage};

/// System actor. Always-on, not config-driven.
///
/// Holds the sole `MatchSessionWriter`, enforcing that all match mutations
/// flow through bus events processed here.
pub struct SystemActor {
    writer: Mutex<Option<MatchSessionWriter>>,
    ready_tx: Mutex<Option<std_mpsc::SyncSender<()>>>,
}

impl SystemActor {
    pub fn new(writer: MatchSessionWriter) -> (Self, std_mpsc::Receiver<()>) {
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(0);
        let actor = Self {
            writer: Mutex::new(Some(writer)),
            ready_tx: Mutex::new(Some(ready_tx)),
        };
        (actor, ready_rx)
    }
}

impl Actor for SystemActor {
    fn start(&self, _state: Arc<SystemState>, sender: BusSender, receiver: BusReceiver) {
        let writer = self.writer.lock().unwrap_or_else(|e| e.into_inner()).take();
        let ready_tx = self.ready_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        let (Some(writer), Some(ready_tx)) = (writer, ready_tx) else {
            tracing::warn!("system actor already started");
            return;
        };

        if let Err(e) = std::thread::Builder::new()
            .name("system".into())
            .spawn(move || run(writer, sender, receiver, ready_tx))
        {
            tracing::error!("failed to spawn system thread: {e}");
        }
    }
}

fn run(
    writer: MatchSessionWriter,
    sender: BusSender,
    mut receiver: BusReceiver,
    ready_tx: std_mpsc::SyncSender<()>,
) {
    // Signal main thread that we're up and polling.
    let _ = ready_tx.send(());
    drop(ready_tx);

    loop {
        match receiver.poll() {
            Err(PollError::Shutdown) => return,
            Ok(None) => {
                std::thread::sleep(Duration::from_millis(20));
            }
            Ok(Some(msg)) => {
                if let RallypointEvent::MatchCommand(cmd) = &msg.event {
                    tracing::debug!("{} from '{}'", cmd.action, msg.source);
                    for reply in handle_command(&writer, cmd) {
                        sender.send(reply);
                    }
                }
            }
        }
    }
}

/// Apply one command and build the messages to publish.
pub(crate) fn handle_command(
    writer: &MatchSessionWriter,
    cmd: &MatchCommand,
) -> Vec<RallypointMessage> {
    match writer.apply(&cmd.action) {
        Ok(applied) => {
            let mut out = vec![RallypointMessage::new(MatchUpdate {
                request_id: cmd.request_id.clone(),
                view: Some(Box::new(applied.view)),
                error: None,
            })];
            if let Some(record) = applied.completed {
                tracing::info!(
                    "match complete: {} won {}-{} ({})",
                    record.winner_name(),
                    record.sets_won_a.max(record.sets_won_b),
                    record.sets_won_a.min(record.sets_won_b),
                    record.id
                );
                out.push(RallypointMessage::new(record));
            }
            out
        }
        Err(error) => {
            tracing::warn!("{} rejected: {error}", cmd.action);
            vec![RallypointMessage::new(MatchUpdate {
                request_id: cmd.request_id.clone(),
                view: None,
                error: Some(error),
            })]
        }
    }
}
