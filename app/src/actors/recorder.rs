//! History recorder: appends every `MatchCompleted` record to the
//! configured history store.
//!
//! Storage failures never stop scoring: they are logged and surfaced to
//! clients as an `Alert`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::actors::Actor;
use crate::bus::{BusReceiver, BusSender, PollError};
use crate::state::SystemState;
use crate::state::history::HistoryStore;
use rallypoint::{
    ActorState, ActorStatus, AlertLevel, AlertMessage, MatchRecord, RallypointEvent,
    RallypointMessage,
};

pub struct RecorderActor;

impl Actor for RecorderActor {
    fn start(&self, state: Arc<SystemState>, sender: BusSender, receiver: BusReceiver) {
        let history = Arc::clone(&state.history);
        if let Err(e) = std::thread::Builder::new()
            .name(sender.actor_id().to_string())
            .spawn(move || run(history, sender, receiver))
        {
            tracing::error!("failed to spawn recorder thread: {e}");
        }
    }
}

fn run(history: Arc<dyn HistoryStore>, sender: BusSender, mut receiver: BusReceiver) {
    emit_status(&sender, ActorStatus::Starting, 0);
    let mut recorded = history.load().len();
    emit_status(&sender, ActorStatus::Connected, recorded);

    loop {
        match receiver.poll() {
            Err(PollError::Shutdown) => return,
            Ok(None) => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Ok(Some(msg)) => {
                if let RallypointEvent::MatchCompleted(record) = msg.event {
                    match record_completed(history.as_ref(), *record) {
                        Ok(()) => {
                            recorded += 1;
                            emit_status(&sender, ActorStatus::Connected, recorded);
                        }
                        Err(alert) => sender.send(RallypointMessage::new(alert)),
                    }
                }
            }
        }
    }
}

fn emit_status(sender: &BusSender, status: ActorStatus, recorded: usize) {
    let telemetry = HashMap::from([("records".to_string(), recorded.to_string())]);
    sender.send(RallypointMessage::new(ActorState::new(status, telemetry)));
}

/// Persist one record. On failure returns the alert to publish.
pub(crate) fn record_completed(
    history: &dyn HistoryStore,
    record: MatchRecord,
) -> Result<(), AlertMessage> {
    let id = record.id;
    match history.append(record) {
        Ok(()) => {
            tracing::info!("recorded match {id}");
            Ok(())
        }
        Err(e) => {
            tracing::warn!("failed to record match {id}: {e:#}");
            Err(AlertMessage {
                level: AlertLevel::Error,
                message: format!("match result not saved: {e}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::history::{JsonHistoryFile, MemoryHistory};
    use chrono::Utc;
    use rallypoint::{MatchSetup, Team};

    fn finished() -> MatchRecord {
        let setup = MatchSetup::doubles(["Ann", "Bea"], ["Cy", "Di"], Team::B, 1);
        let mut engine = setup.engine();
        for _ in 0..42 {
            engine.score(Team::B);
        }
        MatchRecord::from_final(&setup, engine.state(), engine.completed_sets(), Utc::now())
            .unwrap()
    }

    #[test]
    fn stores_record() {
        let history = MemoryHistory::default();
        record_completed(&history, finished()).unwrap();
        let records = history.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].winner_name(), "Cy & Di");
    }

    #[test]
    fn unreadable_history_is_left_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[{\"truncated\": ").unwrap();
        let history = JsonHistoryFile::new(path.clone());
        let alert = record_completed(&history, finished()).unwrap_err();
        assert_eq!(alert.level, AlertLevel::Error);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[{\"truncated\": "
        );
    }

    #[test]
    fn storage_failure_becomes_alert() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail.
        let path = dir.path().join("history.json");
        std::fs::create_dir(&path).unwrap();
        let history = JsonHistoryFile::new(path);
        let alert = record_completed(&history, finished()).unwrap_err();
        assert_eq!(alert.level, AlertLevel::Error);
        assert!(alert.message.starts_with("match result not saved"));
    }
}
