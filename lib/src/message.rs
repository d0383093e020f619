//! Unified `RallypointMessage` bus types.
//!
//! All events flow through a single `broadcast<RallypointMessage>` channel.
//! Each message has a source (global ID of the originator), a timestamp, and
//! a typed event. Producers create messages; consumers subscribe and filter.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MatchRecord, MatchSetup, MatchView, Team};

// ---------------------------------------------------------------------------
// Top-level message
// ---------------------------------------------------------------------------

/// A single event on the unified bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RallypointMessage {
    #[serde(default)]
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub event: RallypointEvent,
}

impl RallypointMessage {
    /// Create a new message with the current UTC timestamp.
    pub fn new(event: impl Into<RallypointEvent>) -> Self {
        Self {
            source: String::new(),
            timestamp: Utc::now(),
            event: event.into(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

// ---------------------------------------------------------------------------
// From impls: inner event types -> RallypointEvent
// ---------------------------------------------------------------------------

impl From<MatchCommand> for RallypointEvent {
    fn from(cmd: MatchCommand) -> Self {
        RallypointEvent::MatchCommand(cmd)
    }
}

impl From<MatchAction> for RallypointEvent {
    fn from(action: MatchAction) -> Self {
        RallypointEvent::MatchCommand(MatchCommand {
            request_id: None,
            action,
        })
    }
}

impl From<MatchUpdate> for RallypointEvent {
    fn from(update: MatchUpdate) -> Self {
        RallypointEvent::MatchUpdate(update)
    }
}

impl From<MatchRecord> for RallypointEvent {
    fn from(record: MatchRecord) -> Self {
        RallypointEvent::MatchCompleted(Box::new(record))
    }
}

impl From<ActorState> for RallypointEvent {
    fn from(state: ActorState) -> Self {
        RallypointEvent::ActorStatus(state)
    }
}

impl From<AlertMessage> for RallypointEvent {
    fn from(alert: AlertMessage) -> Self {
        RallypointEvent::Alert(alert)
    }
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// The typed event payload carried by a `RallypointMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RallypointEvent {
    /// Scoring command (from REST or a WS client).
    MatchCommand(MatchCommand),
    /// Match view after a command was applied (emitted by SystemActor).
    MatchUpdate(MatchUpdate),
    /// A match just ended; consumed by the recorder.
    MatchCompleted(Box<MatchRecord>),
    /// Generic actor status update.
    ActorStatus(ActorState),
    /// Alert for user-visible warn/error conditions.
    Alert(AlertMessage),
}

// ---------------------------------------------------------------------------
// MatchCommand: scoring requests
// ---------------------------------------------------------------------------

/// A request to change the live match.
///
/// Processed exclusively by `SystemActor`, one at a time, in bus order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCommand {
    /// Opaque correlation ID. When present, the resulting `MatchUpdate`
    /// carries the same ID (request-reply pattern).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub action: MatchAction,
}

/// The specific match mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchAction {
    /// Replace the live match with a new one built from `setup`.
    Start { setup: MatchSetup },
    /// Award a rally.
    Score { team: Team },
    /// Roll back the last rally.
    Undo,
    /// Restart the live match with the same names. Omitted fields keep the
    /// current setup's values.
    Reset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_server: Option<Team>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_server_index: Option<u8>,
    },
}

impl fmt::Display for MatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { setup } => write!(f, "start {}", setup.game_type),
            Self::Score { team } => write!(f, "score {team}"),
            Self::Undo => write!(f, "undo"),
            Self::Reset { .. } => write!(f, "reset"),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchUpdate: command acknowledgment + new view
// ---------------------------------------------------------------------------

/// Result of a `MatchCommand`. Exactly one of `view` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<Box<MatchView>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

/// Why a command was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CommandError {
    NoActiveMatch,
    InvalidSetup { message: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveMatch => write!(f, "no match in progress"),
            Self::InvalidSetup { message } => write!(f, "invalid setup: {message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ActorStatus: generic actor lifecycle
// ---------------------------------------------------------------------------

/// Generic actor lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorStatus {
    Starting,
    Disconnected,
    Connected,
}

impl fmt::Display for ActorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Actor state emitted on the bus. Carries lifecycle status and
/// actor-specific key/value telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorState {
    pub status: ActorStatus,
    #[serde(default)]
    pub telemetry: HashMap<String, String>,
}

impl ActorState {
    pub fn new(status: ActorStatus, telemetry: HashMap<String, String>) -> Self {
        Self { status, telemetry }
    }
}

// ---------------------------------------------------------------------------
// AlertMessage: user-visible warn/error notifications
// ---------------------------------------------------------------------------

/// Severity level for alert messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warn,
    Error,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Warn => write!(f, "warn"),
            AlertLevel::Error => write!(f, "error"),
        }
    }
}

/// A user-visible alert. Info/debug/trace stays in the tracing backend;
/// warn/error conditions surface here for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMessage {
    pub level: AlertLevel,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_format() {
        let msg = RallypointMessage::new(MatchAction::Score { team: Team::A }).source("web");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["source"], "web");
        assert_eq!(json["event"]["kind"], "match_command");
        assert_eq!(json["event"]["action"]["type"], "score");
        assert_eq!(json["event"]["action"]["team"], "A");
        assert!(json["event"].get("request_id").is_none());
    }

    #[test]
    fn reset_parses_without_overrides() {
        let action: MatchAction = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert!(matches!(
            action,
            MatchAction::Reset {
                initial_server: None,
                initial_server_index: None
            }
        ));
    }

    #[test]
    fn command_error_wire_format() {
        let json = serde_json::to_value(CommandError::NoActiveMatch).unwrap();
        assert_eq!(json["reason"], "no_active_match");
    }
}
