//! JSON request/response types for the web API.
//!
//! Shared REST bodies live in the `rallypoint` lib; WebSocket and query
//! types that only this server parses live here.

use serde::Deserialize;

pub use rallypoint::{ErrorResponse, ResetRequest, ScoreRequest, StatusResponse};
use rallypoint::{MatchAction, Team};

/// `GET /api/history?limit=N`
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Command frame sent by a WebSocket client after the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum WsCommand {
    Score {
        team: Team,
    },
    Undo,
    Reset {
        #[serde(default)]
        initial_server: Option<Team>,
        #[serde(default)]
        initial_server_index: Option<u8>,
    },
}

impl From<WsCommand> for MatchAction {
    fn from(cmd: WsCommand) -> Self {
        match cmd {
            WsCommand::Score { team } => MatchAction::Score { team },
            WsCommand::Undo => MatchAction::Undo,
            WsCommand::Reset {
                initial_server,
                initial_server_index,
            } => MatchAction::Reset {
                initial_server,
                initial_server_index,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_commands_parse() {
        let score: WsCommand = serde_json::from_str(r#"{"cmd":"score","team":"B"}"#).unwrap();
        assert_eq!(score, WsCommand::Score { team: Team::B });

        let undo: WsCommand = serde_json::from_str(r#"{"cmd":"undo"}"#).unwrap();
        assert_eq!(undo, WsCommand::Undo);

        let reset: WsCommand = serde_json::from_str(r#"{"cmd":"reset"}"#).unwrap();
        assert_eq!(
            reset,
            WsCommand::Reset {
                initial_server: None,
                initial_server_index: None
            }
        );
    }

    #[test]
    fn unknown_ws_command_is_rejected() {
        assert!(serde_json::from_str::<WsCommand>(r#"{"cmd":"mode"}"#).is_err());
        assert!(serde_json::from_str::<WsCommand>(r#"{"cmd":"score","team":"C"}"#).is_err());
    }

    #[test]
    fn history_limit_defaults() {
        let query: HistoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
    }
}
