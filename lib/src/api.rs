//! REST API request/response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ActorStatus, MatchAction, MatchStatus, Team};

/// GET /api/status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub actors: HashMap<String, ActorStatusResponse>,
    #[serde(default)]
    pub match_status: Option<MatchStatus>,
}

/// Per-actor status within the status response. Also used as the cached
/// per-actor state in the web layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorStatusResponse {
    #[serde(default)]
    pub name: String,
    pub status: ActorStatus,
    #[serde(default)]
    pub telemetry: HashMap<String, String>,
}

/// POST /api/match/score request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreRequest {
    pub team: Team,
}

/// POST /api/match/reset request body. Omitted fields keep the current setup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub initial_server: Option<Team>,
    #[serde(default)]
    pub initial_server_index: Option<u8>,
}

impl From<ResetRequest> for MatchAction {
    fn from(req: ResetRequest) -> Self {
        MatchAction::Reset {
            initial_server: req.initial_server,
            initial_server_index: req.initial_server_index,
        }
    }
}

/// Error body for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_request_becomes_reset_action() {
        let action: MatchAction = ResetRequest {
            initial_server: Some(Team::B),
            initial_server_index: None,
        }
        .into();
        assert!(matches!(
            action,
            MatchAction::Reset {
                initial_server: Some(Team::B),
                initial_server_index: None,
            }
        ));

        let action: MatchAction = ResetRequest::default().into();
        assert!(matches!(
            action,
            MatchAction::Reset {
                initial_server: None,
                initial_server_index: None,
            }
        ));
    }
}
