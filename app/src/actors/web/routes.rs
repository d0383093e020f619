//! REST endpoint handlers.
//!
//! Reads come straight from `SystemState`. Mutations are bus request-reply:
//! the handler emits a `MatchCommand` and waits for the system actor's
//! `MatchUpdate` with the same `request_id`.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use super::types::{ErrorResponse, HistoryQuery, ResetRequest, ScoreRequest, StatusResponse};
use super::{REPLY_TIMEOUT, WebState};
use crate::bus;
use crate::state::config::RallypointConfig;
use rallypoint::{CommandError, MatchAction, MatchRecord, MatchSetup, MatchUpdate, MatchView};

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a system actor reply (or its absence) onto an HTTP result.
fn reply_to_result(reply: Option<MatchUpdate>) -> ApiResult<MatchView> {
    let Some(update) = reply else {
        return Err(api_error(
            StatusCode::GATEWAY_TIMEOUT,
            "timed out waiting for the match session",
        ));
    };
    match (update.view, update.error) {
        (_, Some(error @ CommandError::NoActiveMatch)) => {
            Err(api_error(StatusCode::CONFLICT, error.to_string()))
        }
        (_, Some(error @ CommandError::InvalidSetup { .. })) => {
            Err(api_error(StatusCode::BAD_REQUEST, error.to_string()))
        }
        (Some(view), None) => Ok(Json(*view)),
        (None, None) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "empty reply from the match session",
        )),
    }
}

async fn dispatch(state: &WebState, action: MatchAction) -> ApiResult<MatchView> {
    let reply = bus::request(&state.bus_tx, &state.actor_id, action, REPLY_TIMEOUT).await;
    reply_to_result(reply)
}

/// GET /api/status
pub async fn get_status(State(state): State<Arc<WebState>>) -> Json<StatusResponse> {
    let actors_guard = state.actors.read().await;
    let actors = actors_guard
        .iter()
        .map(|(id, a)| (id.clone(), a.clone()))
        .collect();

    let match_status = state.root.session.status();
    Json(StatusResponse {
        actors,
        match_status,
    })
}

/// GET /api/match: the live match, 409 before one is started.
pub async fn get_match(State(state): State<Arc<WebState>>) -> ApiResult<MatchView> {
    state
        .root
        .session
        .snapshot()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::CONFLICT, CommandError::NoActiveMatch.to_string()))
}

/// POST /api/match: start a new match, replacing any live one.
pub async fn post_match(
    State(state): State<Arc<WebState>>,
    Json(setup): Json<MatchSetup>,
) -> ApiResult<MatchView> {
    dispatch(&state, MatchAction::Start { setup }).await
}

/// POST /api/match/score
pub async fn post_score(
    State(state): State<Arc<WebState>>,
    Json(body): Json<ScoreRequest>,
) -> ApiResult<MatchView> {
    dispatch(&state, MatchAction::Score { team: body.team }).await
}

/// POST /api/match/undo
pub async fn post_undo(State(state): State<Arc<WebState>>) -> ApiResult<MatchView> {
    dispatch(&state, MatchAction::Undo).await
}

/// POST /api/match/reset: body optional; overrides the initial server.
pub async fn post_reset(State(state): State<Arc<WebState>>, body: Bytes) -> ApiResult<MatchView> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ResetRequest::default()
    } else {
        serde_json::from_slice::<ResetRequest>(&body)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("invalid reset body: {e}")))?
    };
    dispatch(&state, request.into()).await
}

/// GET /api/history?limit=50: most recent first.
pub async fn get_history(
    State(state): State<Arc<WebState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<MatchRecord>> {
    let mut records = state.root.history.load();
    records.truncate(query.limit);
    Json(records)
}

/// GET /api/settings: returns the effective config.
pub async fn get_settings(State(state): State<Arc<WebState>>) -> Json<RallypointConfig> {
    Json(state.root.system.snapshot())
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;

    use super::*;
    use crate::actors::Actor;
    use crate::actors::system::SystemActor;
    use crate::bus::{BUS_CAPACITY, BusSender};
    use crate::state::SystemState;
    use crate::state::config::SystemConfig;
    use crate::state::history::MemoryHistory;
    use rallypoint::{MatchStatus, Team};

    /// Web state wired to a running system actor, as `main` does it.
    fn harness(dir: &tempfile::TempDir) -> Arc<WebState> {
        let system = SystemConfig::new(dir.path().join("config.toml"));
        let (root, writer) = SystemState::new(system, Arc::new(MemoryHistory::default()));
        let root = Arc::new(root);
        let (bus_tx, _) = broadcast::channel(BUS_CAPACITY);

        let shutdown = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let sender = BusSender::new("system".into(), bus_tx.clone(), shutdown);
        let receiver = sender.subscribe();
        let (actor, ready_rx) = SystemActor::new(writer);
        actor.start(Arc::clone(&root), sender, receiver);
        ready_rx.recv().unwrap();

        Arc::new(WebState::new(
            root,
            bus_tx,
            "127.0.0.1:0".parse().unwrap(),
            "webserver.0".into(),
        ))
    }

    fn status_of<T>(result: ApiResult<T>) -> StatusCode {
        match result {
            Ok(_) => StatusCode::OK,
            Err((status, _)) => status,
        }
    }

    #[test]
    fn reply_mapping() {
        assert_eq!(status_of(reply_to_result(None)), StatusCode::GATEWAY_TIMEOUT);
        let conflict = MatchUpdate {
            request_id: None,
            view: None,
            error: Some(CommandError::NoActiveMatch),
        };
        assert_eq!(status_of(reply_to_result(Some(conflict))), StatusCode::CONFLICT);
        let invalid = MatchUpdate {
            request_id: None,
            view: None,
            error: Some(CommandError::InvalidSetup {
                message: "team A player 1 has no name".into(),
            }),
        };
        assert_eq!(status_of(reply_to_result(Some(invalid))), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn match_lifecycle_over_rest() {
        let dir = tempfile::tempdir().unwrap();
        let state = harness(&dir);

        assert_eq!(
            status_of(get_match(State(Arc::clone(&state))).await),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(post_undo(State(Arc::clone(&state))).await),
            StatusCode::CONFLICT
        );

        let setup = MatchSetup::singles("Lee", "Tan", Team::A);
        let Json(view) = post_match(State(Arc::clone(&state)), Json(setup))
            .await
            .unwrap();
        assert_eq!(view.state.current_server, Team::A);

        let Json(view) = post_score(
            State(Arc::clone(&state)),
            Json(ScoreRequest { team: Team::B }),
        )
        .await
        .unwrap();
        assert_eq!(view.state.score_b, 1);
        assert_eq!(view.state.current_server, Team::B);

        let Json(view) = post_undo(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(view.state.score_b, 0);

        let Json(view) = post_reset(
            State(Arc::clone(&state)),
            Bytes::from_static(br#"{"initial_server":"B"}"#),
        )
        .await
        .unwrap();
        assert_eq!(view.state.current_server, Team::B);

        let Json(view) = get_match(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(view.setup.initial_server, Team::B);

        let Json(status) = get_status(State(Arc::clone(&state))).await;
        assert_eq!(status.match_status, Some(MatchStatus::InProgress));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_setup_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = harness(&dir);
        let setup = MatchSetup::singles("", "Tan", Team::A);
        assert_eq!(
            status_of(post_match(State(state), Json(setup)).await),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_reset_body_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = harness(&dir);
        let result = post_reset(State(state), Bytes::from_static(b"{not json")).await;
        assert_eq!(status_of(result), StatusCode::BAD_REQUEST);
    }
}
