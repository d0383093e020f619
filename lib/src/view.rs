//! Read-only match view handed to presentation clients. Recomputed from the
//! engine after every command; never written back.

use serde::{Deserialize, Serialize};

use crate::court::{
    self, CourtSide, PlayerAssignment, Rect, ServiceCourt, Vertical, marker_anchor,
};
use crate::state::SetScore;
use crate::{GameType, MatchEngine, MatchSetup, MatchState, MatchStatus, Team};

/// A player dot on the court diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMarker {
    pub team: Team,
    pub index: u8,
    pub name: String,
    pub side: CourtSide,
    pub vertical: Vertical,
    pub x: f64,
    pub y: f64,
}

/// Everything derived from state for drawing the court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtView {
    #[serde(default)]
    pub service_box: Option<Rect>,
    #[serde(default)]
    pub service_court: Option<ServiceCourt>,
    #[serde(default)]
    pub server_name_a: Option<String>,
    #[serde(default)]
    pub server_name_b: Option<String>,
    #[serde(default)]
    pub players: Vec<PlayerMarker>,
}

impl CourtView {
    pub fn resolve(state: &MatchState, setup: &MatchSetup) -> Self {
        let players = match state.game_type {
            GameType::Singles => Team::ALL
                .iter()
                .map(|&team| {
                    let assignment = PlayerAssignment {
                        side: CourtSide::of(team),
                        vertical: court::singles_player_vertical(team, state),
                    };
                    marker(setup, team, 0, assignment)
                })
                .collect(),
            GameType::Doubles => Team::ALL
                .iter()
                .flat_map(|&team| {
                    (0..2u8).map(move |index| {
                        let assignment = court::player_court_assignment(team, index, state);
                        marker(setup, team, index, assignment)
                    })
                })
                .collect(),
        };

        Self {
            service_box: court::active_service_box(state),
            service_court: court::service_court(state).map(|(_, c)| c),
            server_name_a: court::server_name(state, Team::A, setup.names(Team::A))
                .map(str::to_string),
            server_name_b: court::server_name(state, Team::B, setup.names(Team::B))
                .map(str::to_string),
            players,
        }
    }
}

fn marker(setup: &MatchSetup, team: Team, index: u8, assignment: PlayerAssignment) -> PlayerMarker {
    let (x, y) = marker_anchor(assignment);
    let name = setup
        .names(team)
        .get(index as usize)
        .cloned()
        .unwrap_or_else(|| format!("{team}{}", index + 1));
    PlayerMarker {
        team,
        index,
        name,
        side: assignment.side,
        vertical: assignment.vertical,
        x,
        y,
    }
}

/// Snapshot of a live match for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchView {
    pub setup: MatchSetup,
    pub state: MatchState,
    pub status: MatchStatus,
    pub can_undo: bool,
    #[serde(default)]
    pub completed_sets: Vec<SetScore>,
    pub court: CourtView,
}

impl MatchView {
    pub fn new(setup: &MatchSetup, engine: &MatchEngine) -> Self {
        let state = *engine.state();
        Self {
            setup: setup.clone(),
            state,
            status: state.status(),
            can_undo: engine.can_undo(),
            completed_sets: engine.completed_sets().to_vec(),
            court: CourtView::resolve(&state, setup),
        }
    }
}
