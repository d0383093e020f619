//! Match state snapshot: the sole mutable entity of a match, replaced
//! wholesale on every rally.

use serde::{Deserialize, Serialize};

use crate::{GameType, Team};

/// Immutable snapshot of a match in progress (or finished).
///
/// `team_*_player_in_right` name the player index (0 or 1) standing in that
/// team's right service court. Doubles only; singles keeps them at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchState {
    pub score_a: u32,
    pub score_b: u32,
    pub sets_won_a: u32,
    pub sets_won_b: u32,
    pub current_set: u32,
    #[serde(default)]
    pub match_winner: Option<Team>,
    pub current_server: Team,
    pub game_type: GameType,
    #[serde(default)]
    pub team_a_player_in_right: u8,
    #[serde(default)]
    pub team_b_player_in_right: u8,
}

/// Coarse lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    InProgress,
    Terminal,
}

/// Final points of a completed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub points_a: u32,
    pub points_b: u32,
    pub winner: Team,
}

impl MatchState {
    /// Fresh 0-0 state for set 1.
    ///
    /// The serving team's right court holds `initial_server_index` in doubles;
    /// the receiving team starts with player 0 on the right. Singles ignores
    /// the index.
    pub fn new(initial_server: Team, game_type: GameType, initial_server_index: u8) -> Self {
        let index = match game_type {
            GameType::Singles => 0,
            GameType::Doubles => normalize_index(initial_server_index),
        };
        let (a_right, b_right) = match initial_server {
            Team::A => (index, 0),
            Team::B => (0, index),
        };
        Self {
            score_a: 0,
            score_b: 0,
            sets_won_a: 0,
            sets_won_b: 0,
            current_set: 1,
            match_winner: None,
            current_server: initial_server,
            game_type,
            team_a_player_in_right: a_right,
            team_b_player_in_right: b_right,
        }
    }

    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::A => self.score_a,
            Team::B => self.score_b,
        }
    }

    pub fn sets_won(&self, team: Team) -> u32 {
        match team {
            Team::A => self.sets_won_a,
            Team::B => self.sets_won_b,
        }
    }

    pub fn player_in_right(&self, team: Team) -> u8 {
        match team {
            Team::A => self.team_a_player_in_right,
            Team::B => self.team_b_player_in_right,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.match_winner.is_some()
    }

    pub fn status(&self) -> MatchStatus {
        if self.is_terminal() {
            MatchStatus::Terminal
        } else {
            MatchStatus::InProgress
        }
    }

    pub(crate) fn score_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::A => &mut self.score_a,
            Team::B => &mut self.score_b,
        }
    }

    pub(crate) fn sets_won_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::A => &mut self.sets_won_a,
            Team::B => &mut self.sets_won_b,
        }
    }

    pub(crate) fn player_in_right_mut(&mut self, team: Team) -> &mut u8 {
        match team {
            Team::A => &mut self.team_a_player_in_right,
            Team::B => &mut self.team_b_player_in_right,
        }
    }
}

/// Collapse any player index onto 0 or 1.
pub(crate) fn normalize_index(index: u8) -> u8 {
    if index == 0 { 0 } else { 1 }
}
