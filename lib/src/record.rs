//! Completed-match summary handed to the history store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::SetScore;
use crate::{GameType, MatchSetup, MatchState, Team};

/// One finished match. `score_a`/`score_b` are the final state fields, which
/// read 0-0 because the deciding set resets them; `set_scores` keeps the
/// per-set points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub team_a: String,
    pub team_b: String,
    pub score_a: u32,
    pub score_b: u32,
    pub sets_won_a: u32,
    pub sets_won_b: u32,
    pub match_winner: Team,
    pub game_type: GameType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_scores: Vec<SetScore>,
}

impl MatchRecord {
    /// Build a record from a terminal state. `None` while the match is still
    /// in progress.
    pub fn from_final(
        setup: &MatchSetup,
        state: &MatchState,
        set_scores: &[SetScore],
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        let match_winner = state.match_winner?;
        Some(Self {
            id: Uuid::new_v4(),
            timestamp,
            team_a: setup.display_name(Team::A),
            team_b: setup.display_name(Team::B),
            score_a: state.score_a,
            score_b: state.score_b,
            sets_won_a: state.sets_won_a,
            sets_won_b: state.sets_won_b,
            match_winner,
            game_type: state.game_type,
            set_scores: set_scores.to_vec(),
        })
    }

    /// Display name of the winning side.
    pub fn winner_name(&self) -> &str {
        match self.match_winner {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_record_while_in_progress() {
        let setup = MatchSetup::singles("Lee", "Tan", Team::A);
        let engine = setup.engine();
        assert!(MatchRecord::from_final(&setup, engine.state(), &[], Utc::now()).is_none());
    }

    #[test]
    fn record_carries_final_fields() {
        let setup = MatchSetup::doubles(["Ann", "Bea"], ["Cy", "Di"], Team::B, 0);
        let mut engine = setup.engine();
        for _ in 0..42 {
            engine.score(Team::B);
        }
        let record =
            MatchRecord::from_final(&setup, engine.state(), engine.completed_sets(), Utc::now())
                .unwrap();
        assert_eq!(record.team_b, "Cy & Di");
        assert_eq!(record.winner_name(), "Cy & Di");
        assert_eq!((record.sets_won_a, record.sets_won_b), (0, 2));
        assert_eq!((record.score_a, record.score_b), (0, 0));
        assert_eq!(record.game_type, GameType::Doubles);
        assert_eq!(record.set_scores.len(), 2);
        assert_eq!(record.set_scores[1].points_b, 21);
    }
}
