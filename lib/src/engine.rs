//! Match engine: owns the live `MatchState`, its undo history, and the
//! scores of completed sets.

use std::collections::VecDeque;

use crate::rules::{RallyOutcome, apply_rally};
use crate::state::SetScore;
use crate::{GameType, MatchState, Team};

/// Snapshots retained for undo by default. Longer than any best-of-three
/// match can run (3 sets × 59 rallies).
pub const DEFAULT_UNDO_DEPTH: usize = 256;

/// Deterministic scoring state machine for one match.
///
/// Every accepted rally pushes the prior state onto a bounded LIFO history;
/// `undo` pops it back. `reset_match` discards everything.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    state: MatchState,
    history: VecDeque<MatchState>,
    completed_sets: Vec<SetScore>,
    undo_depth: usize,
}

impl MatchEngine {
    pub fn new(initial_server: Team, game_type: GameType, initial_server_index: u8) -> Self {
        Self {
            state: MatchState::new(initial_server, game_type, initial_server_index),
            history: VecDeque::new(),
            completed_sets: Vec::new(),
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }

    /// Cap the undo history. A depth of zero is raised to one.
    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.undo_depth = depth.max(1);
        while self.history.len() > self.undo_depth {
            self.history.pop_front();
        }
        self
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Score a rally for `winner` and return the new state. No-op once the
    /// match is decided.
    pub fn score(&mut self, winner: Team) -> MatchState {
        self.score_rally(winner);
        self.state
    }

    /// Like [`score`](Self::score) but reports what the rally did.
    pub fn score_rally(&mut self, winner: Team) -> RallyOutcome {
        let (next, outcome) = apply_rally(&self.state, winner);
        match outcome {
            RallyOutcome::Ignored => return outcome,
            RallyOutcome::SetWon { set, .. } | RallyOutcome::MatchWon { set, .. } => {
                self.completed_sets.push(set);
            }
            RallyOutcome::Point { .. } => {}
        }
        if self.history.len() == self.undo_depth {
            self.history.pop_front();
        }
        self.history.push_back(self.state);
        self.state = next;
        outcome
    }

    /// Roll back exactly one rally. No-op with empty history.
    pub fn undo(&mut self) -> MatchState {
        if let Some(previous) = self.history.pop_back() {
            let sets_now = self.state.sets_won_a + self.state.sets_won_b;
            let sets_then = previous.sets_won_a + previous.sets_won_b;
            if sets_then < sets_now {
                self.completed_sets.pop();
            }
            self.state = previous;
        }
        self.state
    }

    /// Start over with a fresh 0-0 match. Undo history does not survive.
    pub fn reset_match(
        &mut self,
        initial_server: Team,
        game_type: GameType,
        initial_server_index: u8,
    ) -> MatchState {
        self.history.clear();
        self.completed_sets.clear();
        self.state = MatchState::new(initial_server, game_type, initial_server_index);
        self.state
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Number of rallies that can currently be undone.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    /// Final points of each completed set, oldest first.
    pub fn completed_sets(&self) -> &[SetScore] {
        &self.completed_sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(engine: &mut MatchEngine, rallies: &[Team]) {
        for &team in rallies {
            engine.score(team);
        }
    }

    #[test]
    fn undo_on_fresh_engine_is_noop() {
        let mut engine = MatchEngine::new(Team::A, GameType::Singles, 0);
        let before = *engine.state();
        assert_eq!(engine.undo(), before);
        assert!(!engine.can_undo());
    }

    #[test]
    fn undo_walks_back_in_lifo_order() {
        let mut engine = MatchEngine::new(Team::A, GameType::Doubles, 0);
        let s0 = *engine.state();
        let s1 = engine.score(Team::A);
        engine.score(Team::B);
        assert_eq!(engine.undo(), s1);
        assert_eq!(engine.undo(), s0);
        assert_eq!(engine.undo(), s0);
    }

    #[test]
    fn scoring_after_match_end_pushes_no_history() {
        let mut engine = MatchEngine::new(Team::B, GameType::Singles, 0);
        run(&mut engine, &[Team::B; 42]);
        assert_eq!(engine.state().match_winner, Some(Team::B));
        let len = engine.history_len();
        let terminal = *engine.state();
        assert_eq!(engine.score(Team::A), terminal);
        assert_eq!(engine.history_len(), len);
    }

    #[test]
    fn undo_reopens_a_finished_match() {
        let mut engine = MatchEngine::new(Team::A, GameType::Singles, 0);
        run(&mut engine, &[Team::A; 42]);
        assert!(engine.state().is_terminal());
        let restored = engine.undo();
        assert_eq!(restored.match_winner, None);
        assert_eq!(restored.score_a, 20);
        assert_eq!(engine.completed_sets().len(), 1);
        let again = engine.score(Team::B);
        assert_eq!(again.score_b, 1);
    }

    #[test]
    fn completed_sets_track_set_boundaries() {
        let mut engine = MatchEngine::new(Team::A, GameType::Singles, 0);
        run(&mut engine, &[Team::A; 21]);
        assert_eq!(
            engine.completed_sets(),
            &[SetScore {
                points_a: 21,
                points_b: 0,
                winner: Team::A
            }]
        );
        engine.undo();
        assert!(engine.completed_sets().is_empty());
    }

    #[test]
    fn reset_discards_history_and_sets() {
        let mut engine = MatchEngine::new(Team::A, GameType::Singles, 0);
        run(&mut engine, &[Team::A; 25]);
        let fresh = engine.reset_match(Team::B, GameType::Doubles, 1);
        assert_eq!(fresh, MatchState::new(Team::B, GameType::Doubles, 1));
        assert!(!engine.can_undo());
        assert!(engine.completed_sets().is_empty());
        assert_eq!(engine.undo(), fresh);
    }

    #[test]
    fn history_is_bounded() {
        let mut engine = MatchEngine::new(Team::A, GameType::Singles, 0).with_undo_depth(3);
        run(&mut engine, &[Team::A, Team::B, Team::A, Team::B, Team::A]);
        assert_eq!(engine.history_len(), 3);
        engine.undo();
        engine.undo();
        let oldest = engine.undo();
        assert_eq!((oldest.score_a, oldest.score_b), (1, 1));
        assert!(!engine.can_undo());
    }

    #[test]
    fn zero_depth_still_keeps_one_snapshot() {
        let mut engine = MatchEngine::new(Team::A, GameType::Singles, 0).with_undo_depth(0);
        assert_eq!(engine.undo_depth(), 1);
        engine.score(Team::A);
        engine.score(Team::A);
        assert_eq!(engine.history_len(), 1);
    }
}
