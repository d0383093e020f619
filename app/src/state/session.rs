//! Match session: the live setup + engine pair.
//!
//! Schema types come from the `rallypoint` lib. The session store stays here
//! (it uses `RwLock` and is not part of the wire schema).

use std::sync::{Arc, RwLock};

use chrono::Utc;

use rallypoint::{
    CommandError, GameType, MatchAction, MatchEngine, MatchRecord, MatchSetup, MatchStatus,
    MatchView, RallyOutcome, Team,
};

struct ActiveMatch {
    setup: MatchSetup,
    engine: MatchEngine,
}

impl ActiveMatch {
    fn view(&self) -> MatchView {
        MatchView::new(&self.setup, &self.engine)
    }
}

/// Shared interior state backing both `MatchSession` (read) and
/// `MatchSessionWriter` (write).
struct SessionInner {
    active: RwLock<Option<ActiveMatch>>,
    undo_depth: usize,
}

/// Read-only session handle. Exposes only snapshots. Lives on
/// `SystemState.session` and is shared with the web layer.
pub struct MatchSession {
    inner: Arc<SessionInner>,
}

/// Write handle for match mutations.
///
/// Only the `SystemActor` holds this, so every command is applied one at a
/// time in bus order.
pub struct MatchSessionWriter {
    inner: Arc<SessionInner>,
}

/// A command that went through.
#[derive(Debug)]
pub struct Applied {
    pub view: MatchView,
    /// Set when this command ended the match.
    pub completed: Option<MatchRecord>,
}

impl MatchSession {
    /// Create an empty session and its companion writer.
    pub fn new(undo_depth: usize) -> (Self, MatchSessionWriter) {
        let inner = Arc::new(SessionInner {
            active: RwLock::new(None),
            undo_depth,
        });
        (
            Self {
                inner: Arc::clone(&inner),
            },
            MatchSessionWriter { inner },
        )
    }

    /// Current view, or `None` before the first match starts.
    pub fn snapshot(&self) -> Option<MatchView> {
        self.inner
            .active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(ActiveMatch::view)
    }

    pub fn status(&self) -> Option<MatchStatus> {
        self.inner
            .active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|m| m.engine.state().status())
    }
}

impl MatchSessionWriter {
    /// Apply one bus command.
    pub fn apply(&self, action: &MatchAction) -> Result<Applied, CommandError> {
        match action {
            MatchAction::Start { setup } => self.start(setup).map(no_record),
            MatchAction::Score { team } => self.score(*team),
            MatchAction::Undo => self.undo().map(no_record),
            MatchAction::Reset {
                initial_server,
                initial_server_index,
            } => self
                .reset(*initial_server, *initial_server_index)
                .map(no_record),
        }
    }

    /// Replace the live match with a fresh one built from `setup`.
    pub fn start(&self, setup: &MatchSetup) -> Result<MatchView, CommandError> {
        let setup = setup.validate().map_err(|e| CommandError::InvalidSetup {
            message: e.to_string(),
        })?;
        let engine = setup.engine().with_undo_depth(self.inner.undo_depth);
        tracing::info!(
            "match started: {} vs {} ({}, {} serves)",
            setup.display_name(Team::A),
            setup.display_name(Team::B),
            setup.game_type,
            setup.initial_server
        );
        let active = ActiveMatch { setup, engine };
        let view = active.view();
        *self.write() = Some(active);
        Ok(view)
    }

    pub fn score(&self, team: Team) -> Result<Applied, CommandError> {
        let mut guard = self.write();
        let active = guard.as_mut().ok_or(CommandError::NoActiveMatch)?;
        let outcome = active.engine.score_rally(team);
        let state = active.engine.state();
        let mut completed = None;
        match outcome {
            RallyOutcome::Ignored => {
                tracing::debug!("rally for {team} ignored: match already decided");
            }
            RallyOutcome::Point { sideout } => {
                tracing::debug!(
                    "rally {team}: {}-{} (set {}){}",
                    state.score_a,
                    state.score_b,
                    state.current_set,
                    if sideout { ", sideout" } else { "" }
                );
            }
            RallyOutcome::SetWon { winner, set } => {
                tracing::info!(
                    "set won by {winner} {}-{}, sets {}-{}",
                    set.points_a,
                    set.points_b,
                    state.sets_won_a,
                    state.sets_won_b
                );
            }
            RallyOutcome::MatchWon { winner, set } => {
                tracing::info!(
                    "match won by {} ({}-{} in the deciding set)",
                    active.setup.display_name(winner),
                    set.points_a,
                    set.points_b
                );
                completed = MatchRecord::from_final(
                    &active.setup,
                    state,
                    active.engine.completed_sets(),
                    Utc::now(),
                );
            }
        }
        Ok(Applied {
            view: active.view(),
            completed,
        })
    }

    pub fn undo(&self) -> Result<MatchView, CommandError> {
        let mut guard = self.write();
        let active = guard.as_mut().ok_or(CommandError::NoActiveMatch)?;
        if !active.engine.can_undo() {
            tracing::debug!("undo ignored: no history");
        }
        let state = active.engine.undo();
        tracing::debug!(
            "undo: {}-{} (set {})",
            state.score_a,
            state.score_b,
            state.current_set
        );
        Ok(active.view())
    }

    /// Restart the live match with the same names. `None` keeps the setup's
    /// current server / server index.
    pub fn reset(
        &self,
        initial_server: Option<Team>,
        initial_server_index: Option<u8>,
    ) -> Result<MatchView, CommandError> {
        let mut guard = self.write();
        let active = guard.as_mut().ok_or(CommandError::NoActiveMatch)?;
        let setup = &mut active.setup;
        if let Some(team) = initial_server {
            setup.initial_server = team;
        }
        if let Some(index) = initial_server_index {
            setup.initial_server_index = index.min(1);
        }
        if setup.game_type == GameType::Singles {
            setup.initial_server_index = 0;
        }
        active.engine.reset_match(
            setup.initial_server,
            setup.game_type,
            setup.initial_server_index,
        );
        tracing::info!("match reset ({} serves)", setup.initial_server);
        Ok(active.view())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<ActiveMatch>> {
        self.inner.active.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn no_record(view: MatchView) -> Applied {
    Applied {
        view,
        completed: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (MatchSession, MatchSessionWriter) {
        MatchSession::new(rallypoint::DEFAULT_UNDO_DEPTH)
    }

    #[test]
    fn commands_need_a_started_match() {
        let (reader, writer) = session();
        assert!(reader.snapshot().is_none());
        assert_eq!(
            writer.score(Team::A).unwrap_err(),
            CommandError::NoActiveMatch
        );
        assert_eq!(writer.undo().unwrap_err(), CommandError::NoActiveMatch);
        assert_eq!(
            writer.reset(None, None).unwrap_err(),
            CommandError::NoActiveMatch
        );
    }

    #[test]
    fn invalid_setup_is_rejected() {
        let (reader, writer) = session();
        let setup = MatchSetup::singles(" ", "Tan", Team::A);
        assert!(matches!(
            writer.start(&setup),
            Err(CommandError::InvalidSetup { .. })
        ));
        assert!(reader.snapshot().is_none());
    }

    #[test]
    fn reader_sees_writer_changes() {
        let (reader, writer) = session();
        writer
            .start(&MatchSetup::singles("Lee", "Tan", Team::A))
            .unwrap();
        writer.score(Team::B).unwrap();
        let view = reader.snapshot().unwrap();
        assert_eq!(view.state.score_b, 1);
        assert_eq!(view.state.current_server, Team::B);
        assert_eq!(reader.status(), Some(MatchStatus::InProgress));
    }

    #[test]
    fn match_end_yields_record_once() {
        let (_reader, writer) = session();
        writer
            .start(&MatchSetup::doubles(["Ann", "Bea"], ["Cy", "Di"], Team::A, 0))
            .unwrap();
        let mut records = Vec::new();
        for _ in 0..45 {
            if let Some(record) = writer.score(Team::A).unwrap().completed {
                records.push(record);
            }
        }
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].team_a, "Ann & Bea");
        assert_eq!(records[0].match_winner, Team::A);
    }

    #[test]
    fn undo_then_rewin_yields_second_record() {
        let (_reader, writer) = session();
        writer
            .start(&MatchSetup::singles("Lee", "Tan", Team::A))
            .unwrap();
        for _ in 0..42 {
            writer.score(Team::A).unwrap();
        }
        writer.undo().unwrap();
        let applied = writer.score(Team::A).unwrap();
        assert!(applied.completed.is_some());
    }

    #[test]
    fn reset_keeps_names_and_applies_overrides() {
        let (_reader, writer) = session();
        writer
            .start(&MatchSetup::doubles(["Ann", "Bea"], ["Cy", "Di"], Team::A, 0))
            .unwrap();
        writer.score(Team::A).unwrap();
        let view = writer.reset(Some(Team::B), Some(1)).unwrap();
        assert_eq!(view.state.score_a, 0);
        assert_eq!(view.state.current_server, Team::B);
        assert_eq!(view.state.team_b_player_in_right, 1);
        assert_eq!(view.setup.team_b, vec!["Cy".to_string(), "Di".to_string()]);
        assert!(!view.can_undo);
    }

    #[test]
    fn apply_dispatches_actions() {
        let (_reader, writer) = session();
        let setup = MatchSetup::singles("Lee", "Tan", Team::B);
        writer.apply(&MatchAction::Start { setup }).unwrap();
        let applied = writer.apply(&MatchAction::Score { team: Team::B }).unwrap();
        assert_eq!(applied.view.state.score_b, 1);
        let applied = writer.apply(&MatchAction::Undo).unwrap();
        assert_eq!(applied.view.state.score_b, 0);
    }
}
