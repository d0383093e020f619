//! Rally-point rules: best of three sets to 21, two-point margin, capped at 30.

use crate::state::SetScore;
use crate::{GameType, MatchState, Team};

/// Points needed to take a set (subject to the margin rule).
pub const POINTS_TO_WIN: u32 = 21;
/// Minimum lead required at or above `POINTS_TO_WIN`.
pub const WIN_MARGIN: u32 = 2;
/// First to this score takes the set regardless of margin.
pub const POINT_CAP: u32 = 30;
/// Sets needed to take the match.
pub const SETS_TO_WIN: u32 = 2;

/// What a single rally did to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RallyOutcome {
    /// Match already decided; nothing changed.
    Ignored,
    /// Point scored inside the current set. `sideout` is true when serve
    /// passed to the receiving team.
    Point { sideout: bool },
    /// Set decided, match continues.
    SetWon { winner: Team, set: SetScore },
    /// Set decided and with it the match.
    MatchWon { winner: Team, set: SetScore },
}

/// The team that has taken the set at this score, if any.
pub fn set_winner(score_a: u32, score_b: u32) -> Option<Team> {
    let leader = if score_a > score_b { Team::A } else { Team::B };
    if (score_a >= POINTS_TO_WIN || score_b >= POINTS_TO_WIN)
        && score_a.abs_diff(score_b) >= WIN_MARGIN
    {
        Some(leader)
    } else if score_a == POINT_CAP {
        Some(Team::A)
    } else if score_b == POINT_CAP {
        Some(Team::B)
    } else {
        None
    }
}

/// Apply one rally won by `winner` to `state`, returning the replacement
/// state. Terminal states come back unchanged.
pub fn apply_rally(state: &MatchState, winner: Team) -> (MatchState, RallyOutcome) {
    if state.is_terminal() {
        return (*state, RallyOutcome::Ignored);
    }

    let mut next = *state;
    let serving = state.current_server;
    let server_won = winner == serving;

    *next.score_mut(winner) += 1;

    match state.game_type {
        GameType::Singles => {
            if !server_won {
                next.current_server = winner;
            }
        }
        GameType::Doubles => {
            if server_won {
                // Same server again, from the other court.
                let right = next.player_in_right_mut(serving);
                *right = 1 - *right;
            } else {
                // Sideout: nobody moves.
                next.current_server = winner;
            }
        }
    }

    let Some(set_team) = set_winner(next.score_a, next.score_b) else {
        return (next, RallyOutcome::Point { sideout: !server_won });
    };

    let set = SetScore {
        points_a: next.score_a,
        points_b: next.score_b,
        winner: set_team,
    };
    *next.sets_won_mut(set_team) += 1;
    next.score_a = 0;
    next.score_b = 0;
    next.current_server = set_team;
    next.team_a_player_in_right = 0;
    next.team_b_player_in_right = 0;

    if next.sets_won(set_team) >= SETS_TO_WIN {
        next.match_winner = Some(set_team);
        (
            next,
            RallyOutcome::MatchWon {
                winner: set_team,
                set,
            },
        )
    } else {
        next.current_set += 1;
        (
            next,
            RallyOutcome::SetWon {
                winner: set_team,
                set,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(score_a: u32, score_b: u32, server: Team, game_type: GameType) -> MatchState {
        let mut s = MatchState::new(server, game_type, 0);
        s.score_a = score_a;
        s.score_b = score_b;
        s
    }

    #[test]
    fn set_winner_requires_margin_below_cap() {
        assert_eq!(set_winner(21, 19), Some(Team::A));
        assert_eq!(set_winner(21, 20), None);
        assert_eq!(set_winner(22, 20), Some(Team::A));
        assert_eq!(set_winner(20, 22), Some(Team::B));
        assert_eq!(set_winner(20, 20), None);
        assert_eq!(set_winner(0, 0), None);
    }

    #[test]
    fn cap_overrides_margin() {
        assert_eq!(set_winner(30, 29), Some(Team::A));
        assert_eq!(set_winner(29, 30), Some(Team::B));
        assert_eq!(set_winner(29, 29), None);
    }

    #[test]
    fn singles_sideout_moves_serve_only() {
        let s = at(3, 4, Team::A, GameType::Singles);
        let (next, outcome) = apply_rally(&s, Team::B);
        assert_eq!(outcome, RallyOutcome::Point { sideout: true });
        assert_eq!(next.current_server, Team::B);
        assert_eq!(next.score_b, 5);
        assert_eq!(next.team_a_player_in_right, 0);
        assert_eq!(next.team_b_player_in_right, 0);
    }

    #[test]
    fn doubles_server_win_toggles_serving_side() {
        let mut s = at(0, 0, Team::B, GameType::Doubles);
        s.team_a_player_in_right = 1;
        let (next, outcome) = apply_rally(&s, Team::B);
        assert_eq!(outcome, RallyOutcome::Point { sideout: false });
        assert_eq!(next.team_b_player_in_right, 1);
        assert_eq!(next.team_a_player_in_right, 1);
        assert_eq!(next.current_server, Team::B);
    }

    #[test]
    fn set_win_resets_points_and_positions() {
        let mut s = at(20, 5, Team::B, GameType::Doubles);
        s.team_a_player_in_right = 1;
        s.team_b_player_in_right = 1;
        let (next, outcome) = apply_rally(&s, Team::A);
        assert_eq!(
            outcome,
            RallyOutcome::SetWon {
                winner: Team::A,
                set: SetScore {
                    points_a: 21,
                    points_b: 5,
                    winner: Team::A
                }
            }
        );
        assert_eq!((next.score_a, next.score_b), (0, 0));
        assert_eq!(next.sets_won_a, 1);
        assert_eq!(next.current_set, 2);
        assert_eq!(next.current_server, Team::A);
        assert_eq!(next.team_a_player_in_right, 0);
        assert_eq!(next.team_b_player_in_right, 0);
    }

    #[test]
    fn second_set_ends_match_without_advancing_set_counter() {
        let mut s = at(20, 0, Team::A, GameType::Singles);
        s.sets_won_a = 1;
        s.current_set = 2;
        let (next, outcome) = apply_rally(&s, Team::A);
        assert!(matches!(
            outcome,
            RallyOutcome::MatchWon {
                winner: Team::A,
                ..
            }
        ));
        assert_eq!(next.match_winner, Some(Team::A));
        assert_eq!(next.current_set, 2);
        assert_eq!(next.sets_won_a, 2);
    }

    #[test]
    fn terminal_state_is_absorbing() {
        let mut s = at(0, 0, Team::B, GameType::Singles);
        s.sets_won_b = 2;
        s.match_winner = Some(Team::B);
        let (next, outcome) = apply_rally(&s, Team::A);
        assert_eq!(outcome, RallyOutcome::Ignored);
        assert_eq!(next, s);
    }
}
