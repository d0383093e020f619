//! Court position resolver: pure derivations from `MatchState` to what a
//! renderer needs: the live service box, who is serving, and where every
//! player stands.
//!
//! Layout units follow a 1340×610 court drawn with a 50-unit margin. Team A
//! owns the near (left) half, team B the far (right) half. The teams face
//! each other, so a right service court is the bottom quadrant for A and the
//! top quadrant for B.

use serde::{Deserialize, Serialize};

use crate::{GameType, MatchState, Team};

pub const PADDING: f64 = 50.0;
pub const COURT_X: f64 = PADDING;
pub const COURT_Y: f64 = PADDING;
pub const COURT_WIDTH: f64 = 1340.0;
pub const COURT_HEIGHT: f64 = 610.0;
/// Distance from the court origin to the net along x.
pub const NET_OFFSET: f64 = 670.0;
pub const NET_X: f64 = COURT_X + NET_OFFSET;
/// Distance from the court top to the centre line along y.
pub const HALF_HEIGHT: f64 = COURT_HEIGHT / 2.0;
/// Short service line, measured from the net.
pub const SHORT_SERVICE_OFFSET: f64 = 198.0;
/// Doubles long service line, measured from the back boundary.
pub const DOUBLES_LONG_SERVICE_OFFSET: f64 = 76.0;
/// Singles side line, measured from the outer side boundary.
pub const SINGLES_SIDE_OFFSET: f64 = 46.0;

/// Axis-aligned rectangle in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    fn from_bounds(x_start: f64, x_end: f64, y_start: f64, y_end: f64) -> Self {
        Self {
            x: x_start,
            y: y_start,
            w: x_end - x_start,
            h: y_end - y_start,
        }
    }
}

/// Half of the court along the length axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtSide {
    Near,
    Far,
}

impl CourtSide {
    pub fn of(team: Team) -> Self {
        match team {
            Team::A => CourtSide::Near,
            Team::B => CourtSide::Far,
        }
    }
}

/// Screen half along the width axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vertical {
    Top,
    Bottom,
}

/// Service court from the player's own point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCourt {
    Right,
    Left,
}

impl ServiceCourt {
    /// Even score serves from the right, odd from the left.
    pub fn for_score(score: u32) -> Self {
        if score % 2 == 0 {
            ServiceCourt::Right
        } else {
            ServiceCourt::Left
        }
    }

    /// Where this court lands on screen for `team`.
    pub fn vertical(self, team: Team) -> Vertical {
        match (team, self) {
            (Team::A, ServiceCourt::Right) | (Team::B, ServiceCourt::Left) => Vertical::Bottom,
            (Team::A, ServiceCourt::Left) | (Team::B, ServiceCourt::Right) => Vertical::Top,
        }
    }
}

/// Where a player stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAssignment {
    pub side: CourtSide,
    pub vertical: Vertical,
}

/// The serving team and the court its server stands in. `None` once the
/// match is decided.
pub fn service_court(state: &MatchState) -> Option<(Team, ServiceCourt)> {
    if state.is_terminal() {
        return None;
    }
    let team = state.current_server;
    Some((team, ServiceCourt::for_score(state.score(team))))
}

/// Highlighted box the live server serves from.
pub fn active_service_box(state: &MatchState) -> Option<Rect> {
    let (team, court) = service_court(state)?;
    let singles = state.game_type == GameType::Singles;

    let (x_start, x_end) = match team {
        Team::A => {
            let back = if singles {
                COURT_X
            } else {
                COURT_X + DOUBLES_LONG_SERVICE_OFFSET
            };
            (back, NET_X - SHORT_SERVICE_OFFSET)
        }
        Team::B => {
            let back = if singles {
                COURT_X + COURT_WIDTH
            } else {
                COURT_X + COURT_WIDTH - DOUBLES_LONG_SERVICE_OFFSET
            };
            (NET_X + SHORT_SERVICE_OFFSET, back)
        }
    };

    let (mut y_start, mut y_end) = match court.vertical(team) {
        Vertical::Top => (COURT_Y, COURT_Y + HALF_HEIGHT),
        Vertical::Bottom => (COURT_Y + HALF_HEIGHT, COURT_Y + COURT_HEIGHT),
    };
    if singles {
        match court.vertical(team) {
            Vertical::Top => y_start += SINGLES_SIDE_OFFSET,
            Vertical::Bottom => y_end -= SINGLES_SIDE_OFFSET,
        }
    }

    Some(Rect::from_bounds(x_start, x_end, y_start, y_end))
}

/// Index of the player due to serve for `team`, by score parity against the
/// stored right-court index. Doubles and serving team only.
pub fn server_index(state: &MatchState, team: Team) -> Option<u8> {
    if team != state.current_server || state.game_type == GameType::Singles {
        return None;
    }
    let in_right = state.player_in_right(team);
    Some(match ServiceCourt::for_score(state.score(team)) {
        ServiceCourt::Right => in_right,
        ServiceCourt::Left => 1 - in_right,
    })
}

/// Name of the player due to serve for `team`, looked up in `names`.
pub fn server_name<'a, S: AsRef<str>>(
    state: &MatchState,
    team: Team,
    names: &'a [S],
) -> Option<&'a str> {
    let index = server_index(state, team)?;
    names.get(index as usize).map(|name| name.as_ref())
}

/// Standing position of doubles player `index` of `team`, from the stored
/// right-court index. Independent of who is serving.
pub fn player_court_assignment(team: Team, index: u8, state: &MatchState) -> PlayerAssignment {
    let court = if index == state.player_in_right(team) {
        ServiceCourt::Right
    } else {
        ServiceCourt::Left
    };
    PlayerAssignment {
        side: CourtSide::of(team),
        vertical: court.vertical(team),
    }
}

/// Singles players stand by their own score parity.
pub fn singles_player_vertical(team: Team, state: &MatchState) -> Vertical {
    ServiceCourt::for_score(state.score(team)).vertical(team)
}

/// Marker centre for a player: a quarter of the court in from the back on
/// the team's half, a quarter of the height into the chosen half.
pub fn marker_anchor(assignment: PlayerAssignment) -> (f64, f64) {
    let x = match assignment.side {
        CourtSide::Near => COURT_X + COURT_WIDTH / 4.0,
        CourtSide::Far => COURT_X + COURT_WIDTH * 3.0 / 4.0,
    };
    let y = match assignment.vertical {
        Vertical::Top => PADDING + COURT_HEIGHT / 4.0,
        Vertical::Bottom => HALF_HEIGHT + PADDING + COURT_HEIGHT / 4.0,
    };
    (x, y)
}
