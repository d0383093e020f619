//! Match setup: the names, mode, and first server collected before a match
//! starts. Names live here, never in `MatchState`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GameType, MatchEngine, Team};

/// Everything needed to construct a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    #[serde(default)]
    pub game_type: GameType,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub initial_server: Team,
    /// Which player of the serving team starts in the right court. Doubles only.
    #[serde(default)]
    pub initial_server_index: u8,
}

/// Why a setup was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    EmptyName {
        team: Team,
        index: usize,
    },
    WrongPlayerCount {
        team: Team,
        expected: usize,
        found: usize,
    },
    InvalidServerIndex(u8),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName { team, index } => {
                write!(f, "team {team}: player {} has an empty name", index + 1)
            }
            Self::WrongPlayerCount {
                team,
                expected,
                found,
            } => write!(
                f,
                "team {team}: expected {expected} player name(s), found {found}"
            ),
            Self::InvalidServerIndex(index) => {
                write!(f, "initial server index must be 0 or 1, got {index}")
            }
        }
    }
}

impl std::error::Error for SetupError {}

impl MatchSetup {
    pub fn singles(team_a: &str, team_b: &str, initial_server: Team) -> Self {
        Self {
            game_type: GameType::Singles,
            team_a: vec![team_a.to_string()],
            team_b: vec![team_b.to_string()],
            initial_server,
            initial_server_index: 0,
        }
    }

    pub fn doubles(
        team_a: [&str; 2],
        team_b: [&str; 2],
        initial_server: Team,
        initial_server_index: u8,
    ) -> Self {
        Self {
            game_type: GameType::Doubles,
            team_a: team_a.iter().map(|s| s.to_string()).collect(),
            team_b: team_b.iter().map(|s| s.to_string()).collect(),
            initial_server,
            initial_server_index,
        }
    }

    /// Check names and counts against the game type. Returns a copy with
    /// names trimmed.
    pub fn validate(&self) -> Result<MatchSetup, SetupError> {
        if self.initial_server_index > 1 {
            return Err(SetupError::InvalidServerIndex(self.initial_server_index));
        }
        let expected = self.game_type.players_per_team();
        let mut trimmed = self.clone();
        for team in Team::ALL {
            let names = match team {
                Team::A => &mut trimmed.team_a,
                Team::B => &mut trimmed.team_b,
            };
            if names.len() != expected {
                return Err(SetupError::WrongPlayerCount {
                    team,
                    expected,
                    found: names.len(),
                });
            }
            for (index, name) in names.iter_mut().enumerate() {
                let clean = name.trim();
                if clean.is_empty() {
                    return Err(SetupError::EmptyName { team, index });
                }
                *name = clean.to_string();
            }
        }
        if self.game_type == GameType::Singles {
            trimmed.initial_server_index = 0;
        }
        Ok(trimmed)
    }

    pub fn names(&self, team: Team) -> &[String] {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    /// Team label for scoreboards and history: names joined with `" & "`.
    pub fn display_name(&self, team: Team) -> String {
        self.names(team).join(" & ")
    }

    /// Build an engine for this setup.
    pub fn engine(&self) -> MatchEngine {
        MatchEngine::new(
            self.initial_server,
            self.game_type,
            self.initial_server_index,
        )
    }
}
