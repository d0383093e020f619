//! Persisted config types (shared between the app and any client that edits
//! settings).

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_UNDO_DEPTH;

/// Top-level persisted config. Hand-editable TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallypointConfig {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub webserver: HashMap<String, WebserverSection>,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub scoring: ScoringSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebserverSection {
    #[serde(default)]
    pub name: String,
    pub bind: String,
}

/// Where finished matches are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySection {
    /// Override for the history file. None = platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSection {
    /// Rallies that can be undone.
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
}

fn default_undo_depth() -> usize {
    DEFAULT_UNDO_DEPTH
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

impl Default for RallypointConfig {
    /// A single local web server.
    fn default() -> Self {
        let mut webserver = HashMap::new();
        webserver.insert(
            "0".into(),
            WebserverSection {
                name: "Web Server".into(),
                bind: "127.0.0.1:3030".into(),
            },
        );
        Self {
            webserver,
            history: HistorySection::default(),
            scoring: ScoringSection::default(),
        }
    }
}
