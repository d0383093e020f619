//! Configuration loading, resolution, and persistence.
//!
//! Handles the TOML config file (~/.config/rallypoint/config.toml) with
//! indexed web server sections: `[webserver.<id>]`.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub use rallypoint::{RallypointConfig, WebserverSection};

/// Build a global ID from a type prefix and index: `"webserver.0"`.
pub fn global_id(prefix: &str, index: &str) -> String {
    format!("{prefix}.{index}")
}

// ---------------------------------------------------------------------------
// Persistence I/O
// ---------------------------------------------------------------------------

/// Returns `~/.config/rallypoint/config.toml`.
pub fn default_config_path() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rallypoint");
    dir.join("config.toml")
}

/// Load persisted config from disk. If the file does not exist, creates it
/// with all-defaults and returns that.
pub fn load(path: &Path) -> RallypointConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<RallypointConfig>(&contents) {
            Ok(config) => {
                tracing::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                RallypointConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let defaults = RallypointConfig::default();
            tracing::info!("no config file found, creating {}", path.display());
            save_to(path, &defaults);
            defaults
        }
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            RallypointConfig::default()
        }
    }
}

/// Write config to a specific path. Creates parent dirs if needed. Never panics.
pub fn save_to(path: &Path, config: &RallypointConfig) {
    if let Some(dir) = path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        tracing::warn!("failed to create config dir {}: {e}", dir.display());
        return;
    }
    match toml::to_string_pretty(config) {
        Ok(contents) => {
            if let Err(e) = std::fs::write(path, contents) {
                tracing::warn!("failed to write {}: {e}", path.display());
            }
        }
        Err(e) => {
            tracing::warn!("failed to serialize config: {e}");
        }
    }
}

/// Sort key for section indices: numeric first, then by name.
fn index_order(index: &str) -> (u64, &str) {
    (index.parse().unwrap_or(u64::MAX), index)
}

// ---------------------------------------------------------------------------
// Cached config
// ---------------------------------------------------------------------------

/// Cached configuration backed by a TOML file.
///
/// Reads are cheap (RwLock read guard + clone). Run-only overrides go through
/// `override_bind` and are never written back.
pub struct SystemConfig {
    path: PathBuf,
    inner: RwLock<RallypointConfig>,
}

impl SystemConfig {
    /// Load config from disk (or create defaults) and cache it.
    pub fn new(path: PathBuf) -> Self {
        let config = load(&path);
        Self {
            path,
            inner: RwLock::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone the current cached config.
    pub fn snapshot(&self) -> RallypointConfig {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Point the lowest-indexed web server at `bind` for this run only.
    /// Indices compare numerically; non-numeric ones sort after them.
    /// Adds `webserver.0` when the file has none.
    pub fn override_bind(&self, bind: &str) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let first = guard
            .webserver
            .keys()
            .min_by(|a, b| index_order(a).cmp(&index_order(b)))
            .cloned()
            .unwrap_or_else(|| "0".into());
        guard
            .webserver
            .entry(first)
            .or_insert_with(|| WebserverSection {
                name: "Web Server".into(),
                bind: String::new(),
            })
            .bind = bind.to_string();
    }
}
