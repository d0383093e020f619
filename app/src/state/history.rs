//! Match history persistence.
//!
//! Finished matches are kept most-recent-first. `load` never fails: a missing
//! or unreadable file is an empty history. `append` never writes over a file
//! it could not read.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::Context;

use rallypoint::MatchRecord;

/// Storage for finished matches.
pub trait HistoryStore: Send + Sync {
    /// All records, most recent first.
    fn load(&self) -> Vec<MatchRecord>;

    /// Insert `record` at the front.
    fn append(&self, record: MatchRecord) -> anyhow::Result<()>;
}

/// Returns `<data_dir>/rallypoint/history.json`.
pub fn default_history_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rallypoint")
        .join("history.json")
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Pretty-printed JSON array on disk.
pub struct JsonHistoryFile {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: RwLock<()>,
}

impl JsonHistoryFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current records. A missing file is empty; anything unreadable is an
    /// error so callers never write over it.
    fn read(&self) -> anyhow::Result<Vec<MatchRecord>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", self.path.display()))
    }
}

impl HistoryStore for JsonHistoryFile {
    fn load(&self) -> Vec<MatchRecord> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        self.read().unwrap_or_else(|e| {
            tracing::warn!("{e:#}");
            Vec::new()
        })
    }

    fn append(&self, record: MatchRecord) -> anyhow::Result<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        let mut records = self.read()?;
        records.insert(0, record);

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let contents = serde_json::to_string_pretty(&records)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Volatile history (`--no-history`).
#[derive(Default)]
pub struct MemoryHistory {
    records: RwLock<Vec<MatchRecord>>,
}

impl HistoryStore for MemoryHistory {
    fn load(&self) -> Vec<MatchRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn append(&self, record: MatchRecord) -> anyhow::Result<()> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(0, record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rallypoint::{MatchSetup, Team};

    fn finished(team_a: &str, team_b: &str) -> MatchRecord {
        let setup = MatchSetup::singles(team_a, team_b, Team::A);
        let mut engine = setup.engine();
        for _ in 0..42 {
            engine.score(Team::A);
        }
        MatchRecord::from_final(&setup, engine.state(), engine.completed_sets(), Utc::now())
            .unwrap()
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryFile::new(dir.path().join("history.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn append_creates_dirs_and_keeps_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let store = JsonHistoryFile::new(path.clone());
        store.append(finished("Lee", "Tan")).unwrap();
        store.append(finished("Axelsen", "Momota")).unwrap();

        let reopened = JsonHistoryFile::new(path);
        let records = reopened.load();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].team_a, "Axelsen");
        assert_eq!(records[1].team_a, "Lee");
    }

    #[test]
    fn unparsable_file_reads_empty_and_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonHistoryFile::new(path.clone());
        store.append(finished("Lee", "Tan")).unwrap();
        store.append(finished("Chen", "Lin")).unwrap();

        // A stray trailing byte makes the whole array unparsable.
        let mut damaged = std::fs::read_to_string(&path).unwrap();
        damaged.push('x');
        std::fs::write(&path, &damaged).unwrap();

        assert!(store.load().is_empty());
        let err = store.append(finished("Axelsen", "Momota")).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), damaged);
    }

    #[test]
    fn memory_history_prepends() {
        let store = MemoryHistory::default();
        store.append(finished("Lee", "Tan")).unwrap();
        store.append(finished("Chen", "Lin")).unwrap();
        let records = store.load();
        assert_eq!(records[0].team_a, "Chen");
    }
}
