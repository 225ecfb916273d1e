//! Persistent workspace key-value storage
//!
//! The manager keeps two values here: the usage ledger and the selected
//! destination. Reads and writes are synchronous and infallible from the
//! caller's point of view. The file-backed store logs write failures instead
//! of returning them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use xcdest_core::prelude::*;

use crate::config::XCDEST_DIR;

const STATE_FILENAME: &str = "state.json";
const STATE_TEMP_FILENAME: &str = ".state.json.tmp";
const STATE_LOCK_FILENAME: &str = ".state.json.lock";

/// Workspace-scoped key-value storage
pub trait WorkspaceState: Send + Sync + fmt::Debug {
    /// Stored value for `key`, if any
    fn get(&self, key: &str) -> Option<Value>;

    /// Replace the value for `key`; `None` removes it
    fn set(&self, key: &str, value: Option<Value>);

    /// Read-modify-write of `key` as one step
    ///
    /// `f` gets the current value and returns the replacement (`None`
    /// removes the key). No other `set` or `update` on the same store runs
    /// in between. `f` may be called again if the first write fails, so it
    /// should not have side effects beyond its return value.
    fn update(&self, key: &str, f: &mut dyn FnMut(Option<Value>) -> Option<Value>);
}

/// Typed access on top of [`WorkspaceState`]
pub trait WorkspaceStateExt {
    /// Deserialize the value stored under `key`
    ///
    /// A value of the wrong shape is logged and treated as absent.
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

    /// Serialize and store `value` under `key`; `None` removes it
    fn set_typed<T: Serialize>(&self, key: &str, value: Option<&T>);
}

impl<W: WorkspaceState + ?Sized> WorkspaceStateExt for W {
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!("Ignoring malformed workspace state '{}': {}", key, e);
                None
            }
        }
    }

    fn set_typed<T: Serialize>(&self, key: &str, value: Option<&T>) {
        let value = match value.map(serde_json::to_value).transpose() {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize workspace state '{}': {}", key, e);
                return;
            }
        };
        self.set(key, value);
    }
}

fn apply(values: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            values.insert(key.to_string(), value);
        }
        None => {
            values.remove(key);
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// In-Memory Storage
// ─────────────────────────────────────────────────────────────────

/// Storage that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryWorkspaceState {
    values: Mutex<Map<String, Value>>,
}

impl MemoryWorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkspaceState for MemoryWorkspaceState {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Option<Value>) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut values, key, value);
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(Option<Value>) -> Option<Value>) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let current = values.get(key).cloned();
        apply(&mut values, key, f(current));
    }
}

// ─────────────────────────────────────────────────────────────────
// File-Backed Storage
// ─────────────────────────────────────────────────────────────────

/// Storage persisted as a JSON object in `.xcdest/state.json`
///
/// Reads are served from a copy loaded on open. Every write takes an
/// exclusive lock on `.state.json.lock`, re-reads the file, changes only the
/// written key and swaps the file in place. Keys written by other processes
/// survive, and the local copy picks them up on the next write.
#[derive(Debug)]
pub struct FileWorkspaceState {
    dir: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileWorkspaceState {
    /// Open the state for the workspace rooted at `workspace_path`
    ///
    /// A missing file is an empty state. An unreadable or corrupt file is
    /// logged and also treated as empty.
    pub fn open(workspace_path: &Path) -> Self {
        let dir = workspace_path.join(XCDEST_DIR);
        let values = load_state_file(&dir.join(STATE_FILENAME));
        Self {
            dir,
            values: Mutex::new(values),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILENAME)
    }

    /// Apply `f` to `key` in the on-disk state and return the new contents
    fn update_on_disk(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<Value>) -> Option<Value>,
    ) -> Result<Map<String, Value>> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::config(format!("Failed to create {}: {}", XCDEST_DIR, e)))?;

        let lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(STATE_LOCK_FILENAME))?;

        // Blocks if another process is writing; released on drop
        lock_file.lock_exclusive()?;

        let mut latest = load_state_file(&self.path());
        let current = latest.get(key).cloned();
        apply(&mut latest, key, f(current));

        let content = serde_json::to_string_pretty(&latest)?;
        let temp_path = self.dir.join(STATE_TEMP_FILENAME);
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, self.path())?;

        trace!("Persisted workspace state to {:?}", self.path());
        Ok(latest)
    }
}

impl WorkspaceState for FileWorkspaceState {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Option<Value>) {
        self.update(key, &mut |_| value.clone());
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(Option<Value>) -> Option<Value>) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);

        match self.update_on_disk(key, f) {
            Ok(latest) => *values = latest,
            Err(e) => {
                warn!("Failed to save workspace state to {:?}: {}", self.path(), e);
                let current = values.get(key).cloned();
                apply(&mut values, key, f(current));
            }
        }
    }
}

fn load_state_file(path: &Path) -> Map<String, Value> {
    if !path.exists() {
        debug!("No workspace state at {:?}, starting empty", path);
        return Map::new();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(values) => {
                debug!("Loaded workspace state from {:?}", path);
                values
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Map::new()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Map::new()
        }
    }
}
