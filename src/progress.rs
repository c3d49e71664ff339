//! Persistence of revealed slots.
//!
//! The revealed set is stored under a single key (`openedDoors`) as a
//! JSON-encoded array of integers. On disk this lives inside a small JSON
//! key/value document so other keys written by someone else survive our saves:
//!
//! ```text
//! { "openedDoors": "[1,5,12]" }
//! ```
//!
//! Both operations are best-effort. `load` falls back to an empty set and
//! `save` only logs a warning when the storage is unavailable or corrupt.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::is_valid_slot;

/// Key under which the revealed set is stored.
pub const PROGRESS_KEY: &str = "openedDoors";

pub type RevealedSet = BTreeSet<u32>;

#[derive(Debug, Error)]
enum ProgressError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub trait ProgressStore: Send + Sync {
  /// Never fails; absent or unreadable state is an empty set.
  fn load(&self) -> RevealedSet;
  /// Best-effort; failures are logged and swallowed.
  fn save(&self, revealed: &RevealedSet);
}

/// Encode the set the way it is persisted under `PROGRESS_KEY`.
pub fn encode(revealed: &RevealedSet) -> String {
  let ids: Vec<u32> = revealed.iter().copied().collect();
  serde_json::to_string(&ids).unwrap_or_else(|_| "[]".into())
}

/// Decode a persisted value. Malformed input yields `None`; ids outside the
/// calendar are discarded.
pub fn decode(value: &str) -> Option<RevealedSet> {
  let ids: Vec<i64> = serde_json::from_str(value).ok()?;
  Some(
    ids
      .into_iter()
      .filter_map(|id| u32::try_from(id).ok())
      .filter(|id| is_valid_slot(*id))
      .collect(),
  )
}

/// File-backed store. The document is rewritten via a temp file + rename.
///
/// I/O is synchronous `std::fs` and runs inline on the caller's thread, under
/// the calendar write lock. The document is a few bytes and is written at most
/// once per newly revealed slot.
#[derive(Debug)]
pub struct FileProgressStore {
  path: PathBuf,
}

impl FileProgressStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn read_document(&self) -> Result<BTreeMap<String, serde_json::Value>, ProgressError> {
    let text = std::fs::read_to_string(&self.path)?;
    Ok(serde_json::from_str(&text)?)
  }

  fn write_document(&self, revealed: &RevealedSet) -> Result<(), ProgressError> {
    // Keep unrelated keys; a corrupt or missing document starts fresh.
    let mut doc = self.read_document().unwrap_or_default();
    doc.insert(PROGRESS_KEY.to_string(), serde_json::Value::String(encode(revealed)));

    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(&doc)?)?;
    std::fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

impl ProgressStore for FileProgressStore {
  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  fn load(&self) -> RevealedSet {
    let doc = match self.read_document() {
      Ok(doc) => doc,
      Err(ProgressError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(target: "progress", "No progress file yet; starting empty");
        return RevealedSet::new();
      }
      Err(e) => {
        warn!(target: "progress", error = %e, "Unreadable progress file; starting empty");
        return RevealedSet::new();
      }
    };

    match doc.get(PROGRESS_KEY) {
      Some(serde_json::Value::String(value)) => decode(value).unwrap_or_else(|| {
        warn!(target: "progress", key = PROGRESS_KEY, "Malformed progress value; starting empty");
        RevealedSet::new()
      }),
      Some(_) => {
        warn!(target: "progress", key = PROGRESS_KEY, "Progress value is not a string; starting empty");
        RevealedSet::new()
      }
      None => RevealedSet::new(),
    }
  }

  #[instrument(level = "debug", skip(self, revealed), fields(path = %self.path.display(), count = revealed.len()))]
  fn save(&self, revealed: &RevealedSet) {
    match self.write_document(revealed) {
      Ok(()) => debug!(target: "progress", count = revealed.len(), "Saved progress"),
      Err(e) => warn!(target: "progress", error = %e, "Failed to save progress; continuing without persistence"),
    }
  }
}

/// Process-local store, for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
  value: Mutex<Option<String>>,
}

impl MemoryProgressStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Raw persisted value, as it would appear under `PROGRESS_KEY`.
  pub fn raw(&self) -> Option<String> {
    self.value.lock().ok().and_then(|v| v.clone())
  }

  #[cfg(test)]
  pub fn with_raw(value: impl Into<String>) -> Self {
    Self { value: Mutex::new(Some(value.into())) }
  }
}

impl ProgressStore for MemoryProgressStore {
  fn load(&self) -> RevealedSet {
    self.raw().and_then(|v| decode(&v)).unwrap_or_default()
  }

  fn save(&self, revealed: &RevealedSet) {
    match self.value.lock() {
      Ok(mut slot) => *slot = Some(encode(revealed)),
      Err(_) => warn!(target: "progress", "In-memory progress store poisoned; dropping save"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(ids: &[u32]) -> RevealedSet {
    ids.iter().copied().collect()
  }

  #[test]
  fn file_store_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileProgressStore::new(dir.path().join("nested").join("progress.json"));

    for s in [set(&[]), set(&[5]), set(&[1, 2, 3, 24]), (1..=24).collect()] {
      store.save(&s);
      assert_eq!(store.load(), s);
    }
  }

  #[test]
  fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileProgressStore::new(dir.path().join("progress.json"));
    assert!(store.load().is_empty());
  }

  #[test]
  fn corrupt_file_loads_empty_and_save_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, "{{{ definitely not json").unwrap();
    let store = FileProgressStore::new(&path);
    assert!(store.load().is_empty());

    store.save(&set(&[7]));
    assert_eq!(store.load(), set(&[7]));
  }

  #[test]
  fn malformed_value_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, r#"{"openedDoors": "[1, \"two\"]"}"#).unwrap();
    assert!(FileProgressStore::new(&path).load().is_empty());

    std::fs::write(&path, r#"{"openedDoors": [1, 2]}"#).unwrap();
    assert!(FileProgressStore::new(&path).load().is_empty());
  }

  #[test]
  fn other_keys_survive_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();
    let store = FileProgressStore::new(&path);
    store.save(&set(&[3]));

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["theme"], "dark");
    assert_eq!(doc[PROGRESS_KEY], "[3]");
  }

  #[test]
  fn unwritable_location_does_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be makes the rename fail.
    let path = dir.path().join("progress.json");
    std::fs::create_dir_all(&path).unwrap();
    let store = FileProgressStore::new(&path);
    store.save(&set(&[1]));
    assert!(store.load().is_empty());
  }

  #[test]
  fn decode_discards_out_of_range_ids() {
    assert_eq!(decode("[0, 1, 24, 25, -3]"), Some(set(&[1, 24])));
    assert_eq!(decode("nope"), None);
    assert_eq!(decode("[]"), Some(set(&[])));
  }

  #[test]
  fn memory_store_round_trips() {
    let store = MemoryProgressStore::new();
    assert!(store.load().is_empty());
    store.save(&set(&[2, 9]));
    assert_eq!(store.raw().as_deref(), Some("[2,9]"));
    assert_eq!(store.load(), set(&[2, 9]));
    assert!(MemoryProgressStore::with_raw("garbage").load().is_empty());
  }
}
