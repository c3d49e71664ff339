//! The lesson catalog: one `LessonRecord` per slot, loaded once at startup.
//!
//! Expected schema (JSON):
//! ```text
//! { "1": { "title": "...", "pattern": "...", "description": "...",
//!          "examples": { "javascript": "...", "python": "..." } },
//!   ...
//!   "24": { ... } }
//! ```
//! Every slot 1..=24 must be present. Example keys outside the recognized
//! language set are dropped with a warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::{is_valid_slot, Language, LessonRecord, SLOT_COUNT};

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("failed to read catalog {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("catalog is not valid JSON: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("catalog key {0:?} is not a slot number")]
  InvalidKey(String),

  #[error("catalog slot {0} is outside 1..=24")]
  SlotOutOfRange(u32),

  #[error("catalog has no lesson for slot {0}")]
  MissingSlot(u32),
}

#[derive(Deserialize)]
struct RawLesson {
  title: String,
  pattern: String,
  #[serde(default)]
  description: String,
  #[serde(default)]
  examples: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct ContentCatalog {
  lessons: BTreeMap<u32, LessonRecord>,
}

impl ContentCatalog {
  /// Read and validate the catalog file. Any failure here is fatal for startup.
  #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
  pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
      .await
      .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
    let catalog = Self::from_json_str(&text)?;
    info!(target: "regex_advent", path = %path.display(), lessons = catalog.len(), "Loaded lesson catalog");
    Ok(catalog)
  }

  pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
    let raw: BTreeMap<String, RawLesson> = serde_json::from_str(text)?;

    let mut lessons = BTreeMap::new();
    for (key, lesson) in raw {
      let id: u32 = key
        .trim()
        .parse()
        .map_err(|_| CatalogError::InvalidKey(key.clone()))?;
      if !is_valid_slot(id) {
        return Err(CatalogError::SlotOutOfRange(id));
      }

      let mut examples = BTreeMap::new();
      for (tag, text) in lesson.examples {
        match tag.parse::<Language>() {
          Ok(lang) => {
            examples.insert(lang, text);
          }
          Err(_) => {
            warn!(target: "regex_advent", slot = id, %tag, "Dropping example for unrecognized language");
          }
        }
      }

      lessons.insert(
        id,
        LessonRecord {
          id,
          title: lesson.title,
          pattern: lesson.pattern,
          description: lesson.description,
          examples,
        },
      );
    }

    if let Some(missing) = (1..=SLOT_COUNT).find(|slot| !lessons.contains_key(slot)) {
      return Err(CatalogError::MissingSlot(missing));
    }

    Ok(Self { lessons })
  }

  pub fn get(&self, slot: u32) -> Option<&LessonRecord> {
    self.lessons.get(&slot)
  }

  pub fn len(&self) -> usize {
    self.lessons.len()
  }

  #[cfg(test)]
  pub fn lessons(&self) -> impl Iterator<Item = &LessonRecord> {
    self.lessons.values()
  }
}
