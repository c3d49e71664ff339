//! Domain models: slots, example languages, lesson records and match outcomes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of calendar slots. Slot ids run from 1 to `SLOT_COUNT` inclusive.
pub const SLOT_COUNT: u32 = 24;

/// True if `slot` names one of the calendar's slots.
pub fn is_valid_slot(slot: u32) -> bool {
  (1..=SLOT_COUNT).contains(&slot)
}

/// Languages we know how to show example snippets for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  JavaScript,
  Python,
  Rust,
  Java,
  Go,
}

impl Language {
  pub const ALL: [Language; 5] = [
    Language::JavaScript,
    Language::Python,
    Language::Rust,
    Language::Java,
    Language::Go,
  ];

  pub fn tag(self) -> &'static str {
    match self {
      Language::JavaScript => "javascript",
      Language::Python => "python",
      Language::Rust => "rust",
      Language::Java => "java",
      Language::Go => "go",
    }
  }
}

impl Default for Language {
  fn default() -> Self { Language::JavaScript }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.tag())
  }
}

impl FromStr for Language {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Language::ALL
      .iter()
      .copied()
      .find(|l| l.tag() == s)
      .ok_or_else(|| s.to_string())
  }
}

/// One day's lesson. Immutable once the catalog is loaded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LessonRecord {
  pub id: u32,
  pub title: String,
  pub pattern: String,
  pub description: String,
  pub examples: BTreeMap<Language, String>,
}

impl LessonRecord {
  pub fn example(&self, language: Language) -> Option<&str> {
    self.examples.get(&language).map(String::as_str)
  }

  pub fn languages(&self) -> Vec<Language> {
    self.examples.keys().copied().collect()
  }
}

/// Result of testing a pattern against a subject string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
  NoInput,
  Matched {
    #[serde(rename = "fullMatch")]
    full_match: String,
    /// One entry per capture group; `None` when the group did not participate.
    groups: Vec<Option<String>>,
  },
  NotMatched,
  PatternError { message: String },
}
