//! Calendar session state: which slot is open, which example language is shown,
//! and which slots have been revealed so far.
//!
//! This module owns:
//!   - the unlock policy (date-gated or always open), chosen at construction
//!   - the revealed set, seeded from a `ProgressStore` and only ever grown
//!   - the active lesson/language selection
//!
//! All mutation goes through one `CalendarState` per session.

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::catalog::ContentCatalog;
use crate::domain::{is_valid_slot, Language, LessonRecord, MatchOutcome, SLOT_COUNT};
use crate::progress::{ProgressStore, RevealedSet};
use crate::tester;
use crate::util::{month_name, ordinal};

/// When slots become accessible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum UnlockPolicy {
  /// Every slot is open (previews, testing).
  AlwaysOpen,
  /// Slot N opens on day N of `month`; nothing is open outside that month.
  DateGated { month: u32 },
}

impl UnlockPolicy {
  pub fn is_open(self, slot: u32, today: NaiveDate) -> bool {
    if !is_valid_slot(slot) {
      return false;
    }
    match self {
      UnlockPolicy::AlwaysOpen => true,
      UnlockPolicy::DateGated { month } => today.month() == month && slot <= today.day(),
    }
  }

  /// Human-readable unlock condition for a locked slot.
  pub fn unlock_hint(self, slot: u32) -> String {
    match self {
      UnlockPolicy::AlwaysOpen => "It should already be open.".into(),
      UnlockPolicy::DateGated { month } => {
        format!("Come back on {} {}.", month_name(month), ordinal(slot))
      }
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
  #[error("There is no door {0}; the calendar has doors 1 to 24.")]
  OutOfRange(u32),

  #[error("This door is locked! {hint}")]
  Locked { slot: u32, hint: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
  #[error(transparent)]
  Access(#[from] AccessError),

  #[error("unknown or unavailable example language: {0}")]
  InvalidLanguage(String),

  #[error("no lesson is open; select a door first")]
  NoActiveLesson,
}

/// Per-slot view used to render the calendar grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
  pub id: u32,
  pub accessible: bool,
  pub revealed: bool,
}

pub struct CalendarState {
  catalog: Arc<ContentCatalog>,
  store: Box<dyn ProgressStore>,
  policy: UnlockPolicy,
  selected_slot: Option<u32>,
  selected_language: Language,
  revealed: RevealedSet,
}

/// Local calendar date, the clock the unlock policy runs on.
pub fn today() -> NaiveDate {
  Local::now().date_naive()
}

impl CalendarState {
  /// Build a session, seeding the revealed set from `store`.
  #[instrument(level = "info", skip_all, fields(?policy))]
  pub fn new(catalog: Arc<ContentCatalog>, store: Box<dyn ProgressStore>, policy: UnlockPolicy) -> Self {
    let revealed = store.load();
    info!(target: "calendar", revealed = revealed.len(), ?policy, "Calendar session started");
    Self {
      catalog,
      store,
      policy,
      selected_slot: None,
      selected_language: Language::default(),
      revealed,
    }
  }

  pub fn policy(&self) -> UnlockPolicy {
    self.policy
  }

  pub fn selected_slot(&self) -> Option<u32> {
    self.selected_slot
  }

  pub fn selected_language(&self) -> Language {
    self.selected_language
  }

  #[cfg(test)]
  pub fn revealed(&self) -> &RevealedSet {
    &self.revealed
  }

  /// Whether `slot` can be opened right now.
  pub fn is_accessible(&self, slot: u32) -> bool {
    self.is_accessible_on(slot, today())
  }

  pub fn is_accessible_on(&self, slot: u32, today: NaiveDate) -> bool {
    self.policy.is_open(slot, today)
  }

  pub fn is_revealed(&self, slot: u32) -> bool {
    self.revealed.contains(&slot)
  }

  pub fn select(&mut self, slot: u32) -> Result<LessonRecord, AccessError> {
    self.select_on(slot, today())
  }

  /// Open `slot` as of `today`: mark it revealed (persisting only when new)
  /// and make it the active lesson.
  #[instrument(level = "info", skip(self))]
  pub fn select_on(&mut self, slot: u32, today: NaiveDate) -> Result<LessonRecord, AccessError> {
    if !is_valid_slot(slot) {
      return Err(AccessError::OutOfRange(slot));
    }
    if !self.is_accessible_on(slot, today) {
      debug!(target: "calendar", %slot, "Locked slot requested");
      return Err(AccessError::Locked { slot, hint: self.policy.unlock_hint(slot) });
    }
    // Catalog completeness is checked at load time.
    let lesson = self.catalog.get(slot).cloned().ok_or(AccessError::OutOfRange(slot))?;

    if self.revealed.insert(slot) {
      self.store.save(&self.revealed);
      info!(target: "calendar", %slot, revealed = self.revealed.len(), "Slot revealed");
    }
    self.selected_slot = Some(slot);
    Ok(lesson)
  }

  /// Switch the example language. The tag must be recognized and, when a
  /// lesson is open, that lesson must carry an example for it.
  #[instrument(level = "debug", skip(self))]
  pub fn set_language(&mut self, tag: &str) -> Result<Language, CalendarError> {
    let lang: Language = tag
      .parse()
      .map_err(|_| CalendarError::InvalidLanguage(tag.to_string()))?;
    if let Some(lesson) = self.active_lesson() {
      if lesson.example(lang).is_none() {
        return Err(CalendarError::InvalidLanguage(tag.to_string()));
      }
    }
    self.selected_language = lang;
    Ok(lang)
  }

  pub fn active_lesson(&self) -> Option<&LessonRecord> {
    self.selected_slot.and_then(|s| self.catalog.get(s))
  }

  /// Example text for the active lesson in the selected language.
  pub fn active_example(&self) -> Option<&str> {
    self.active_lesson().and_then(|l| l.example(self.selected_language))
  }

  /// Run the active lesson's pattern against `subject`.
  #[instrument(level = "info", skip(self, subject), fields(subject_len = subject.len()))]
  pub fn submit_test(&self, subject: &str) -> Result<MatchOutcome, CalendarError> {
    let lesson = self.active_lesson().ok_or(CalendarError::NoActiveLesson)?;
    Ok(tester::test(&lesson.pattern, subject))
  }

  /// Grid view as of now.
  pub fn overview(&self) -> Vec<SlotStatus> {
    self.slot_statuses(|id| self.is_accessible(id))
  }

  pub fn overview_on(&self, today: NaiveDate) -> Vec<SlotStatus> {
    self.slot_statuses(|id| self.is_accessible_on(id, today))
  }

  fn slot_statuses(&self, accessible: impl Fn(u32) -> bool) -> Vec<SlotStatus> {
    (1..=SLOT_COUNT)
      .map(|id| SlotStatus {
        id,
        accessible: accessible(id),
        revealed: self.is_revealed(id),
      })
      .collect()
  }
}
