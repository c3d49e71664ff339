//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Building the calendar overview
//!   - Selecting (revealing) a slot and returning its lesson
//!   - Switching the example language
//!   - Testing a subject against the active lesson or a playground pattern

use tracing::{info, instrument, warn};

use crate::calendar::CalendarError;
use crate::domain::Language;
use crate::protocol::{to_out, CalendarOut, ExampleOut, LessonOut, TestOut};
use crate::state::AppState;
use crate::tester;
use crate::util::trunc_for_log;

#[instrument(level = "debug", skip(state))]
pub async fn do_calendar(state: &AppState) -> CalendarOut {
  let cal = state.calendar.read().await;
  CalendarOut {
    slots: cal.overview(),
    selected_slot: cal.selected_slot(),
    selected_language: cal.selected_language(),
    languages: Language::ALL.to_vec(),
    unlock: cal.policy(),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn do_select(state: &AppState, slot: u32) -> Result<LessonOut, CalendarError> {
  let mut cal = state.calendar.write().await;
  match cal.select(slot) {
    Ok(lesson) => {
      info!(target: "calendar", %slot, title = %lesson.title, "Lesson opened");
      Ok(to_out(&lesson, cal.selected_language()))
    }
    Err(e) => {
      warn!(target: "calendar", %slot, error = %e, "Slot selection refused");
      Err(e.into())
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn do_change_language(state: &AppState, tag: &str) -> Result<ExampleOut, CalendarError> {
  let mut cal = state.calendar.write().await;
  let language = cal.set_language(tag)?;
  Ok(ExampleOut {
    language,
    example: cal.active_example().map(str::to_string),
  })
}

/// Test `subject` against `pattern` when given, else against the active lesson.
#[instrument(level = "info", skip(state, subject, pattern), fields(subject_len = subject.len(), playground = pattern.is_some()))]
pub async fn do_submit_test(
  state: &AppState,
  subject: &str,
  pattern: Option<&str>,
) -> Result<TestOut, CalendarError> {
  let (pattern, outcome) = match pattern {
    Some(p) => (p.to_string(), tester::test(p, subject)),
    None => {
      let cal = state.calendar.read().await;
      let outcome = cal.submit_test(subject)?;
      let pattern = cal.active_lesson().map(|l| l.pattern.clone()).unwrap_or_default();
      (pattern, outcome)
    }
  };
  info!(target: "calendar", pattern = %trunc_for_log(&pattern, 80), outcome = ?outcome, "Test evaluated");
  let message = tester::describe(&outcome);
  Ok(TestOut { pattern, outcome, message })
}

#[cfg(test)]
pub(crate) mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::calendar::{AccessError, UnlockPolicy};
  use crate::catalog::tests::shipped;
  use crate::domain::MatchOutcome;
  use crate::progress::MemoryProgressStore;

  pub(crate) fn app(policy: UnlockPolicy) -> AppState {
    AppState::with_store(Arc::new(shipped()), Box::new(MemoryProgressStore::new()), policy)
  }

  #[tokio::test]
  async fn select_then_test_flow() {
    let state = app(UnlockPolicy::AlwaysOpen);

    let lesson = do_select(&state, 5).await.unwrap();
    assert_eq!(lesson.id, 5);
    assert_eq!(lesson.language, Language::JavaScript);
    assert!(lesson.example.is_some());

    let out = do_submit_test(&state, "#abc", None).await.unwrap();
    assert_eq!(out.pattern, lesson.pattern);
    assert_eq!(out.outcome, MatchOutcome::Matched { full_match: "#abc".into(), groups: vec![Some("abc".into())] });
    assert!(out.message.starts_with("✓ Match found!"));

    let cal = do_calendar(&state).await;
    assert_eq!(cal.selected_slot, Some(5));
    assert!(cal.slots[4].revealed);
  }

  #[tokio::test]
  async fn test_without_lesson_is_refused_but_playground_works() {
    let state = app(UnlockPolicy::AlwaysOpen);
    assert_eq!(do_submit_test(&state, "abc", None).await.unwrap_err(), CalendarError::NoActiveLesson);

    let out = do_submit_test(&state, "anything", Some("[")).await.unwrap();
    assert!(matches!(out.outcome, MatchOutcome::PatternError { .. }));
    assert!(out.message.starts_with("Error: "));
  }

  #[tokio::test]
  async fn out_of_range_select_is_an_access_error() {
    let state = app(UnlockPolicy::AlwaysOpen);
    assert_eq!(
      do_select(&state, 0).await.unwrap_err(),
      CalendarError::Access(AccessError::OutOfRange(0))
    );
  }

  #[tokio::test]
  async fn language_change_returns_example() {
    let state = app(UnlockPolicy::AlwaysOpen);
    do_select(&state, 3).await.unwrap();
    let ex = do_change_language(&state, "rust").await.unwrap();
    assert_eq!(ex.language, Language::Rust);
    assert!(ex.example.unwrap().contains("Regex::new"));
    assert!(do_change_language(&state, "fortran").await.is_err());
  }
}
