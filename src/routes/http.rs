//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, Json, response::{IntoResponse, Response}};
use tracing::{info, instrument, warn};

use crate::calendar::{AccessError, CalendarError};
use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

/// Map calendar errors onto HTTP statuses with a `{ "error": ... }` body.
pub(crate) fn error_response(err: CalendarError) -> Response {
  let status = match &err {
    CalendarError::Access(AccessError::OutOfRange(_)) => StatusCode::NOT_FOUND,
    CalendarError::Access(AccessError::Locked { .. }) => StatusCode::FORBIDDEN,
    CalendarError::InvalidLanguage(_) => StatusCode::BAD_REQUEST,
    CalendarError::NoActiveLesson => StatusCode::CONFLICT,
  };
  (status, Json(ErrorOut { error: err.to_string() })).into_response()
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, lessons: state.catalog.len() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_calendar(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(do_calendar(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_select(
  State(state): State<Arc<AppState>>,
  Path(raw): Path<String>,
) -> Response {
  // Non-numeric or negative ids are just doors that don't exist.
  let Ok(id) = raw.parse::<u32>() else {
    warn!(target: "calendar", slot = %raw, "Unparseable slot id");
    let error = format!("There is no door {raw}; the calendar has doors 1 to 24.");
    return (StatusCode::NOT_FOUND, Json(ErrorOut { error })).into_response();
  };
  match do_select(&state, id).await {
    Ok(lesson) => {
      info!(target: "calendar", slot = id, "HTTP lesson served");
      Json(lesson).into_response()
    }
    Err(e) => error_response(e),
  }
}

#[instrument(level = "info", skip(state, body), fields(language = %body.language))]
pub async fn http_post_language(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LanguageIn>,
) -> Response {
  match do_change_language(&state, &body.language).await {
    Ok(out) => Json(out).into_response(),
    Err(e) => error_response(e),
  }
}

#[instrument(level = "info", skip(state, body), fields(subject_len = body.subject.len(), playground = body.pattern.is_some()))]
pub async fn http_post_test(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TestIn>,
) -> Response {
  match do_submit_test(&state, &body.subject, body.pattern.as_deref()).await {
    Ok(out) => Json(out).into_response(),
    Err(e) => error_response(e),
  }
}
