//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "regex_advent", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "regex_advent", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let out = reply_for_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "regex_advent", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "regex_advent", "WebSocket disconnected");
}

/// Parse, dispatch, serialize. Malformed input becomes an `error` reply.
async fn reply_for_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "regex_advent", "WS received: {:?}", &incoming);
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Calendar => ServerWsMessage::Calendar { calendar: do_calendar(state).await },

    ClientWsMessage::SelectSlot { slot } => match do_select(state, slot).await {
      Ok(lesson) => {
        tracing::info!(target: "calendar", %slot, "WS lesson served");
        ServerWsMessage::Lesson { lesson }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::ChangeLanguage { language } => match do_change_language(state, &language).await {
      Ok(example) => ServerWsMessage::Example { example },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::SubmitTest { subject, pattern } => {
      match do_submit_test(state, &subject, pattern.as_deref()).await {
        Ok(result) => ServerWsMessage::TestResult { result },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::calendar::UnlockPolicy;
  use crate::logic::tests::app;

  async fn roundtrip(state: &AppState, txt: &str) -> serde_json::Value {
    serde_json::from_str(&reply_for_text(txt, state).await).unwrap()
  }

  #[tokio::test]
  async fn ws_flow_select_language_test() {
    let state = app(UnlockPolicy::AlwaysOpen);

    let v = roundtrip(&state, r#"{"type": "ping"}"#).await;
    assert_eq!(v["type"], "pong");

    let v = roundtrip(&state, r#"{"type": "select_slot", "slot": 5}"#).await;
    assert_eq!(v["type"], "lesson");
    assert_eq!(v["lesson"]["id"], 5);

    let v = roundtrip(&state, r#"{"type": "change_language", "language": "python"}"#).await;
    assert_eq!(v["type"], "example");
    assert_eq!(v["language"], "python");

    let v = roundtrip(&state, r##"{"type": "submit_test", "subject": "#12"}"##).await;
    assert_eq!(v["type"], "test_result");
    assert_eq!(v["outcome"]["status"], "not_matched");
    assert_eq!(v["message"], "✗ No match found.");

    let v = roundtrip(&state, r#"{"type": "calendar"}"#).await;
    assert_eq!(v["calendar"]["selectedSlot"], 5);
    assert_eq!(v["calendar"]["selectedLanguage"], "python");
  }

  #[tokio::test]
  async fn malformed_messages_get_error_replies() {
    let state = app(UnlockPolicy::AlwaysOpen);
    let v = roundtrip(&state, "not json").await;
    assert_eq!(v["type"], "error");
    assert!(v["message"].as_str().unwrap().starts_with("Invalid JSON"));

    let v = roundtrip(&state, r#"{"type": "select_slot", "slot": 99}"#).await;
    assert_eq!(v["type"], "error");
  }
}
