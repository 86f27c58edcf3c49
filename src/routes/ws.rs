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
use tracing::{debug, error, info, instrument};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "xp_progression", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "xp_progression", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = reply_to_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(reply)).await {
          error!(target: "xp_progression", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "xp_progression", "WebSocket disconnected");
}

/// Parse, dispatch, serialize.
async fn reply_to_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "xp_progression", "WS received: {:?}", &incoming);
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

    ClientWsMessage::GetLevels => {
      let table = state.level_table().await;
      ServerWsMessage::Levels { levels: table.levels().to_vec() }
    }

    ClientWsMessage::GetSummary { user_id } => match summarize_user(state, &user_id).await {
      Ok(summary) => ServerWsMessage::Summary { summary },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::GrantXp { user_id, grant } => match grant_experience(state, &user_id, grant).await {
      Ok(grant) => {
        info!(target: "xp_progression", %user_id, entry_id = %grant.entry.id, leveled_up = grant.leveled_up, "WS grant recorded");
        ServerWsMessage::Granted { grant }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProgressionConfig;

  #[tokio::test]
  async fn ws_grant_then_summary() {
    let state = AppState::new(ProgressionConfig::default()).unwrap();

    let granted: serde_json::Value = serde_json::from_str(
      &reply_to_text(r#"{"type":"grant_xp","userId":"u1","sourceType":"quiz_completed","xp":150}"#, &state).await,
    )
    .unwrap();
    assert_eq!(granted["type"], "granted");
    assert_eq!(granted["grant"]["leveled_up"], true);

    let summary: serde_json::Value =
      serde_json::from_str(&reply_to_text(r#"{"type":"get_summary","userId":"u1"}"#, &state).await).unwrap();
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["summary"]["total_xp"], 150);
    assert_eq!(summary["summary"]["current_level"]["level"], 2);
  }

  #[tokio::test]
  async fn ws_reports_bad_input_as_error_message() {
    let state = AppState::new(ProgressionConfig::default()).unwrap();
    let reply: serde_json::Value = serde_json::from_str(&reply_to_text("not json", &state).await).unwrap();
    assert_eq!(reply["type"], "error");

    let reply: serde_json::Value = serde_json::from_str(
      &reply_to_text(r#"{"type":"grant_xp","userId":"u1","sourceType":"quiz_completed","xp":0}"#, &state).await,
    )
    .unwrap();
    assert_eq!(reply["type"], "error");

    let reply: serde_json::Value = serde_json::from_str(&reply_to_text(r#"{"type":"ping"}"#, &state).await).unwrap();
    assert_eq!(reply["type"], "pong");
  }
}
