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
use chrono::Utc;
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::state::AppState;
use crate::store::SortBy;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "mathez_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "mathez_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "mathez_backend", raw = %trunc_for_log(&txt, 200), "WS received");
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "mathez_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "mathez_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewProblem { query } => ServerWsMessage::Problem { issued: issue_problem(state, query).await },

    ClientWsMessage::RandomProblem { level } => {
      ServerWsMessage::Problem { issued: issue_random_problem(state, level).await }
    }

    ClientWsMessage::ChapterProblem { chapter_id, mode } => {
      match issue_chapter_problem(state, &chapter_id, mode.as_deref()).await {
        Some(issued) => ServerWsMessage::Problem { issued },
        None => ServerWsMessage::Error { message: format!("Unknown chapter: {}", chapter_id) },
      }
    }

    ClientWsMessage::SubmitAnswer { body } => match evaluate_answer(state, &body).await {
      Some(result) => {
        tracing::info!(target: "problem", id = %body.problem_id, correct = result.correct, "WS submit_answer evaluated");
        ServerWsMessage::AnswerResult { result }
      }
      None => ServerWsMessage::Error { message: format!("Unknown problemId: {}", body.problem_id) },
    },

    ClientWsMessage::SimilarProblem { wrong_id } => match similar_problem(state, &wrong_id).await {
      Some(issued) => ServerWsMessage::Problem { issued },
      None => ServerWsMessage::Error { message: format!("No similar problem for wrong note: {}", wrong_id) },
    },

    ClientWsMessage::ListWrong { sort_by } => {
      let sort_by = sort_by.as_deref().map(SortBy::parse).unwrap_or_default();
      ServerWsMessage::WrongList { items: state.list_wrong(sort_by).await }
    }

    ClientWsMessage::SaveProgress { progress } => match state.save_progress(progress, Utc::now()).await {
      Some(record) => ServerWsMessage::Progress { record },
      None => ServerWsMessage::Error { message: "chapterId is required".into() },
    },

    ClientWsMessage::GetStreak => ServerWsMessage::Streak { streak: state.streak(Utc::now().date_naive()).await },
  }
}
