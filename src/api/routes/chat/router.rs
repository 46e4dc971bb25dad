//! Router for the chat API

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, sse::KeepAlive, sse::Sse},
    routing::{delete, get, post},
};
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public;
use super::reply::{ReplyEvent, SseReply};
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::chat::TurnOutcome;

type SharedState = Arc<AppState>;

fn session_not_found(id: &str) -> ApiError {
    ApiError::not_found(anyhow!("Chat session {} not found", id))
}

/// Start a new chat session
async fn create_session(State(state): State<SharedState>) -> impl IntoResponse {
    let session_id = state.start_session().await;
    tracing::info!("Chat session {} started", session_id);

    (
        StatusCode::CREATED,
        Json(public::CreateSessionResponse {
            session_id,
            welcome: state.config.welcome_message.clone(),
        }),
    )
}

/// End a chat session and discard its transcript
async fn end_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.end_session(&id).await {
        return Err(session_not_found(&id));
    }
    tracing::info!("Chat session {} ended", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Get the transcript of a chat session
///
/// Takes the session lock, so a read during a turn waits until that turn
/// completes or fails. The remote request has no timeout, so a stalled
/// turn also stalls this read.
async fn chat_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::ChatTranscriptResponse>, ApiError> {
    let handle = state
        .session(&id)
        .await
        .ok_or_else(|| session_not_found(&id))?;
    let session = handle.lock().await;

    Ok(Json(public::ChatTranscriptResponse {
        session_id: session.id.clone(),
        model: session.model().to_string(),
        transcript: session.transcript().messages().to_vec(),
    }))
}

/// Add a message to a chat session and stream the response
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<public::ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::bad_request(anyhow!("Message must not be empty")));
    }

    let handle = state
        .session(&payload.session_id)
        .await
        .ok_or_else(|| session_not_found(&payload.session_id))?;

    let (tx, rx) = mpsc::unbounded_channel::<ReplyEvent>();
    let sse_stream = UnboundedReceiverStream::new(rx).map(ReplyEvent::into_event);

    // The turn runs in its own task so it finishes even if the client
    // goes away mid-stream
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut session = handle.lock().await;
        let mut reply = SseReply::new(tx);

        match session.handle_message(&payload.message, &mut reply).await {
            TurnOutcome::Completed(content) => tracing::debug!(
                "Chat session {} completed a turn ({} chars)",
                session.id,
                content.len()
            ),
            TurnOutcome::Failed(_) => {
                tracing::debug!("Chat session {} turn failed", session.id)
            }
        }
        // A long turn shouldn't count as idle time
        sessions.touch(&session.id).await;
    });

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(end_session))
        .route("/{id}", get(chat_session))
}
