//! WebSocket connection handling

use std::sync::Arc;

use axum::Extension;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use mockview_core::{
    AuthContext, EventSink, InterviewError, InterviewEvent, StartInterview, SubmitAnswer,
    UserIdentity,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{AppState, ServerError};

use super::protocol::{ClientMessage, ServerMessage, interview_event_to_server_message};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let Some(identity) = auth.identity().cloned() else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: UserIdentity) {
    let connection_id = Uuid::new_v4().to_string();
    let user_id = identity.user_id.clone();
    let (mut sender, mut receiver) = socket.split();

    info!(%connection_id, %user_id, "WebSocket client connected");
    state.connections.register(&connection_id).await;

    let auth_msg = ServerMessage::AuthContext(AuthContext::Authenticated { identity });
    if let Err(e) = send_message(&mut sender, &auth_msg).await {
        warn!(%connection_id, error = %e, "Failed to send auth context");
    }

    // All events for this connection funnel through one writer so they keep their order
    let (events, mut event_rx) = mpsc::unbounded_channel::<InterviewEvent>();
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let msg = interview_event_to_server_message(&event);
            if let Err(e) = send_message(&mut sender, &msg).await {
                debug!(error = %e, "Dropping events for closed socket");
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_text_message(&text, &state, &connection_id, &user_id, &events).await;
            }
            Ok(Message::Close(_)) => {
                debug!(%connection_id, "WebSocket client sent close frame");
                break;
            }
            Ok(_) => {
                // Ping/pong is answered by the transport; binary frames are ignored
            }
            Err(e) => {
                warn!(%connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    release_sessions(&state, &connection_id).await;
    writer.abort();
    info!(%connection_id, %user_id, "WebSocket client disconnected");
}

/// Cancel pending advances for a dropped connection's sessions, abandoning them if configured
async fn release_sessions(state: &AppState, connection_id: &str) {
    for session_id in state.connections.unregister(connection_id).await {
        state.service.pacing().cancel(&session_id);
        if !state.abandon_on_disconnect {
            continue;
        }
        match state.service.abandon(&session_id).await {
            Ok(true) => info!(%session_id, "Abandoned interview after disconnect"),
            Ok(false) => {}
            Err(e) => warn!(%session_id, error = %e, "Failed to abandon interview"),
        }
    }
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), ServerError> {
    let json = serde_json::to_string(msg).map_err(|e| ServerError::Internal(e.to_string()))?;
    sender
        .send(Message::Text(json))
        .await
        .map_err(|e| ServerError::WebSocket(e.to_string()))
}

/// Handle a text message from the client
///
/// Failures are reported to the client as `error` messages.
async fn handle_text_message(
    text: &str,
    state: &AppState,
    connection_id: &str,
    user_id: &str,
    events: &EventSink,
) {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!(error = %e, "Rejected malformed client message");
            let err = InterviewError::Validation(format!("Invalid message: {e}"));
            let _ = events.send(InterviewEvent::error(None, &err));
            return;
        }
    };

    let session_id = client_msg.session_id().map(str::to_string);
    match dispatch(client_msg, state, user_id, events).await {
        Ok(bound) => {
            if let Some(bound) = bound.or(session_id) {
                state.connections.bind(connection_id, &bound).await;
            }
        }
        Err(e) => {
            debug!(session_id = ?session_id, code = e.code(), error = %e, "Command failed");
            let _ = events.send(InterviewEvent::error(session_id.as_deref(), &e));
        }
    }
}

/// Run one client command; returns the id of a newly created session
async fn dispatch(
    msg: ClientMessage,
    state: &AppState,
    user_id: &str,
    events: &EventSink,
) -> Result<Option<String>, InterviewError> {
    let service = &state.service;
    match msg {
        ClientMessage::StartInterview {
            interview_type,
            difficulty,
            duration_tier,
        } => {
            let cmd = StartInterview {
                interview_type,
                difficulty,
                duration_tier,
            };
            let session = service.start(user_id, cmd, events).await?;
            Ok(Some(session.id))
        }
        ClientMessage::SubmitAnswer {
            session_id,
            question_id,
            answer,
            time_spent,
        } => {
            let cmd = SubmitAnswer {
                session_id,
                question_id,
                answer,
                time_spent,
            };
            service.submit_answer(user_id, cmd, events).await?;
            Ok(None)
        }
        ClientMessage::SkipQuestion { session_id } => {
            service.skip_question(user_id, &session_id, events).await?;
            Ok(None)
        }
        ClientMessage::PauseInterview { session_id } => {
            service.authorize(&session_id, user_id).await?;
            service.pause(&session_id, events).await?;
            Ok(None)
        }
        ClientMessage::ResumeInterview { session_id } => {
            service.authorize(&session_id, user_id).await?;
            service.resume(&session_id, events).await?;
            Ok(None)
        }
    }
}
