use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use frontdesk_agent::AgentRuntime;

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

/// One chat turn from the surface: the new user message plus the prior
/// `[user, assistant]` pairs the surface is keeping. The server holds no
/// conversation state of its own.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ChatErrorBody {
    pub error: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { runtime })
}

/// The only caller of the conversation runtime. A turn either yields a
/// reply text or, on the propagating backend, a provider failure that
/// surfaces here as 502.
pub async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, (StatusCode, Json<ChatErrorBody>)> {
    let correlation_id = Uuid::new_v4();

    info!(
        event_name = "server.chat.turn_start",
        correlation_id = %correlation_id,
        prior_turns = request.history.len(),
        "chat turn received"
    );

    match state.runtime.handle_message(&request.message, &request.history).await {
        Ok(reply) => {
            info!(
                event_name = "server.chat.turn_done",
                correlation_id = %correlation_id,
                reply_bytes = reply.len(),
                "chat turn resolved"
            );
            Ok(Json(ChatReply { reply }))
        }
        Err(turn_error) => {
            error!(
                event_name = "server.chat.turn_failed",
                correlation_id = %correlation_id,
                error = %turn_error,
                "chat turn failed"
            );
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ChatErrorBody { error: turn_error.to_string() }),
            ))
        }
    }
}
