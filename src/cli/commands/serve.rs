//! HTTP API server for integration with UI frontends.
//!
//! Each caller gets (or resumes) its own session; conversation state is
//! never shared between sessions.

use crate::chat::{ChatEngine, Message, SessionStore};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    engine: ChatEngine,
    sessions: SessionStore,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let engine = ChatEngine::from_settings(&settings)?;

    let state = Arc::new(AppState {
        engine,
        sessions: SessionStore::new(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/sessions/{session_id}", delete(end_session))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Gearchat API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Chat", "POST   /chat");
    Output::kv("End Session", "DELETE /sessions/:session_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    /// Session to resume; a new session is created when absent.
    #[serde(default)]
    session_id: Option<Uuid>,
    query: String,
}

#[derive(Serialize)]
struct ChatResponse {
    session_id: Uuid,
    message: Message,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let (session_id, session) = state.sessions.get_or_create(req.session_id);

    // The per-session lock serializes turns within a session.
    let mut session = session.lock().await;
    let context = session.context.clone();

    match state
        .engine
        .converse(&req.query, &mut session.history, context)
        .await
    {
        Ok(turn) => {
            session.context = turn.context;
            Json(ChatResponse {
                session_id,
                message: turn.message,
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> impl IntoResponse {
    if state.sessions.end(session_id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown session: {}", session_id),
            }),
        )
            .into_response()
    }
}
