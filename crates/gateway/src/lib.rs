//! HTTP API gateway for DiabeCare.
//!
//! Endpoints:
//!
//! - `GET    /`        — service banner and endpoint list
//! - `POST   /analyze` — one-shot health report
//! - `POST   /chat`    — chat exchange with recent history
//! - `GET    /memory`  — stored chat history
//! - `DELETE /memory`  — clear chat history
//!
//! Every handler answers 200 with a JSON body. Malformed request bodies are
//! reported inside that body as `{"success": false, ...}`.
//!
//! Built on Axum.

use axum::extract::rejection::JsonRejection;
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use diabecare_agent::{ChatOrchestrator, HealthData, SugarReading};
use diabecare_config::AppConfig;
use diabecare_core::error::ProviderError;
use diabecare_core::message::ChatTurn;
use diabecare_memory::FileMemory;
use diabecare_providers::CompletionClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<ChatOrchestrator>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all routes.
///
/// CORS is fully open so a browser frontend on any origin can call the API.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/analyze", post(analyze_handler))
        .route("/chat", post(chat_handler))
        .route("/memory", get(get_memory_handler).delete(clear_memory_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the provider, history file and orchestrator from configuration.
pub fn build_orchestrator(config: &AppConfig) -> Result<Arc<ChatOrchestrator>, ProviderError> {
    let provider = diabecare_providers::build_from_config(config)?;
    let completion = Arc::new(CompletionClient::new(provider, &config.model));
    let memory = Arc::new(FileMemory::new(&config.memory.path, config.memory.max_turns));
    Ok(Arc::new(ChatOrchestrator::new(completion, memory)))
}

/// Start the gateway HTTP server.
///
/// Fails before binding when no API key is configured.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.require_api_key()?;

    let orchestrator = build_orchestrator(&config)?;
    let app = build_router(Arc::new(GatewayState { orchestrator }));

    let addr = config.bind_addr();
    info!(
        addr = %addr,
        model = %config.model,
        memory_file = %config.memory.path.display(),
        max_turns = config.memory.max_turns,
        "Starting DiabeCare API"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// `"Error: <reason>"` text for a body that could not be decoded.
fn rejection_text(rejection: &JsonRejection) -> String {
    format!("Error: {}", rejection.body_text())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
struct Endpoints {
    analyze: String,
    chat: String,
    memory_get: String,
    memory_clear: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RootResponse {
    message: String,
    version: String,
    model: String,
    status: String,
    endpoints: Endpoints,
}

async fn root_handler(State(state): State<SharedState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "✅ DiabetesCare API is running!".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        model: state.orchestrator.model().to_string(),
        status: "online".into(),
        endpoints: Endpoints {
            analyze: "POST /analyze - Analyze health data".into(),
            chat: "POST /chat - Chat with AI assistant".into(),
            memory_get: "GET /memory - View chat history".into(),
            memory_clear: "DELETE /memory - Clear chat history".into(),
        },
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct AnalyzeResponse {
    success: bool,
    analysis: String,
}

async fn analyze_handler(
    State(state): State<SharedState>,
    payload: Result<Json<HealthData>, JsonRejection>,
) -> Json<AnalyzeResponse> {
    let data = match payload {
        Ok(Json(data)) => data,
        Err(rejection) => {
            error!(error = %rejection, "Rejected /analyze body");
            return Json(AnalyzeResponse {
                success: false,
                analysis: rejection_text(&rejection),
            });
        }
    };

    info!(
        urgent = SugarReading::classify(&data).requires_urgent_action(),
        "Analyze request"
    );
    let analysis = state.orchestrator.analyze(&data).await;
    Json(AnalyzeResponse {
        success: true,
        analysis,
    })
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatResponse {
    success: bool,
    reply: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    match payload {
        Ok(Json(request)) => {
            info!(message_len = request.message.len(), "Chat request");
            let reply = state.orchestrator.chat(&request.message).await;
            Json(ChatResponse {
                success: true,
                reply,
            })
        }
        Err(rejection) => {
            error!(error = %rejection, "Rejected /chat body");
            Json(ChatResponse {
                success: false,
                reply: rejection_text(&rejection),
            })
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MemoryResponse {
    memory: Vec<ChatTurn>,
    max_turns: usize,
}

async fn get_memory_handler(State(state): State<SharedState>) -> Json<MemoryResponse> {
    Json(MemoryResponse {
        memory: state.orchestrator.history().await,
        max_turns: state.orchestrator.max_turns(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageResponse {
    message: String,
}

async fn clear_memory_handler(State(state): State<SharedState>) -> Json<MessageResponse> {
    let message = match state.orchestrator.clear_history().await {
        Ok(()) => "Memory cleared successfully!".to_string(),
        Err(e) => {
            error!(error = %e, "Failed to clear chat history");
            format!("Error: {e}")
        }
    };
    Json(MessageResponse { message })
}
