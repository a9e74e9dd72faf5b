//! HTTP and WebSocket gateway for Deskmate.
//!
//! A thin transport over [`ChatService`]: every route either runs one turn,
//! clears a session, or reports static information. No turn logic lives here.
//!
//! Built on Axum.

pub mod api;

use std::sync::Arc;

use anyhow::Context as _;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use deskmate_agent::{AgentLoop, ChatService};
use deskmate_config::AppConfig;
use deskmate_memory::InMemoryStore;
use deskmate_providers::OpenAiCompatProvider;
use deskmate_tools::{GoogleWorkspace, OperationRegistry};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub chat: Arc<ChatService>,
    pub model: String,
}

pub type SharedState = Arc<GatewayState>;

/// Wire the configured provider, workspace, registry and store into a service.
pub fn build_chat_service(config: &AppConfig) -> anyhow::Result<ChatService> {
    let provider = Arc::new(
        OpenAiCompatProvider::from_config(config).context("failed to build the model client")?,
    );
    let workspace = Arc::new(
        GoogleWorkspace::from_config(&config.google).context("failed to build the Google workspace")?,
    );
    let registry = Arc::new(OperationRegistry::new(workspace).context("tool catalog check failed")?);
    let store = Arc::new(InMemoryStore::with_limit(config.agent.history_limit));
    let agent = AgentLoop::from_config(provider, registry, config);

    Ok(ChatService::new(agent, store))
}

/// Build the router with every route, body limit and trace logging.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router())
        .route("/auth/status", get(api::auth_status_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS for a browser front end served from the gateway's own port.
pub fn cors_layer(port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [format!("http://localhost:{port}"), format!("http://127.0.0.1:{port}")]
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let chat = Arc::new(build_chat_service(&config)?);
    let state = Arc::new(GatewayState {
        chat,
        model: config.model.clone(),
    });
    let app = build_router(state).layer(cors_layer(config.gateway.port));

    info!(addr = %addr, model = %config.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
}

async fn health_handler(axum::extract::State(state): axum::extract::State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        service: "Deskmate".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        model: state.model.clone(),
    })
}
