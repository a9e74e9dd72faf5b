//! Chat API.
//!
//! Endpoints:
//!
//! - `POST /api/chat`        - run one turn for a session
//! - `POST /api/chat/clear`  - forget a session's history
//! - `GET  /api/ws/chat`     - WebSocket, one turn per text frame
//! - `GET  /api/tools`       - the tool catalog
//! - `GET  /auth/status`     - whether workspace credentials are usable

use axum::{
    Router,
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    extract::{Query, State},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use deskmate_agent::ChatReply;
use deskmate_core::message::ConversationId;
use deskmate_core::tool::ParamKind;

use crate::SharedState;

/// Session used by every WebSocket connection.
pub const WS_SESSION: &str = "ws_default";

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/clear", post(clear_handler))
        .route("/ws/chat", get(ws_handler))
        .route("/tools", get(list_tools_handler))
}

// ── Request / Response types ──────────────────────────────────────────────

fn default_session() -> String {
    "default".into()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearQuery {
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub status: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParamDto {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDto {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDto>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// Turn failures below the service (store errors) still answer with a reply.
async fn run_turn(state: &SharedState, session: &ConversationId, message: &str) -> ChatReply {
    match state.chat.chat(session, message).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(session_id = %session, error = %e, "Chat turn failed");
            ChatReply::error(format!("An error occurred: {e}"))
        }
    }
}

async fn chat_handler(State(state): State<SharedState>, Json(payload): Json<ChatRequest>) -> Json<ChatResponse> {
    info!(session_id = %payload.session_id, "api/chat request");
    let session = ConversationId::from(payload.session_id.as_str());
    let reply = run_turn(&state, &session, &payload.message).await;

    Json(ChatResponse {
        reply: reply.reply,
        session_id: payload.session_id,
    })
}

async fn clear_handler(State(state): State<SharedState>, Query(query): Query<ClearQuery>) -> Json<ClearResponse> {
    let session = ConversationId::from(query.session_id.as_str());
    if let Err(e) = state.chat.clear(&session).await {
        error!(session_id = %session, error = %e, "Failed to clear session");
    }

    Json(ClearResponse {
        status: "cleared".into(),
        session_id: query.session_id,
    })
}

async fn list_tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    let tools: Vec<ToolDto> = state
        .chat
        .agent()
        .registry()
        .catalog()
        .iter()
        .map(|spec| ToolDto {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            parameters: spec
                .params
                .iter()
                .map(|p| ParamDto {
                    name: p.name.to_string(),
                    kind: p.kind,
                    required: p.required,
                    description: p.description.to_string(),
                })
                .collect(),
        })
        .collect();
    let count = tools.len();

    Json(ToolListResponse { tools, count })
}

pub(crate) async fn auth_status_handler(State(state): State<SharedState>) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        authenticated: state.chat.agent().registry().is_authorized().await,
    })
}

// ── WebSocket ─────────────────────────────────────────────────────────────

/// `GET /api/ws/chat` - each inbound text frame is one user message.
///
/// Server → Client: `{ "reply": "...", "type": "message" | "error" }`
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Strict receive → turn → respond loop. A second frame waits for the first turn.
async fn handle_ws_connection(mut socket: WebSocket, state: SharedState) {
    info!("WebSocket connection established");
    let session = ConversationId::from(WS_SESSION);

    while let Some(msg) = socket.recv().await {
        let text = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue, // ignore binary, ping, pong
            Err(_) => break,
        };

        let reply = run_turn(&state, &session, text.as_str()).await;
        let json = serde_json::to_string(&reply).unwrap_or_default();
        if socket.send(WsMessage::Text(json.into())).await.is_err() {
            break; // client disconnected
        }
    }

    info!("WebSocket connection closed");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{GatewayState, build_router};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use deskmate_agent::{AUTH_REQUIRED_REPLY, AgentLoop, ChatService};
    use deskmate_core::error::{ProviderError, ToolError};
    use deskmate_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use deskmate_core::store::ConversationStore;
    use deskmate_memory::InMemoryStore;
    use deskmate_tools::{Operation, OperationRegistry, Workspace};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Lightweight scripted provider for gateway tests.
    struct MockProvider {
        replies: Mutex<VecDeque<String>>,
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::Network("script exhausted".into()))?;
            Ok(ProviderResponse {
                content,
                model: "mock-model".into(),
                usage: None,
            })
        }
    }

    struct MockWorkspace {
        authorized: bool,
    }

    #[async_trait]
    impl Workspace for MockWorkspace {
        fn name(&self) -> &str {
            "mock"
        }

        async fn is_authorized(&self) -> bool {
            self.authorized
        }

        async fn execute(&self, operation: Operation) -> Result<Value, ToolError> {
            Ok(json!({ "tool": operation.name().as_str() }))
        }
    }

    pub(crate) fn test_state(replies: &[&str], authorized: bool) -> SharedState {
        let provider = Arc::new(MockProvider {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        });
        let registry = Arc::new(OperationRegistry::new(Arc::new(MockWorkspace { authorized })).unwrap());
        let agent = AgentLoop::new(provider, registry, "mock-model");
        let chat = ChatService::new(agent, Arc::new(InMemoryStore::new()));
        Arc::new(GatewayState {
            chat: Arc::new(chat),
            model: "mock-model".into(),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn chat_returns_reply_and_default_session() {
        let state = test_state(&["<think>x</think>Hello there"], true);
        let app = build_router(state.clone());

        let response = app.oneshot(post_json("/api/chat", json!({"message": "hi"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"reply": "Hello there", "session_id": "default"}));

        let history = state.chat.store().load(&ConversationId::from("default")).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn chat_runs_tool_round_trip() {
        let state = test_state(
            &["```json\n{\"tool\": \"drive_list_files\", \"args\": {}}\n```", "Found your files."],
            true,
        );
        let app = build_router(state);

        let response = app
            .oneshot(post_json("/api/chat", json!({"message": "files?", "session_id": "s9"})))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"reply": "Found your files.", "session_id": "s9"}));
    }

    #[tokio::test]
    async fn chat_without_credentials_asks_to_sign_in() {
        let app = build_router(test_state(&[], false));

        let response = app.oneshot(post_json("/api/chat", json!({"message": "hi"}))).await.unwrap();
        assert_eq!(body_json(response).await["reply"], AUTH_REQUIRED_REPLY);
    }

    #[tokio::test]
    async fn clear_reports_cleared_session() {
        let state = test_state(&["ok"], true);
        let session = ConversationId::from("s1");
        state.chat.chat(&session, "hi").await.unwrap();

        let app = build_router(state.clone());
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat/clear?session_id=s1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(body_json(response).await, json!({"status": "cleared", "session_id": "s1"}));
        assert!(state.chat.store().load(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_tools_exposes_full_catalog() {
        let app = build_router(test_state(&[], true));

        let req = Request::builder().uri("/api/tools").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let list: ToolListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.count, 24);
        assert!(list.tools.iter().any(|t| t.name == "gmail_send"));
        let send = list.tools.iter().find(|t| t.name == "gmail_send").unwrap();
        assert!(send.parameters.iter().any(|p| p.name == "to" && p.required));
    }

    #[tokio::test]
    async fn auth_status_reflects_workspace() {
        for authorized in [true, false] {
            let app = build_router(test_state(&[], authorized));
            let req = Request::builder().uri("/auth/status").body(Body::empty()).unwrap();
            let response = app.oneshot(req).await.unwrap();
            assert_eq!(body_json(response).await, json!({ "authenticated": authorized }));
        }
    }

    #[tokio::test]
    async fn ws_route_requires_upgrade() {
        let app = build_router(test_state(&[], true));
        let req = Request::builder().uri("/api/ws/chat").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
