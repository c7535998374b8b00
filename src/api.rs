//! REST API Server for FinGenie
//!
//! Exposes the assistant, ledger, auth and preferences via HTTP endpoints
//! for a browser frontend.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assistant::Assistant;
use crate::auth::AuthService;
use crate::error::FinGenieError;
use crate::models::{NewGoal, NewTransaction, Page, TimeFrame};
use crate::preferences::Preferences;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub page: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub timeframe: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn fail(error: FinGenieError) -> ApiResult {
    let status = match &error {
        FinGenieError::Validation(_) => StatusCode::BAD_REQUEST,
        FinGenieError::Auth(_) => StatusCode::UNAUTHORIZED,
        FinGenieError::NotFound(_) => StatusCode::NOT_FOUND,
        FinGenieError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(error.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<Assistant>,
    pub auth: Arc<AuthService>,
    pub preferences: Arc<Preferences>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "ai_session": state.assistant.has_session(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Conversation Endpoints
/// =============================

async fn get_conversation(State(state): State<ApiState>) -> ApiResult {
    ok(state.assistant.conversation().await)
}

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> ApiResult {
    info!("Received chat message ({} chars)", req.message.len());

    let outcome = state.assistant.send_message(&req.message).await;
    ok(serde_json::json!({
        "outcome": outcome,
        "conversation": state.assistant.conversation().await,
    }))
}

async fn navigate_handler(
    State(state): State<ApiState>,
    Json(req): Json<NavigateRequest>,
) -> ApiResult {
    let page: Page = match req.page.parse() {
        Ok(page) => page,
        Err(e) => return fail(e),
    };
    state.assistant.navigate(page).await;
    ok(state.assistant.conversation().await)
}

async fn suggestions(State(state): State<ApiState>) -> ApiResult {
    let page = state.assistant.page().await;
    ok(serde_json::json!({
        "page": page,
        "suggestions": page.suggestions(),
    }))
}

/// =============================
/// Ledger Endpoints
/// =============================

async fn list_transactions(State(state): State<ApiState>) -> ApiResult {
    ok(state.assistant.transactions().await)
}

async fn create_transaction(
    State(state): State<ApiState>,
    Json(req): Json<NewTransaction>,
) -> ApiResult {
    match state.assistant.add_transaction(req).await {
        Ok(transaction) => (StatusCode::CREATED, Json(ApiResponse::success(transaction))),
        Err(e) => fail(e),
    }
}

async fn delete_transaction(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    if state.assistant.delete_transaction(&id).await {
        ok(serde_json::json!({ "deleted": id }))
    } else {
        fail(FinGenieError::NotFound(format!("transaction {}", id)))
    }
}

async fn list_goals(State(state): State<ApiState>) -> ApiResult {
    ok(state.assistant.goals().await)
}

async fn create_goal(State(state): State<ApiState>, Json(req): Json<NewGoal>) -> ApiResult {
    match state.assistant.add_goal(req).await {
        Ok(goal) => (StatusCode::CREATED, Json(ApiResponse::success(goal))),
        Err(e) => fail(e),
    }
}

async fn delete_goal(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    if state.assistant.delete_goal(&id).await {
        ok(serde_json::json!({ "deleted": id }))
    } else {
        fail(FinGenieError::NotFound(format!("goal {}", id)))
    }
}

async fn summary(State(state): State<ApiState>) -> ApiResult {
    ok(state.assistant.summary().await)
}

async fn analytics(
    State(state): State<ApiState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult {
    let frame: TimeFrame = match query.timeframe.as_deref().map(str::parse::<TimeFrame>).transpose() {
        Ok(frame) => frame.unwrap_or_default(),
        Err(e) => return fail(e),
    };

    let (series, categories) = state.assistant.analytics(frame).await;
    ok(serde_json::json!({
        "timeframe": frame,
        "series": series,
        "categories": categories,
    }))
}

/// =============================
/// Auth & Preferences Endpoints
/// =============================

async fn signup(State(state): State<ApiState>, Json(req): Json<SignupRequest>) -> ApiResult {
    match state
        .auth
        .signup(&req.full_name, &req.email, &req.password, &req.confirm_password)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(ApiResponse::success(user))),
        Err(e) => fail(e),
    }
}

async fn login(State(state): State<ApiState>, Json(req): Json<LoginRequest>) -> ApiResult {
    match state.auth.login(&req.email, &req.password).await {
        Ok(user) => ok(user),
        Err(e) => fail(e),
    }
}

async fn logout(State(state): State<ApiState>) -> ApiResult {
    match state.auth.logout().await {
        Ok(()) => ok(serde_json::json!({ "logged_out": true })),
        Err(e) => fail(e),
    }
}

async fn current_user(State(state): State<ApiState>) -> ApiResult {
    match state.auth.current_user().await {
        Ok(user) => ok(user),
        Err(e) => fail(e),
    }
}

async fn get_theme(State(state): State<ApiState>) -> ApiResult {
    match state.preferences.theme().await {
        Ok(theme) => ok(serde_json::json!({ "theme": theme })),
        Err(e) => fail(e),
    }
}

async fn toggle_theme(State(state): State<ApiState>) -> ApiResult {
    match state.preferences.toggle_theme().await {
        Ok(theme) => ok(serde_json::json!({ "theme": theme })),
        Err(e) => fail(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/conversation", get(get_conversation))
        .route("/api/chat", post(chat_handler))
        .route("/api/navigate", post(navigate_handler))
        .route("/api/suggestions", get(suggestions))
        .route("/api/transactions", get(list_transactions).post(create_transaction))
        .route("/api/transactions/:id", delete(delete_transaction))
        .route("/api/goals", get(list_goals).post(create_goal))
        .route("/api/goals/:id", delete(delete_goal))
        .route("/api/summary", get(summary))
        .route("/api/analytics", get(analytics))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(current_user))
        .route("/api/theme", get(get_theme))
        .route("/api/theme/toggle", post(toggle_theme))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tests::ScriptedChat;
    use crate::gemini::ChatSession;
    use crate::ledger::Ledger;
    use crate::storage::InMemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(replies: Vec<crate::Result<crate::gemini::ModelReply>>) -> Router {
        let chat: Arc<dyn ChatSession> = Arc::new(ScriptedChat::new(replies));
        let store = Arc::new(InMemoryStore::new());
        create_router(ApiState {
            assistant: Arc::new(Assistant::new(Some(chat), Ledger::sample())),
            auth: Arc::new(AuthService::new(store.clone(), Arc::new(InMemoryStore::new()))),
            preferences: Arc::new(Preferences::new(store)),
        })
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, ApiResponse) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let router = test_router(vec![ScriptedChat::text(
            r#"{"type":"budget_plan","summary":"Plan","data":[{"category":"Rent","amount":15000,"details":"Fixed"}]}"#,
        )]);

        let (status, body) = call(
            &router,
            "POST",
            "/api/chat",
            Some(serde_json::json!({ "message": "Make me a budget" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["outcome"], "answered");
        assert_eq!(data["conversation"]["state"], "idle");
        assert_eq!(data["conversation"]["messages"][1]["content"]["type"], "budget_plan");
    }

    #[tokio::test]
    async fn test_navigate_clears_conversation() {
        let router = test_router(vec![ScriptedChat::text("hello")]);
        call(&router, "POST", "/api/chat", Some(serde_json::json!({ "message": "hi" }))).await;

        let (status, body) = call(
            &router,
            "POST",
            "/api/navigate",
            Some(serde_json::json!({ "page": "Goals" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["page"], "Goals");
        assert_eq!(data["messages"].as_array().unwrap().len(), 0);

        let (status, _) = call(
            &router,
            "POST",
            "/api/navigate",
            Some(serde_json::json!({ "page": "Settings" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_transaction_crud_and_summary() {
        let router = test_router(vec![]);

        let (status, body) = call(
            &router,
            "POST",
            "/api/transactions",
            Some(serde_json::json!({
                "title": "Bonus",
                "amount": 5000,
                "type": "income",
                "category": "Salary",
                "date": "2023-10-20"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body.data.unwrap()["id"].as_str().unwrap().to_string();

        let (_, body) = call(&router, "GET", "/api/summary", None).await;
        assert_eq!(body.data.unwrap()["income"], 92000.0);

        let (status, _) = call(&router, "DELETE", &format!("/api/transactions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&router, "DELETE", &format!("/api/transactions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_goal_is_rejected() {
        let router = test_router(vec![]);
        let (status, body) = call(
            &router,
            "POST",
            "/api/goals",
            Some(serde_json::json!({
                "name": "",
                "targetAmount": 1000,
                "currentAmount": 0,
                "targetDate": "2025-01-01"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_analytics_and_suggestions() {
        let router = test_router(vec![]);

        let (_, body) = call(&router, "GET", "/api/analytics?timeframe=monthly", None).await;
        let data = body.data.unwrap();
        assert_eq!(data["series"][0]["date"], "2023-10");
        assert_eq!(data["categories"][0]["name"], "Housing");

        let (status, _) = call(&router, "GET", "/api/analytics?timeframe=hourly", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&router, "GET", "/api/suggestions", None).await;
        assert_eq!(body.data.unwrap()["suggestions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_auth_flow() {
        let router = test_router(vec![]);
        let signup = serde_json::json!({
            "fullName": "Asha Rao",
            "email": "asha@example.com",
            "password": "password1",
            "confirmPassword": "password1"
        });

        let (status, _) = call(&router, "POST", "/api/auth/signup", Some(signup.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = call(&router, "POST", "/api/auth/signup", Some(signup)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error.as_deref(), Some("An account with this email already exists."));

        let (_, body) = call(&router, "GET", "/api/auth/me", None).await;
        assert_eq!(body.data.unwrap()["fullName"], "Asha Rao");

        call(&router, "POST", "/api/auth/logout", None).await;
        let (_, body) = call(&router, "GET", "/api/auth/me", None).await;
        assert!(body.success);
        assert!(body.data.is_none());
    }

    #[tokio::test]
    async fn test_theme_toggle() {
        let router = test_router(vec![]);
        let (_, body) = call(&router, "POST", "/api/theme/toggle", None).await;
        assert_eq!(body.data.unwrap()["theme"], "light");
    }
}
