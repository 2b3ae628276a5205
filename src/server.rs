//! HTTP surface: site pages, the auth API, and the chat widget API.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, get_service, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::auth::{AuthError, SignedIn, UserProfile};
use crate::chat::{SubmitRejected, WidgetSnapshot};
use crate::config::AppConfig;

/// Start the Axum server with the provided configuration and state.
pub async fn start_server(config: Arc<AppConfig>, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        answering_url = %config.chat.answering_url,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
///
/// Kept separate from [`start_server`] so tests can drive the full
/// surface in-process.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Site pages. Styling is deliberately minimal; these exist to
        // exercise the form flows.
        .route("/", get_service(ServeFile::new("static/index.html")))
        .route(
            "/signup",
            get_service(ServeFile::new("static/signup.html")).post(signup_form),
        )
        .route(
            "/signin",
            get_service(ServeFile::new("static/signin.html")).post(signin_form),
        )
        .nest_service("/assets", ServeDir::new("static"))
        // Auth API
        .route("/api/auth/sign-up", post(api_sign_up))
        .route("/api/auth/sign-in", post(api_sign_in))
        .route("/api/auth/session", get(api_session))
        .route("/api/auth/sign-out", post(api_sign_out))
        // Chat widget API
        .route("/api/chat", get(api_chat_snapshot))
        .route("/api/chat/ask", post(api_chat_ask))
        .route("/api/chat/selection", post(api_chat_selection))
        .route("/api/chat/clear", post(api_chat_clear))
        .route("/api/chat/toggle", post(api_chat_toggle))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth API
// ─────────────────────────────────────────────────────────────────────────────

/// Auth failure as an HTTP response: a status code plus the
/// `{ "error": { "message": ... } }` body shape used across the API.
struct ApiError(AuthError);

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::DuplicateUser => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::OperationFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": { "message": self.0.to_string() } });
        (auth_status(&self.0), Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

/// Request body for sign-up.
#[derive(Debug, Deserialize)]
struct SignUpRequest {
    email: String,
    password: String,
    profile: UserProfile,
}

/// POST /api/auth/sign-up - Register a user and open a session.
async fn api_sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<SignedIn>, ApiError> {
    let signed = state
        .auth
        .sign_up(&req.email, &req.password, req.profile)
        .await?;

    info!(name: "auth.sign_up.ok", user_id = %signed.user.id, "user registered");
    Ok(Json(signed))
}

/// Request body for sign-in.
#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

/// POST /api/auth/sign-in - Open a session for an existing user.
async fn api_sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignedIn>, ApiError> {
    let signed = state.auth.sign_in(&req.email, &req.password).await?;

    info!(name: "auth.sign_in.ok", user_id = %signed.user.id, "user signed in");
    Ok(Json(signed))
}

/// GET /api/auth/session - The current user, `null` when signed out.
async fn api_session(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "user": state.auth.current_user().await }))
}

/// POST /api/auth/sign-out - Drop the current session. Always succeeds.
async fn api_sign_out(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.auth.sign_out().await;
    Json(json!({ "success": true }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Form handlers (page surface)
// ─────────────────────────────────────────────────────────────────────────────

/// Sign-up form fields. The checkbox arrives only when checked.
#[derive(Debug, Deserialize)]
struct SignupForm {
    email: String,
    password: String,
    confirm_password: String,
    years_of_experience: String,
    #[serde(default)]
    hardware_knowledge: Option<String>,
    favorite_language: String,
}

/// Field validation for the sign-up page. The store itself validates
/// none of this; it is a UI concern.
fn validate_signup(form: &SignupForm) -> Result<UserProfile, &'static str> {
    if form.email.is_empty() {
        return Err("Email is required");
    }
    if form.password.len() < 6 {
        return Err("Password must be at least 6 characters");
    }
    if form.confirm_password != form.password {
        return Err("Passwords do not match");
    }
    let years: u32 = form
        .years_of_experience
        .trim()
        .parse()
        .map_err(|_| "Years of experience must be a non-negative whole number")?;
    if form.favorite_language.is_empty() {
        return Err("Favorite language is required");
    }

    Ok(UserProfile {
        years_of_experience: years,
        hardware_knowledge: form.hardware_knowledge.is_some(),
        favorite_language: form.favorite_language.clone(),
    })
}

fn form_error(status: StatusCode, back: &str, message: &str) -> Response {
    let body = format!(
        "<!doctype html><html><body><p>{message}</p><p><a href=\"{back}\">Back</a></p></body></html>"
    );
    (status, Html(body)).into_response()
}

/// POST /signup - Validate, register, and land on the site root.
async fn signup_form(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let profile = match validate_signup(&form) {
        Ok(profile) => profile,
        Err(message) => return form_error(StatusCode::UNPROCESSABLE_ENTITY, "/signup", message),
    };

    match state.auth.sign_up(&form.email, &form.password, profile).await {
        Ok(signed) => {
            info!(name: "auth.sign_up.ok", user_id = %signed.user.id, "user registered");
            Redirect::to("/").into_response()
        }
        Err(err) => form_error(auth_status(&err), "/signup", &err.to_string()),
    }
}

/// Sign-in form fields.
#[derive(Debug, Deserialize)]
struct SigninForm {
    email: String,
    password: String,
}

/// POST /signin - Sign in and land on the site root.
async fn signin_form(State(state): State<AppState>, Form(form): Form<SigninForm>) -> Response {
    if form.email.is_empty() {
        return form_error(StatusCode::UNPROCESSABLE_ENTITY, "/signin", "Email is required");
    }
    if form.password.is_empty() {
        return form_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "/signin",
            "Password is required",
        );
    }

    match state.auth.sign_in(&form.email, &form.password).await {
        Ok(signed) => {
            info!(name: "auth.sign_in.ok", user_id = %signed.user.id, "user signed in");
            Redirect::to("/").into_response()
        }
        Err(err) => form_error(auth_status(&err), "/signin", &err.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat widget API
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for a chat submission.
#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

/// POST /api/chat/ask - Submit one question and get the assistant turn.
///
/// Remote failures still answer 200: the failure is rendered as the
/// fallback assistant turn, exactly as the widget displays it.
async fn api_chat_ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    match state.chat.submit(&req.question).await {
        Ok(turn) => Json(turn).into_response(),
        Err(rejected) => {
            let status = match rejected {
                SubmitRejected::EmptyQuestion => StatusCode::UNPROCESSABLE_ENTITY,
                SubmitRejected::Busy => StatusCode::CONFLICT,
            };
            let body = json!({ "error": { "message": rejected.to_string() } });
            (status, Json(body)).into_response()
        }
    }
}

/// Request body for a page text selection.
#[derive(Debug, Deserialize)]
struct SelectionRequest {
    text: String,
}

/// POST /api/chat/selection - Record a page selection.
async fn api_chat_selection(
    State(state): State<AppState>,
    Json(req): Json<SelectionRequest>,
) -> Json<serde_json::Value> {
    let retained = state.chat.observe_selection(&req.text);
    Json(json!({ "retained": retained }))
}

/// POST /api/chat/clear - Empty the turn list and drop any selection.
async fn api_chat_clear(State(state): State<AppState>) -> StatusCode {
    state.chat.clear();
    StatusCode::NO_CONTENT
}

/// POST /api/chat/toggle - Flip the widget open or closed.
async fn api_chat_toggle(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "open": state.chat.toggle() }))
}

/// GET /api/chat - Full widget snapshot for rendering.
async fn api_chat_snapshot(State(state): State<AppState>) -> Json<WidgetSnapshot> {
    Json(state.chat.snapshot())
}
