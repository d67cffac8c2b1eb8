//! Login, logout and the session guard for protected routes
//!
//! Sessions live server-side in the `sessions` table; the browser only holds
//! the token cookie. The guard resolves that token to an active user and
//! stores it as a [`CurrentUser`] request extension.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use stats_common::auth::verify_password;
use stats_common::db::models::User;
use tracing::{debug, info, warn};

use crate::db::{sessions, users};
use crate::error::{ApiError, ApiResult};
use crate::session::{expired_session_cookie, resolve_token_user, session_cookie, session_token};
use crate::AppState;

const LOGIN_REQUIRED: &str = "Login required";
const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Authenticated user attached to protected requests
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/login
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Response> {
    let credentials = users::find_credentials(&state.db, req.username.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(&credentials.password_salt, &credentials.password_hash, &req.password) {
        warn!("Failed login for '{}'", credentials.user.username);
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    if !credentials.user.active {
        warn!("Login refused for inactive user '{}'", credentials.user.username);
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let purged = sessions::purge_expired_sessions(&state.db).await?;
    if purged > 0 {
        debug!("Purged {} expired session(s)", purged);
    }

    let token = sessions::create_session(&state.db, credentials.user.id).await?;
    info!("User '{}' logged in", credentials.user.username);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(credentials.user),
    )
        .into_response())
}

/// POST /api/logout
///
/// Always succeeds; an unknown or missing session is simply cleared.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = session_token(&headers) {
        sessions::delete_session(&state.db, &token).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_session_cookie())],
    )
        .into_response())
}

/// GET /api/me
pub async fn current_user(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

/// Session guard middleware
///
/// Rejects with 401 unless the session cookie resolves to an active user.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized(LOGIN_REQUIRED.to_string()))?;

    let user = resolve_token_user(&state.db, &token)
        .await
        .ok_or_else(|| ApiError::Unauthorized(LOGIN_REQUIRED.to_string()))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
}
