//! UI serving routes

use axum::{
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::error::ApiError;

const INDEX_HTML: &str = include_str!("../ui/index.html");
const APP_JS: &str = include_str!("../ui/app.js");
const NOT_FOUND_HTML: &str = include_str!("../ui/404.html");

/// GET /
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}

/// Fallback for unmatched routes
///
/// API paths get the JSON error body, everything else the HTML 404 page.
pub async fn not_found(uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        return ApiError::NotFound(format!("No route for {}", uri.path())).into_response();
    }
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_HTML)).into_response()
}
