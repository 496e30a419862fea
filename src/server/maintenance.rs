//! Maintenance mode
//!
//! When `MAINTENANCE_MODE` is on, every route is short-circuited with a 503.
//! Each kind of caller gets a body it can consume: TwiML for the voice
//! webhooks, JSON for the API, an HTML page for browsers.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::models::ErrorResponse;
use crate::server::voice::{twiml, VoiceResponse, STATIC_FALLBACK_TWIML, TWIML_CONTENT_TYPE};
use crate::server::AppState;

pub const MAINTENANCE_MESSAGE: &str =
    "Sorry, our phone service is temporarily unavailable for maintenance. Please try again later.";

const STATIC_ASSET_EXTENSIONS: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

pub async fn gate(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if !state.config.maintenance_mode {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    if is_static_asset(&path) {
        return next.run(request).await;
    }

    if path == "/api/voice" || path.starts_with("/api/voice/") {
        tracing::info!("Maintenance mode: answering {} with TwiML", path);
        return voice_unavailable();
    }

    if path.starts_with("/api/") {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Service unavailable for maintenance")),
        )
            .into_response();
    }

    (StatusCode::SERVICE_UNAVAILABLE, Html(MAINTENANCE_PAGE)).into_response()
}

fn is_static_asset(path: &str) -> bool {
    path == "/favicon.ico"
        || path.starts_with("/assets/")
        || STATIC_ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn voice_unavailable() -> Response {
    let body = twiml::render(&VoiceResponse::new().say(MAINTENANCE_MESSAGE).hangup())
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build maintenance TwiML: {}", e);
            STATIC_FALLBACK_TWIML.to_string()
        });

    (
        StatusCode::SERVICE_UNAVAILABLE,
        [
            (header::CONTENT_TYPE, TWIML_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response()
}

const MAINTENANCE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Maintenance - Web Softphone</title>
    <style>
        body { font-family: sans-serif; background: #f9fafb; display: flex; align-items: center; justify-content: center; min-height: 100vh; margin: 0; }
        .card { max-width: 28rem; background: #fff; border-radius: 0.5rem; box-shadow: 0 10px 15px rgba(0,0,0,0.1); padding: 2rem; text-align: center; }
        .note { background: #eff6ff; color: #1e40af; border-radius: 0.5rem; padding: 1rem; font-size: 0.875rem; }
    </style>
</head>
<body>
    <div class="card">
        <h1>Service Temporarily Unavailable</h1>
        <p>We're performing scheduled maintenance on our phone service. We'll be back online shortly.</p>
        <p class="note">Expected to be back online within a few minutes. Thank you for your patience.</p>
    </div>
</body>
</html>"#;
