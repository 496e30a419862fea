//! Server-side code for the web softphone
//!
//! - Twilio voice webhooks (TwiML call routing)
//! - Access token issuance for the browser device
//! - Maintenance gate in front of every route
//! - Static hosting of the built frontend

pub mod config;
pub mod maintenance;
pub mod token;
pub mod voice;

use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    middleware,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::models::ConfigStatus;
use config::ServerConfig;
use voice::CallRouter;

/// Application state shared across all routes
pub struct AppState {
    pub config: ServerConfig,
    pub router: CallRouter,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let router = CallRouter::new(config.voice.clone());
        Self { config, router }
    }
}

/// Create the Axum router with all API routes
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let mut app = Router::new()
        .merge(voice::routes())
        .route("/api/token", get(token::issue_token))
        .route("/api/config/status", get(config_status))
        .route("/api/health", get(health_check));

    if let Some(dir) = state.config.static_dir.as_deref() {
        let index = format!("{}/index.html", dir.trim_end_matches('/'));
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), maintenance::gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Health check
async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/config/status
///
/// Reports which settings are present. Only the first two characters of any
/// identifier are revealed, which is enough to tell `AC` from `SK` mix-ups.
async fn config_status(State(state): State<Arc<AppState>>) -> Json<ConfigStatus> {
    let twilio = &state.config.twilio;

    Json(ConfigStatus {
        has_account_sid: !twilio.account_sid.is_empty(),
        has_api_key: !twilio.api_key_sid.is_empty(),
        has_api_secret: !twilio.api_key_secret.is_empty(),
        has_twiml_app: !twilio.twiml_app_sid.is_empty(),
        has_phone_number: !state.config.voice.self_number.is_empty(),
        account_sid_prefix: prefix(&twilio.account_sid),
        api_key_prefix: prefix(&twilio.api_key_sid),
        twiml_app_prefix: prefix(&twilio.twiml_app_sid),
    })
}

fn prefix(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.chars().take(2).collect())
    }
}

/// Run the Axum server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    config.warn_missing();
    if config.maintenance_mode {
        tracing::warn!("Maintenance mode is ON. All routes answer 503.");
    }

    let port = config.port;
    let app = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::TwilioCredentials;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = get_body(create_router(AppState::new(ServerConfig::default())), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_config_status_reveals_only_prefixes() {
        let mut config = ServerConfig::default();
        config.twilio = TwilioCredentials {
            account_sid: "AC0123456789".to_string(),
            api_key_sid: "SK0123456789".to_string(),
            api_key_secret: "super-secret".to_string(),
            twiml_app_sid: String::new(),
        };

        let (status, body) = get_body(create_router(AppState::new(config)), "/api/config/status").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("super-secret"));
        assert!(!body.contains("0123456789"));

        let parsed: ConfigStatus = serde_json::from_str(&body).unwrap();
        assert!(parsed.has_account_sid);
        assert!(parsed.has_api_secret);
        assert!(!parsed.has_twiml_app);
        assert!(!parsed.has_phone_number);
        assert_eq!(parsed.account_sid_prefix.as_deref(), Some("AC"));
        assert_eq!(parsed.api_key_prefix.as_deref(), Some("SK"));
        assert_eq!(parsed.twiml_app_prefix, None);
    }

    #[tokio::test]
    async fn test_unknown_path_without_static_dir() {
        let (status, _) = get_body(create_router(AppState::new(ServerConfig::default())), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(prefix(""), None);
        assert_eq!(prefix("A"), Some("A".to_string()));
        assert_eq!(prefix("AC123"), Some("AC".to_string()));
    }
}
