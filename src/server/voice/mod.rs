//! Twilio voice webhooks
//!
//! The provider is a machine consumer that only understands TwiML, so every
//! reply from these handlers is `text/xml`, including failures.

pub mod router;
pub mod twiml;

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    handler::Handler,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use serde::Deserialize;

pub use router::{CallRoute, CallRouter, CallSignal, DialStatus, Direction};
pub use twiml::{TwimlError, VoiceResponse, TWIML_CONTENT_TYPE};

use crate::server::AppState;

/// Served when even the fallback document cannot be rendered
pub const STATIC_FALLBACK_TWIML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "<Response><Say>Sorry, we could not connect your call. Please try again later.</Say><Hangup/></Response>"
);

/// Form fields of the voice webhook. Twilio posts many more; they are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "Direction", default)]
    pub direction: Option<String>,
    #[serde(rename = "CallSid", default)]
    pub call_sid: Option<String>,
}

impl From<VoiceWebhook> for CallSignal {
    fn from(webhook: VoiceWebhook) -> Self {
        CallSignal::new(
            Direction::from(webhook.direction.as_deref().unwrap_or_default()),
            webhook.to.as_deref().unwrap_or_default(),
            webhook.from.as_deref().unwrap_or_default(),
            webhook.call_sid.as_deref().unwrap_or_default(),
        )
    }
}

/// Form fields posted to the dial `action` URL
#[derive(Debug, Default, Deserialize)]
pub struct DialStatusWebhook {
    #[serde(rename = "DialCallStatus", default)]
    pub dial_call_status: Option<String>,
    #[serde(rename = "CallSid", default)]
    pub call_sid: Option<String>,
}

/// A TwiML document with its HTTP status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwimlReply {
    pub status: StatusCode,
    pub body: String,
}

impl TwimlReply {
    pub fn ok(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Degraded but valid reply for a failed construction
    pub fn failure(router: &CallRouter) -> Self {
        let body = twiml::render(&router.fallback())
            .unwrap_or_else(|_| STATIC_FALLBACK_TWIML.to_string());
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body,
        }
    }
}

impl IntoResponse for TwimlReply {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
            self.body,
        )
            .into_response()
    }
}

/// Render a response, downgrading to the fallback document on any error
pub fn reply_with<F>(
    router: &CallRouter,
    call_sid: &str,
    response: &VoiceResponse,
    render: F,
) -> TwimlReply
where
    F: FnOnce(&VoiceResponse) -> Result<String, TwimlError>,
{
    match render(response) {
        Ok(body) => TwimlReply::ok(body),
        Err(e) => {
            tracing::error!("Failed to build TwiML for call {}: {}", call_sid, e);
            TwimlReply::failure(router)
        }
    }
}

/// Route a call and render the result
pub fn answer_call<F>(router: &CallRouter, signal: &CallSignal, render: F) -> TwimlReply
where
    F: FnOnce(&VoiceResponse) -> Result<String, TwimlError>,
{
    let route = router.classify(signal);
    tracing::info!(
        "Voice webhook {}: to={:?} from={:?} direction={:?} -> {:?}",
        signal.call_sid,
        signal.to,
        signal.from,
        signal.direction,
        route
    );

    reply_with(router, &signal.call_sid, &router.respond(&route), render)
}

/// The voice webhook routes. A panic while answering the provider still
/// produces TwiML.
pub fn routes() -> Router<Arc<AppState>> {
    routes_with(handle_voice)
}

/// Voice routes with `voice` answering `POST /api/voice`
pub fn routes_with<H, T>(voice: H) -> Router<Arc<AppState>>
where
    H: Handler<T, Arc<AppState>>,
    T: 'static,
{
    Router::new()
        .route("/api/voice", post(voice))
        .route("/api/voice/status", post(handle_dial_status))
        .layer(CatchPanicLayer::custom(panic_reply))
}

/// POST /api/voice
pub async fn handle_voice(
    State(state): State<Arc<AppState>>,
    form: Result<Form<VoiceWebhook>, FormRejection>,
) -> TwimlReply {
    let webhook = match form {
        Ok(Form(webhook)) => webhook,
        Err(e) => {
            // Still answer with TwiML; an empty signal routes to the fallback
            tracing::warn!("Undecodable voice webhook body: {}", e);
            VoiceWebhook::default()
        }
    };

    answer_call(&state.router, &CallSignal::from(webhook), twiml::render)
}

/// POST /api/voice/status
pub async fn handle_dial_status(
    State(state): State<Arc<AppState>>,
    form: Result<Form<DialStatusWebhook>, FormRejection>,
) -> TwimlReply {
    let webhook = form.map(|Form(w)| w).unwrap_or_else(|e| {
        tracing::warn!("Undecodable dial status body: {}", e);
        DialStatusWebhook::default()
    });

    let call_sid = webhook.call_sid.unwrap_or_default();
    let status = DialStatus::from(webhook.dial_call_status.as_deref().unwrap_or_default());
    tracing::info!("Dial finished for call {}: {:?}", call_sid, status);

    let response = state.router.dial_outcome(&status);
    reply_with(&state.router, &call_sid, &response, twiml::render)
}

/// Panic handler for the voice routes: the provider still gets TwiML
pub fn panic_reply(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Voice webhook panicked: {}", detail);

    TwimlReply {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: STATIC_FALLBACK_TWIML.to_string(),
    }
    .into_response()
}
