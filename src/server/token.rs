//! Access tokens for the browser device
//!
//! The Voice SDK registers with a short-lived JWT signed with an API key
//! secret. The grant lets the device place calls through the TwiML app and
//! receive calls addressed to its identity.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ErrorResponse, TokenResponse};
use crate::server::config::TwilioCredentials;
use crate::server::AppState;

/// Content type Twilio requires in the JWT header
pub const TWILIO_TOKEN_CONTENT_TYPE: &str = "twilio-fpa;v=1";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
    #[error("Token lifetime of {0:?} cannot be represented")]
    Lifetime(Duration),
    #[error("Signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessTokenClaims {
    pub jti: String,
    pub iss: String, // api key sid
    pub sub: String, // account sid
    pub exp: i64,
    pub grants: Grants,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Grants {
    pub identity: String,
    pub voice: VoiceGrant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VoiceGrant {
    pub outgoing: OutgoingGrant,
    pub incoming: IncomingGrant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutgoingGrant {
    pub application_sid: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IncomingGrant {
    pub allow: bool,
}

impl AccessTokenClaims {
    pub fn new(
        credentials: &TwilioCredentials,
        identity: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, TokenError> {
        let issued_at = now.timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| issued_at.checked_add(secs))
            .ok_or(TokenError::Lifetime(ttl))?;

        Ok(Self {
            jti: format!("{}-{}", credentials.api_key_sid, issued_at),
            iss: credentials.api_key_sid.clone(),
            sub: credentials.account_sid.clone(),
            exp,
            grants: Grants {
                identity: identity.to_string(),
                voice: VoiceGrant {
                    outgoing: OutgoingGrant {
                        application_sid: credentials.twiml_app_sid.clone(),
                    },
                    incoming: IncomingGrant { allow: true },
                },
            },
        })
    }
}

/// Create a signed access token for `identity`
pub fn create_token(
    credentials: &TwilioCredentials,
    identity: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let missing = credentials.missing();
    if !missing.is_empty() {
        return Err(TokenError::MissingCredentials(missing.join(", ")));
    }

    let mut header = Header::new(Algorithm::HS256);
    header.cty = Some(TWILIO_TOKEN_CONTENT_TYPE.to_string());

    let claims = AccessTokenClaims::new(credentials, identity, ttl, now)?;
    Ok(encode(
        &header,
        &claims,
        &EncodingKey::from_secret(credentials.api_key_secret.as_bytes()),
    )?)
}

/// GET /api/token
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let identity = state.router.config().client_identity.clone();

    let token = create_token(&state.config.twilio, &identity, state.config.token_ttl, Utc::now())
        .map_err(|e| {
            tracing::error!("Error generating token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to generate token")),
            )
        })?;

    tracing::info!("Issued access token for {}", identity);
    Ok(Json(TokenResponse { token, identity }))
}
