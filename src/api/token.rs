//! Access token for the Voice SDK device

use super::client::{api_client, ApiError};
use crate::models::TokenResponse;

/// Fetch a fresh device access token
pub async fn fetch_token() -> Result<TokenResponse, ApiError> {
    api_client()?.get::<TokenResponse>("/api/token").await
}
