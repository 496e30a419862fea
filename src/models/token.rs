use serde::{Deserialize, Serialize};

/// Access token handed to the browser device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub token: String,
    pub identity: String,
}

/// JSON error body for non-voice API routes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Which credentials the server has, without revealing them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigStatus {
    #[serde(rename = "hasAccountSid")]
    pub has_account_sid: bool,
    #[serde(rename = "hasApiKey")]
    pub has_api_key: bool,
    #[serde(rename = "hasApiSecret")]
    pub has_api_secret: bool,
    #[serde(rename = "hasTwimlApp")]
    pub has_twiml_app: bool,
    #[serde(rename = "hasPhoneNumber")]
    pub has_phone_number: bool,
    #[serde(rename = "accountSidPrefix")]
    pub account_sid_prefix: Option<String>,
    #[serde(rename = "apiKeyPrefix")]
    pub api_key_prefix: Option<String>,
    #[serde(rename = "twimlAppPrefix")]
    pub twiml_app_prefix: Option<String>,
}
