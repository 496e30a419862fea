//! Server configuration
//!
//! All settings are read from the environment once at startup and passed
//! down as explicit values. Nothing below the entry point touches `std::env`.

use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Identity the browser device registers under when none is configured
pub const DEFAULT_CLIENT_IDENTITY: &str = "browser-client";

pub const DEFAULT_RING_TIMEOUT_SECS: u64 = 30;

/// `<Dial timeout>` values Twilio accepts
pub const RING_TIMEOUT_RANGE: RangeInclusive<u64> = 5..=600;

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Twilio rejects access tokens that live longer than a day
pub const TOKEN_TTL_RANGE: RangeInclusive<u64> = 1..=86400;

pub const DEFAULT_PORT: u16 = 3000;

/// Spoken when a call cannot be routed at all
pub const DEFAULT_APOLOGY: &str = "Sorry, we could not connect your call. Please try again later.";

/// Spoken when the browser client does not pick up
pub const DEFAULT_NO_ANSWER_APOLOGY: &str =
    "Sorry, no one is available to take your call right now. Please try again later.";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings the call router depends on
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// The Twilio number of this system, used for caller ID and inbound detection.
    /// Treated as an opaque string.
    pub self_number: String,

    /// The single software endpoint that inbound calls are bridged to
    pub client_identity: String,

    /// How long an inbound call rings the browser before giving up
    pub ring_timeout: Duration,

    /// `action` URL for the bridge; the provider posts the dial outcome here
    pub status_callback: Option<String>,

    pub apology: String,
    pub no_answer_apology: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            self_number: String::new(),
            client_identity: DEFAULT_CLIENT_IDENTITY.to_string(),
            ring_timeout: Duration::from_secs(DEFAULT_RING_TIMEOUT_SECS),
            status_callback: None,
            apology: DEFAULT_APOLOGY.to_string(),
            no_answer_apology: DEFAULT_NO_ANSWER_APOLOGY.to_string(),
        }
    }
}

/// Twilio account credentials used to mint device access tokens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub api_key_sid: String,
    pub api_key_secret: String,
    pub twiml_app_sid: String,
}

impl TwilioCredentials {
    /// Names of the environment variables that are still unset
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.account_sid.is_empty() {
            missing.push("TWILIO_ACCOUNT_SID");
        }
        if self.api_key_sid.is_empty() {
            missing.push("TWILIO_API_KEY_SID");
        }
        if self.api_key_secret.is_empty() {
            missing.push("TWILIO_API_KEY_SECRET");
        }
        if self.twiml_app_sid.is_empty() {
            missing.push("TWILIO_TWIML_APP_SID");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub voice: VoiceConfig,
    pub twilio: TwilioCredentials,
    pub token_ttl: Duration,
    pub maintenance_mode: bool,
    /// Directory with the built web frontend, served for non-API paths
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            voice: VoiceConfig::default(),
            twilio: TwilioCredentials::default(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            maintenance_mode: false,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let voice = VoiceConfig {
            self_number: non_empty("TWILIO_PHONE_NUMBER").unwrap_or_default(),
            client_identity: non_empty("SOFTPHONE_IDENTITY")
                .unwrap_or_else(|| DEFAULT_CLIENT_IDENTITY.to_string()),
            ring_timeout: Duration::from_secs(parse_in_range(
                &lookup,
                "RING_TIMEOUT_SECS",
                DEFAULT_RING_TIMEOUT_SECS,
                RING_TIMEOUT_RANGE,
            )?),
            status_callback: non_empty("VOICE_STATUS_CALLBACK_URL"),
            ..VoiceConfig::default()
        };

        let twilio = TwilioCredentials {
            account_sid: lookup("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            api_key_sid: lookup("TWILIO_API_KEY_SID").unwrap_or_default(),
            api_key_secret: lookup("TWILIO_API_KEY_SECRET").unwrap_or_default(),
            twiml_app_sid: lookup("TWILIO_TWIML_APP_SID").unwrap_or_default(),
        };

        let maintenance_mode = matches!(
            lookup("MAINTENANCE_MODE").as_deref().map(str::trim),
            Some("1") | Some("true")
        );

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            voice,
            twilio,
            token_ttl: Duration::from_secs(parse_in_range(
                &lookup,
                "TOKEN_TTL_SECS",
                DEFAULT_TOKEN_TTL_SECS,
                TOKEN_TTL_RANGE,
            )?),
            maintenance_mode,
            static_dir: non_empty("STATIC_DIR"),
        })
    }

    /// Log what is missing; the server still starts so the webhook can answer
    pub fn warn_missing(&self) {
        let missing = self.twilio.missing();
        if !missing.is_empty() {
            tracing::warn!(
                "Twilio credentials not configured ({}). Token issuance will fail.",
                missing.join(", ")
            );
        }
        if self.voice.self_number.is_empty() {
            tracing::warn!("TWILIO_PHONE_NUMBER not set. Outbound calls will have no caller ID.");
        }
        if self.voice.status_callback.is_none() {
            tracing::info!("VOICE_STATUS_CALLBACK_URL not set. Inbound bridges fall through to the apology.");
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(default),
    }
}

fn parse_in_range<F>(
    lookup: &F,
    key: &'static str,
    default: u64,
    range: RangeInclusive<u64>,
) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.voice.client_identity, "browser-client");
        assert_eq!(config.voice.ring_timeout, Duration::from_secs(30));
        assert_eq!(config.voice.self_number, "");
        assert!(config.voice.status_callback.is_none());
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert!(!config.maintenance_mode);
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_reads_all_values() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("TWILIO_PHONE_NUMBER", "+15551230000"),
            ("SOFTPHONE_IDENTITY", "desk-phone"),
            ("RING_TIMEOUT_SECS", "20"),
            ("VOICE_STATUS_CALLBACK_URL", "https://example.com/api/voice/status"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_API_KEY_SID", "SK123"),
            ("TWILIO_API_KEY_SECRET", "secret"),
            ("TWILIO_TWIML_APP_SID", "AP123"),
            ("TOKEN_TTL_SECS", "600"),
            ("STATIC_DIR", "dist"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.voice.self_number, "+15551230000");
        assert_eq!(config.voice.client_identity, "desk-phone");
        assert_eq!(config.voice.ring_timeout, Duration::from_secs(20));
        assert_eq!(
            config.voice.status_callback.as_deref(),
            Some("https://example.com/api/voice/status")
        );
        assert!(config.twilio.is_complete());
        assert_eq!(config.token_ttl, Duration::from_secs(600));
        assert_eq!(config.static_dir.as_deref(), Some("dist"));
    }

    #[test]
    fn test_maintenance_flag_values() {
        assert!(config_from(&[("MAINTENANCE_MODE", "1")]).unwrap().maintenance_mode);
        assert!(config_from(&[("MAINTENANCE_MODE", "true")]).unwrap().maintenance_mode);
        assert!(!config_from(&[("MAINTENANCE_MODE", "0")]).unwrap().maintenance_mode);
        assert!(!config_from(&[("MAINTENANCE_MODE", "yes")]).unwrap().maintenance_mode);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = config_from(&[("RING_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "RING_TIMEOUT_SECS",
                value: "soon".to_string()
            }
        );

        assert!(config_from(&[("PORT", "70000")]).is_err());
    }

    #[test]
    fn test_token_ttl_bounds() {
        assert_eq!(
            config_from(&[("TOKEN_TTL_SECS", "1")]).unwrap().token_ttl,
            Duration::from_secs(1)
        );
        assert_eq!(
            config_from(&[("TOKEN_TTL_SECS", "86400")]).unwrap().token_ttl,
            Duration::from_secs(86400)
        );
        assert_eq!(
            config_from(&[("TOKEN_TTL_SECS", "0")]).unwrap_err(),
            ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                value: "0".to_string()
            }
        );
        assert!(config_from(&[("TOKEN_TTL_SECS", "86401")]).is_err());
        assert!(config_from(&[("TOKEN_TTL_SECS", u64::MAX.to_string().as_str())]).is_err());
        assert!(config_from(&[("TOKEN_TTL_SECS", i64::MAX.to_string().as_str())]).is_err());
    }

    #[test]
    fn test_ring_timeout_bounds() {
        assert_eq!(
            config_from(&[("RING_TIMEOUT_SECS", "5")]).unwrap().voice.ring_timeout,
            Duration::from_secs(5)
        );
        assert_eq!(
            config_from(&[("RING_TIMEOUT_SECS", "600")]).unwrap().voice.ring_timeout,
            Duration::from_secs(600)
        );
        assert_eq!(
            config_from(&[("RING_TIMEOUT_SECS", "4")]).unwrap_err(),
            ConfigError::Invalid {
                key: "RING_TIMEOUT_SECS",
                value: "4".to_string()
            }
        );
        assert!(config_from(&[("RING_TIMEOUT_SECS", "601")]).is_err());
    }

    #[test]
    fn test_blank_identity_falls_back_to_default() {
        let config = config_from(&[("SOFTPHONE_IDENTITY", "  ")]).unwrap();
        assert_eq!(config.voice.client_identity, DEFAULT_CLIENT_IDENTITY);
    }

    #[test]
    fn test_missing_credentials_are_listed() {
        let config = config_from(&[("TWILIO_ACCOUNT_SID", "AC123")]).unwrap();
        assert_eq!(
            config.twilio.missing(),
            vec!["TWILIO_API_KEY_SID", "TWILIO_API_KEY_SECRET", "TWILIO_TWIML_APP_SID"]
        );
        assert!(!config.twilio.is_complete());
    }
}
