//! Call routing
//!
//! Decides how a single call leg is bridged. Pure and synchronous: the
//! decision depends only on the webhook fields and the [`VoiceConfig`] the
//! router was built with.

use super::twiml::{Dial, DialTarget, VoiceResponse};
use crate::server::config::VoiceConfig;

/// Prefix the provider puts in front of software endpoint identities
pub const CLIENT_PREFIX: &str = "client:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Inbound,
    Outbound,
    #[default]
    Unknown,
}

impl From<&str> for Direction {
    fn from(s: &str) -> Self {
        let s = s.trim().to_ascii_lowercase();
        if s == "inbound" {
            Direction::Inbound
        } else if s.starts_with("outbound") {
            // outbound-api, outbound-dial
            Direction::Outbound
        } else {
            Direction::Unknown
        }
    }
}

/// One voice webhook invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSignal {
    pub direction: Direction,
    pub to: String,
    pub from: String,
    /// Correlation id, only ever logged
    pub call_sid: String,
}

impl CallSignal {
    pub fn new(direction: Direction, to: &str, from: &str, call_sid: &str) -> Self {
        Self {
            direction,
            to: to.trim().to_string(),
            from: from.trim().to_string(),
            call_sid: call_sid.trim().to_string(),
        }
    }
}

/// Which branch of the routing policy fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRoute {
    /// Inbound call to our number, bridged to the browser client
    ToBrowser,
    /// Browser-to-browser call
    ToClient(String),
    /// Browser-to-PSTN call
    ToNumber(String),
    /// Nothing sensible to do: apologise and hang up
    Fallback,
}

/// Outcome the provider reports to the dial `action` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialStatus {
    Completed,
    Answered,
    Busy,
    NoAnswer,
    Failed,
    Canceled,
    Unknown(String),
}

impl From<&str> for DialStatus {
    fn from(s: &str) -> Self {
        match s.trim() {
            "completed" => DialStatus::Completed,
            "answered" => DialStatus::Answered,
            "busy" => DialStatus::Busy,
            "no-answer" => DialStatus::NoAnswer,
            "failed" => DialStatus::Failed,
            "canceled" => DialStatus::Canceled,
            other => DialStatus::Unknown(other.to_string()),
        }
    }
}

impl DialStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, DialStatus::Completed | DialStatus::Answered)
    }
}

#[derive(Debug, Clone)]
pub struct CallRouter {
    config: VoiceConfig,
}

impl CallRouter {
    pub fn new(config: VoiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    /// Pick the routing branch. First match wins.
    pub fn classify(&self, signal: &CallSignal) -> CallRoute {
        if self.is_inbound(signal) {
            return CallRoute::ToBrowser;
        }

        if signal.to.is_empty() {
            return CallRoute::Fallback;
        }

        match signal.to.strip_prefix(CLIENT_PREFIX) {
            Some("") => CallRoute::Fallback,
            Some(identity) => CallRoute::ToClient(identity.to_string()),
            None => CallRoute::ToNumber(signal.to.clone()),
        }
    }

    pub fn route(&self, signal: &CallSignal) -> VoiceResponse {
        self.respond(&self.classify(signal))
    }

    /// Build the instruction tree for a routing decision
    pub fn respond(&self, route: &CallRoute) -> VoiceResponse {
        match route {
            CallRoute::ToBrowser => {
                let dial = Dial::new(DialTarget::Client(self.config.client_identity.clone()))
                    .timeout(self.config.ring_timeout.as_secs())
                    .action(self.config.status_callback.clone());
                // Only reached when the provider has no action URL to follow
                VoiceResponse::new()
                    .dial(dial)
                    .say(self.config.no_answer_apology.as_str())
                    .hangup()
            }
            CallRoute::ToClient(identity) => VoiceResponse::new().dial(
                Dial::new(DialTarget::Client(identity.clone())).caller_id(self.caller_id()),
            ),
            CallRoute::ToNumber(number) => VoiceResponse::new().dial(
                Dial::new(DialTarget::Number(number.clone())).caller_id(self.caller_id()),
            ),
            CallRoute::Fallback => self.fallback(),
        }
    }

    /// Universal safety net: one apology, then hang up
    pub fn fallback(&self) -> VoiceResponse {
        VoiceResponse::new().say(self.config.apology.as_str()).hangup()
    }

    /// What the caller hears once a bridge to the browser has ended
    pub fn dial_outcome(&self, status: &DialStatus) -> VoiceResponse {
        if status.is_connected() {
            VoiceResponse::new().hangup()
        } else {
            VoiceResponse::new()
                .say(self.config.no_answer_apology.as_str())
                .hangup()
        }
    }

    fn is_inbound(&self, signal: &CallSignal) -> bool {
        if signal.direction == Direction::Inbound {
            return true;
        }
        let own = self.config.self_number.as_str();
        !own.is_empty() && signal.to == own && signal.from != own
    }

    fn caller_id(&self) -> Option<String> {
        Some(self.config.self_number.clone()).filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::voice::twiml::{render, Verb};
    use std::time::Duration;

    const SELF_NUMBER: &str = "+15551230000";

    fn router() -> CallRouter {
        CallRouter::new(VoiceConfig {
            self_number: SELF_NUMBER.to_string(),
            status_callback: Some("https://example.com/api/voice/status".to_string()),
            ..VoiceConfig::default()
        })
    }

    fn signal(direction: &str, to: &str, from: &str) -> CallSignal {
        CallSignal::new(Direction::from(direction), to, from, "CA123")
    }

    fn browser_bridge(router: &CallRouter) -> VoiceResponse {
        router.respond(&CallRoute::ToBrowser)
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(Direction::from("inbound"), Direction::Inbound);
        assert_eq!(Direction::from("INBOUND"), Direction::Inbound);
        assert_eq!(Direction::from("outbound-api"), Direction::Outbound);
        assert_eq!(Direction::from("outbound-dial"), Direction::Outbound);
        assert_eq!(Direction::from("outbound"), Direction::Outbound);
        assert_eq!(Direction::from(""), Direction::Unknown);
        assert_eq!(Direction::from("sideways"), Direction::Unknown);
    }

    #[test]
    fn test_inbound_always_bridges_to_browser() {
        let router = router();
        for (to, from) in [
            ("", ""),
            ("+15551112222", ""),
            ("client:someone", "+15559998888"),
            (SELF_NUMBER, SELF_NUMBER),
            ("garbage<>&", "\u{0}"),
        ] {
            let signal = signal("inbound", to, from);
            assert_eq!(router.classify(&signal), CallRoute::ToBrowser, "to={to:?} from={from:?}");
            assert_eq!(router.route(&signal), browser_bridge(&router));
        }
    }

    #[test]
    fn test_call_to_own_number_is_inbound() {
        let router = router();
        for direction in ["outbound-api", "", "unknown"] {
            let signal = signal(direction, SELF_NUMBER, "+15559998888");
            assert_eq!(router.classify(&signal), CallRoute::ToBrowser);
            assert_eq!(router.route(&signal), browser_bridge(&router));
        }
    }

    #[test]
    fn test_own_number_calling_itself_is_not_inbound() {
        let router = router();
        let signal = signal("outbound-api", SELF_NUMBER, SELF_NUMBER);
        assert_eq!(router.classify(&signal), CallRoute::ToNumber(SELF_NUMBER.to_string()));
    }

    #[test]
    fn test_empty_self_number_never_matches() {
        let router = CallRouter::new(VoiceConfig::default());
        let signal = signal("outbound", "", "+15559998888");
        assert_eq!(router.classify(&signal), CallRoute::Fallback);
    }

    #[test]
    fn test_client_prefix_is_stripped_once() {
        let router = router();
        assert_eq!(
            router.classify(&signal("outbound", "client:browser-client", "")),
            CallRoute::ToClient("browser-client".to_string())
        );
        assert_eq!(
            router.classify(&signal("outbound", "client:client:alice", "")),
            CallRoute::ToClient("client:alice".to_string())
        );
        assert_eq!(router.classify(&signal("outbound", "client:", "")), CallRoute::Fallback);
    }

    #[test]
    fn test_pstn_number_is_dialed_with_caller_id() {
        let router = router();
        let response = router.route(&signal("outbound", "+15551112222", ""));
        assert_eq!(
            response.verbs(),
            &[Verb::Dial(Dial {
                target: DialTarget::Number("+15551112222".to_string()),
                caller_id: Some(SELF_NUMBER.to_string()),
                timeout: None,
                action: None,
            })]
        );
    }

    #[test]
    fn test_caller_id_omitted_without_self_number() {
        let router = CallRouter::new(VoiceConfig::default());
        let response = router.route(&signal("outbound", "+15551112222", ""));
        match &response.verbs()[0] {
            Verb::Dial(dial) => assert!(dial.caller_id.is_none()),
            other => panic!("expected dial, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_destination_falls_back() {
        let router = router();
        for direction in ["outbound", "", "outbound-api"] {
            for to in ["", "   "] {
                let response = router.route(&signal(direction, to, ""));
                assert_eq!(response, router.fallback());
            }
        }
        assert_eq!(
            router.fallback().verbs(),
            &[Verb::Say(router.config().apology.clone()), Verb::Hangup]
        );
    }

    #[test]
    fn test_browser_bridge_shape() {
        let router = router();
        let response = router.route(&signal("inbound", "+15551230000", "+15559998888"));
        assert_eq!(
            response.verbs(),
            &[
                Verb::Dial(Dial {
                    target: DialTarget::Client("browser-client".to_string()),
                    caller_id: None,
                    timeout: Some(30),
                    action: Some("https://example.com/api/voice/status".to_string()),
                }),
                Verb::Say(router.config().no_answer_apology.clone()),
                Verb::Hangup,
            ]
        );
    }

    #[test]
    fn test_ring_timeout_comes_from_config() {
        let router = CallRouter::new(VoiceConfig {
            ring_timeout: Duration::from_secs(12),
            client_identity: "desk".to_string(),
            ..VoiceConfig::default()
        });
        let xml = render(&router.route(&signal("inbound", "", ""))).unwrap();
        assert!(xml.contains(r#"<Dial timeout="12">"#));
        assert!(xml.contains("<Client>desk</Client>"));
    }

    #[test]
    fn test_routing_is_deterministic() {
        let router = router();
        for (direction, to, from) in [
            ("inbound", "+15551230000", "+15559998888"),
            ("outbound", "client:browser-client", ""),
            ("outbound", "+15551112222", ""),
            ("outbound", "", ""),
        ] {
            let first = render(&router.route(&signal(direction, to, from))).unwrap();
            let second = render(&router.route(&signal(direction, to, from))).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_dial_outcome() {
        let router = router();
        assert_eq!(router.dial_outcome(&DialStatus::Completed).verbs(), &[Verb::Hangup]);
        assert_eq!(router.dial_outcome(&DialStatus::from("answered")).verbs(), &[Verb::Hangup]);

        for status in ["no-answer", "busy", "failed", "canceled", "", "weird"] {
            let response = router.dial_outcome(&DialStatus::from(status));
            assert_eq!(
                response.verbs(),
                &[Verb::Say(router.config().no_answer_apology.clone()), Verb::Hangup],
                "status={status:?}"
            );
        }
    }
}
