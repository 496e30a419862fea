//! Softphone device state
//!
//! The Voice SDK reports registration and call progress through callbacks.
//! Those notifications are folded into one explicit state machine so the UI
//! never has to reconcile a handful of independent flags.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceState {
    #[default]
    Unregistered,
    Registering,
    Registered,
    /// Ringing, in either direction
    CallPending { peer: String, direction: CallDirection },
    CallActive { peer: String, direction: CallDirection },
    CallEnded { peer: String },
}

/// Notifications from the SDK bridge, plus the UI's own call actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEvent {
    Registering,
    Registered,
    Unregistered,
    Incoming { from: String },
    Dialing { to: String },
    Accepted,
    Disconnected,
    Cancelled,
    Rejected,
    /// Clear a finished call off the screen
    Dismiss,
}

impl DeviceEvent {
    /// Map an SDK event name onto a state machine event.
    /// Names with no state meaning (`error`, `tokenWillExpire`, ...) map to `None`.
    pub fn from_sdk(name: &str, peer: Option<&str>) -> Option<Self> {
        let peer = peer.unwrap_or("Unknown").to_string();
        match name {
            "registering" => Some(DeviceEvent::Registering),
            "registered" => Some(DeviceEvent::Registered),
            "unregistered" => Some(DeviceEvent::Unregistered),
            "incoming" => Some(DeviceEvent::Incoming { from: peer }),
            "connecting" => Some(DeviceEvent::Dialing { to: peer }),
            "accept" => Some(DeviceEvent::Accepted),
            "disconnect" => Some(DeviceEvent::Disconnected),
            "cancel" => Some(DeviceEvent::Cancelled),
            "reject" => Some(DeviceEvent::Rejected),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot apply {event:?} while {state:?}")]
pub struct InvalidTransition {
    pub state: DeviceState,
    pub event: DeviceEvent,
}

impl DeviceState {
    pub fn apply(&self, event: DeviceEvent) -> Result<DeviceState, InvalidTransition> {
        use DeviceState::*;

        let next = match (self, &event) {
            (_, DeviceEvent::Unregistered) => Unregistered,

            (Unregistered | Registering, DeviceEvent::Registering) => Registering,
            // The SDK re-registers periodically, even mid-call
            (Unregistered | Registering | Registered, DeviceEvent::Registered) => Registered,
            (CallPending { .. } | CallActive { .. } | CallEnded { .. }, DeviceEvent::Registered) => {
                self.clone()
            }

            (Registered | CallEnded { .. }, DeviceEvent::Incoming { from }) => CallPending {
                peer: from.clone(),
                direction: CallDirection::Incoming,
            },
            (Registered | CallEnded { .. }, DeviceEvent::Dialing { to }) => CallPending {
                peer: to.clone(),
                direction: CallDirection::Outgoing,
            },

            (CallPending { peer, direction }, DeviceEvent::Accepted) => CallActive {
                peer: peer.clone(),
                direction: *direction,
            },

            (
                CallPending { peer, .. } | CallActive { peer, .. },
                DeviceEvent::Disconnected | DeviceEvent::Cancelled | DeviceEvent::Rejected,
            ) => CallEnded { peer: peer.clone() },

            (CallEnded { .. }, DeviceEvent::Dismiss) => Registered,

            _ => {
                return Err(InvalidTransition {
                    state: self.clone(),
                    event: event.clone(),
                })
            }
        };

        Ok(next)
    }

    pub fn is_registered(&self) -> bool {
        !matches!(self, DeviceState::Unregistered | DeviceState::Registering)
    }

    /// A call exists that can be hung up
    pub fn in_call(&self) -> bool {
        matches!(self, DeviceState::CallPending { .. } | DeviceState::CallActive { .. })
    }

    /// Ringing here, waiting for accept or reject
    pub fn is_incoming_pending(&self) -> bool {
        matches!(
            self,
            DeviceState::CallPending {
                direction: CallDirection::Incoming,
                ..
            }
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DeviceState::CallActive { .. })
    }

    /// Ready to start a new call
    pub fn can_dial(&self) -> bool {
        matches!(self, DeviceState::Registered | DeviceState::CallEnded { .. })
    }

    pub fn peer(&self) -> Option<&str> {
        match self {
            DeviceState::CallPending { peer, .. }
            | DeviceState::CallActive { peer, .. }
            | DeviceState::CallEnded { peer } => Some(peer),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            DeviceState::Unregistered => "Not Registered",
            DeviceState::Registering => "Registering...",
            DeviceState::Registered => "Registered",
            DeviceState::CallPending {
                direction: CallDirection::Incoming,
                ..
            } => "Incoming call",
            DeviceState::CallPending {
                direction: CallDirection::Outgoing,
                ..
            } => "Ringing...",
            DeviceState::CallActive { .. } => "Connected",
            DeviceState::CallEnded { .. } => "Call Ended",
        }
    }
}
