//! Everything the dialer renders, in one place

use serde::{Deserialize, Serialize};

use super::device::{DeviceEvent, DeviceState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneState {
    pub device: DeviceState,
    /// Browser audio is unlocked; autoplay rules need one user gesture first
    pub audio_ready: bool,
    pub muted: bool,
    pub error: Option<String>,
    pub identity: Option<String>,
}

impl PhoneState {
    /// Feed one notification from the SDK bridge into the state.
    /// Events that make no sense in the current state are ignored.
    pub fn handle_sdk_event(&mut self, name: &str, peer: Option<&str>, message: Option<&str>) {
        match name {
            "ready" => self.audio_ready = true,
            "error" => self.error = Some(message.unwrap_or("Unknown device error").to_string()),
            _ => {
                if let Some(event) = DeviceEvent::from_sdk(name, peer) {
                    self.apply(event);
                }
            }
        }
    }

    pub fn apply(&mut self, event: DeviceEvent) {
        match self.device.apply(event) {
            Ok(next) => {
                if !next.in_call() {
                    self.muted = false;
                }
                if next == DeviceState::Registered && !self.device.is_registered() {
                    self.error = None;
                }
                self.device = next;
            }
            Err(e) => tracing::warn!("Ignoring device event: {}", e),
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn status_text(&self) -> String {
        match self.device.peer() {
            Some(peer) if self.device.in_call() => {
                format!("{}: {}", self.device.display_name(), peer)
            }
            _ => self.device.display_name().to_string(),
        }
    }
}
