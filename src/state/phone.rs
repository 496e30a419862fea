//! Phone state management

use dioxus::prelude::*;

use crate::models::{DeviceEvent, PhoneState};

/// Global phone state
pub static PHONE_STATE: GlobalSignal<PhoneState> = Signal::global(PhoneState::default);

pub fn handle_sdk_event(name: &str, peer: Option<&str>, message: Option<&str>) {
    tracing::info!("Softphone event: {}", name);
    PHONE_STATE.write().handle_sdk_event(name, peer, message);
}

pub fn apply_device_event(event: DeviceEvent) {
    PHONE_STATE.write().apply(event);
}

pub fn set_phone_error(message: impl Into<String>) {
    PHONE_STATE.write().set_error(message);
}

pub fn clear_phone_error() {
    PHONE_STATE.write().clear_error();
}

pub fn set_identity(identity: String) {
    PHONE_STATE.write().identity = Some(identity);
}

pub fn set_muted(muted: bool) {
    PHONE_STATE.write().muted = muted;
}
