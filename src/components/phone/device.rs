//! Bindings for the Twilio Voice SDK bridge
//!
//! `assets/softphone.js` owns the SDK `Device` and the current `Call`. It
//! reports everything back through a `softphoneEvent` DOM event whose detail
//! is `{ event, from, message }`.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

/// DOM event the bridge dispatches on `window`
pub const SOFTPHONE_EVENT: &str = "softphoneEvent";

#[wasm_bindgen]
extern "C" {
    /// Create and register the device. Resolves to `true` once registration starts.
    #[wasm_bindgen(js_name = initSoftphone)]
    pub async fn init_softphone(token: &str) -> JsValue;

    #[wasm_bindgen(js_name = refreshSoftphoneToken)]
    pub fn refresh_softphone_token(token: &str) -> bool;

    /// Place a call; `to` is sent as the `To` parameter of the voice webhook
    #[wasm_bindgen(js_name = placeSoftphoneCall)]
    pub async fn place_softphone_call(to: &str) -> JsValue;

    #[wasm_bindgen(js_name = acceptSoftphoneCall)]
    pub fn accept_softphone_call() -> bool;

    #[wasm_bindgen(js_name = rejectSoftphoneCall)]
    pub fn reject_softphone_call() -> bool;

    #[wasm_bindgen(js_name = hangupSoftphoneCall)]
    pub fn hangup_softphone_call() -> bool;

    /// Returns the new mute state
    #[wasm_bindgen(js_name = setSoftphoneMuted)]
    pub fn set_softphone_muted(muted: bool) -> bool;

    #[wasm_bindgen(js_name = sendSoftphoneDigits)]
    pub fn send_softphone_digits(digits: &str) -> bool;

    #[wasm_bindgen(js_name = destroySoftphone)]
    pub fn destroy_softphone();
}
