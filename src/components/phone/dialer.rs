//! Browser softphone dialer
//!
//! Registers the Voice SDK device with a token from `/api/token`, then
//! drives it from the dialpad. Device and call progress come back as
//! `softphoneEvent`s and land in `PHONE_STATE`.

use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use js_sys::Reflect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use super::device::{
    accept_softphone_call, destroy_softphone, hangup_softphone_call, init_softphone,
    place_softphone_call, refresh_softphone_token, reject_softphone_call, send_softphone_digits,
    set_softphone_muted, SOFTPHONE_EVENT,
};
use crate::api::{fetch_token, ApiError};
use crate::models::{dial_target, display_number, sanitize_input, DeviceEvent, DeviceState, DIALPAD_KEYS};
use crate::routes::Route;
use crate::state::{
    apply_device_event, clear_phone_error, handle_sdk_event, set_identity, set_muted, set_phone_error,
    PHONE_STATE,
};

/// How long a finished call stays on screen
const CALL_ENDED_LINGER_MS: u32 = 2000;

/// Play DTMF tone for a digit
fn play_dtmf_tone(digit: &str) {
    use web_sys::{AudioContext, OscillatorType};

    let (low_freq, high_freq) = match digit {
        "1" => (697.0, 1209.0),
        "2" => (697.0, 1336.0),
        "3" => (697.0, 1477.0),
        "4" => (770.0, 1209.0),
        "5" => (770.0, 1336.0),
        "6" => (770.0, 1477.0),
        "7" => (852.0, 1209.0),
        "8" => (852.0, 1336.0),
        "9" => (852.0, 1477.0),
        "*" => (941.0, 1209.0),
        "0" => (941.0, 1336.0),
        "#" => (941.0, 1477.0),
        _ => return,
    };

    let Ok(ctx) = AudioContext::new() else {
        return;
    };
    let Ok(gain) = ctx.create_gain() else {
        return;
    };

    let duration = 0.15;
    let current_time = ctx.current_time();
    gain.gain().set_value(0.1);
    let _ = gain.connect_with_audio_node(&ctx.destination());

    for freq in [low_freq, high_freq] {
        if let Ok(osc) = ctx.create_oscillator() {
            osc.set_type(OscillatorType::Sine);
            osc.frequency().set_value(freq as f32);
            let _ = osc.connect_with_audio_node(&gain);
            let _ = osc.start();
            let _ = osc.stop_with_when(current_time + duration);
        }
    }
}

/// Fetch a token and hand it to the bridge
async fn register_device(navigator: Navigator) {
    match fetch_token().await {
        Ok(response) => {
            set_identity(response.identity);
            if !init_softphone(&response.token).await.is_truthy() {
                set_phone_error("Failed to initialize device");
            }
        }
        Err(ApiError::Unavailable) => {
            navigator.replace(Route::Maintenance {});
        }
        Err(e) => {
            tracing::error!("Failed to fetch token: {}", e);
            set_phone_error(format!("Failed to fetch token: {}", e));
        }
    }
}

async fn refresh_token() {
    match fetch_token().await {
        Ok(response) => {
            refresh_softphone_token(&response.token);
        }
        Err(e) => set_phone_error(format!("Failed to refresh token: {}", e)),
    }
}

fn detail_string(detail: &wasm_bindgen::JsValue, key: &str) -> Option<String> {
    Reflect::get(detail, &key.into()).ok().and_then(|v| v.as_string())
}

type SoftphoneListener = Closure<dyn FnMut(web_sys::CustomEvent)>;

fn listener_fn(listener: &SoftphoneListener) -> &js_sys::Function {
    listener.as_ref().unchecked_ref()
}

/// Handle one device or call notification from the bridge
fn on_softphone_event(event: web_sys::CustomEvent) {
    let detail = event.detail();
    if !detail.is_object() {
        return;
    }
    let Some(name) = detail_string(&detail, "event") else {
        return;
    };

    if name == "tokenWillExpire" {
        spawn_local(refresh_token());
        return;
    }

    let from = detail_string(&detail, "from");
    let message = detail_string(&detail, "message");
    handle_sdk_event(&name, from.as_deref(), message.as_deref());

    if matches!(PHONE_STATE.read().device, DeviceState::CallEnded { .. }) {
        spawn_local(async {
            TimeoutFuture::new(CALL_ENDED_LINGER_MS).await;
            if matches!(PHONE_STATE.read().device, DeviceState::CallEnded { .. }) {
                apply_device_event(DeviceEvent::Dismiss);
            }
        });
    }
}

#[component]
pub fn Phone() -> Element {
    let mut phone_number = use_signal(String::new);
    let navigator = use_navigator();
    let phone = PHONE_STATE.read();

    // Register on mount
    use_effect(move || {
        spawn(register_device(navigator));
    });

    // One listener per mounted dialer, removed again on unmount
    let listener = use_hook(|| {
        let callback: Rc<SoftphoneListener> = Rc::new(Closure::wrap(
            Box::new(on_softphone_event) as Box<dyn FnMut(web_sys::CustomEvent)>,
        ));
        if let Some(win) = web_sys::window() {
            let _ = win.add_event_listener_with_callback(SOFTPHONE_EVENT, listener_fn(&callback));
        }
        callback
    });

    use_drop(move || {
        if let Some(win) = web_sys::window() {
            let _ = win.remove_event_listener_with_callback(SOFTPHONE_EVENT, listener_fn(&listener));
        }
        destroy_softphone();
    });

    let mut append_digit = move |digit: &'static str| {
        play_dtmf_tone(digit);

        // In a call the keys go down the line instead
        if PHONE_STATE.read().device.is_active() {
            send_softphone_digits(digit);
        } else {
            phone_number.write().push_str(digit);
        }
    };

    let backspace = move |_| {
        phone_number.write().pop();
    };

    let make_call = move |_| {
        let Some(to) = dial_target(&phone_number()) else {
            set_phone_error("Please enter a phone number");
            return;
        };
        clear_phone_error();

        spawn(async move {
            if !place_softphone_call(&to).await.is_truthy() {
                set_phone_error("Failed to make call");
            }
        });
    };

    let hangup = move |_| {
        hangup_softphone_call();
    };

    let toggle_mute = move |_| {
        let muted = PHONE_STATE.read().muted;
        set_muted(set_softphone_muted(!muted));
    };

    let is_registered = phone.device.is_registered();
    let in_call = phone.device.in_call();
    let incoming = phone.device.is_incoming_pending();
    let peer = phone.device.peer().unwrap_or_default().to_string();
    let can_call = phone.device.can_dial() && dial_target(&phone_number()).is_some();
    let muted = phone.muted;
    let audio_ready = phone.audio_ready;
    let status = phone.status_text();
    let error = phone.error.clone();
    let identity = phone.identity.clone();
    let display = display_number(&phone_number());

    rsx! {
        div { class: "bg-white rounded-lg shadow-lg p-6 w-full max-w-sm",
            // Status indicators
            div { class: "flex items-center justify-between mb-4 text-sm",
                div { class: "flex items-center gap-2",
                    span {
                        class: if is_registered { "w-2 h-2 rounded-full bg-green-500" } else { "w-2 h-2 rounded-full bg-red-500" },
                    }
                    span { class: "text-gray-600", "{status}" }
                }
                if let Some(identity) = identity {
                    span { class: "text-gray-400 font-mono", "{identity}" }
                }
            }

            if !audio_ready {
                div { class: "bg-yellow-50 text-yellow-700 text-xs rounded px-3 py-2 mb-3",
                    "Click anywhere to enable audio"
                }
            }

            if let Some(err) = error {
                div { class: "bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded mb-3 flex justify-between",
                    span { "{err}" }
                    button {
                        class: "ml-2 text-red-500 hover:text-red-700",
                        onclick: move |_| clear_phone_error(),
                        "\u{2715}"
                    }
                }
            }

            // Incoming call
            if incoming {
                div { class: "bg-blue-50 rounded-lg p-4 mb-3 text-center",
                    p { class: "text-blue-700 font-medium animate-pulse", "Incoming call from:" }
                    p { class: "text-blue-900 font-mono mb-3", "{peer}" }
                    div { class: "flex justify-center gap-4",
                        button {
                            class: "bg-green-500 hover:bg-green-600 text-white rounded-full px-6 py-2 transition-colors",
                            onclick: move |_| {
                                accept_softphone_call();
                            },
                            "Accept"
                        }
                        button {
                            class: "bg-red-500 hover:bg-red-600 text-white rounded-full px-6 py-2 transition-colors",
                            onclick: move |_| {
                                reject_softphone_call();
                            },
                            "Reject"
                        }
                    }
                }
            }

            // Display
            div { class: "bg-gray-50 rounded-lg p-3 mb-3 text-center border",
                input {
                    class: "text-xl font-mono w-full text-center bg-transparent outline-none",
                    r#type: "tel",
                    value: "{display}",
                    placeholder: "Enter number",
                    oninput: move |e| phone_number.set(sanitize_input(&e.value())),
                    disabled: in_call,
                }
            }

            // Dialpad
            div { class: "grid grid-cols-3 gap-2 mb-4",
                for (digit, letters) in DIALPAD_KEYS {
                    DialButton { digit, letters, on_click: move |_| append_digit(digit) }
                }
            }

            // Action buttons
            div { class: "flex justify-center gap-3",
                if in_call {
                    button {
                        class: if muted { "bg-yellow-500 text-white rounded-full w-12 h-12 flex items-center justify-center" } else { "bg-blue-500 hover:bg-blue-600 text-white rounded-full w-12 h-12 flex items-center justify-center transition-colors" },
                        onclick: toggle_mute,
                        title: if muted { "Unmute" } else { "Mute" },
                        if muted { "\u{1F507}" } else { "\u{1F3A4}" }
                    }
                    button {
                        class: "bg-red-500 hover:bg-red-600 text-white rounded-full w-14 h-14 flex items-center justify-center transition-colors",
                        onclick: hangup,
                        title: "Hang Up",
                        "\u{260E}"
                    }
                } else {
                    button {
                        class: "bg-green-500 hover:bg-green-600 text-white rounded-full w-14 h-14 flex items-center justify-center transition-colors disabled:opacity-50",
                        disabled: !can_call,
                        onclick: make_call,
                        title: "Call",
                        span { class: "text-xl", "\u{1F4DE}" }
                    }
                    button {
                        class: "bg-gray-400 hover:bg-gray-500 text-white rounded-full w-12 h-12 flex items-center justify-center transition-colors text-sm",
                        onclick: backspace,
                        title: "Backspace",
                        "\u{232B}"
                    }
                }
            }
        }
    }
}

#[component]
fn DialButton(digit: &'static str, letters: &'static str, on_click: EventHandler<MouseEvent>) -> Element {
    rsx! {
        button {
            class: "bg-white hover:bg-gray-100 border rounded-lg w-full h-14 flex flex-col items-center justify-center transition-colors",
            onclick: move |e| on_click.call(e),
            span { class: "text-lg font-semibold", "{digit}" }
            if !letters.is_empty() {
                span { class: "text-xs text-gray-400 leading-none", "{letters}" }
            }
        }
    }
}
