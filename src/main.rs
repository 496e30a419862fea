//! Web Softphone
//!
//! A browser softphone backed by Twilio Voice. The native build is the Axum
//! server (TwiML webhooks, access tokens, maintenance gate, static hosting);
//! the wasm build is the Dioxus dialer that runs in the browser.

mod models;

#[cfg(target_arch = "wasm32")]
mod api;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
mod routes;
#[cfg(target_arch = "wasm32")]
mod state;

#[cfg(not(target_arch = "wasm32"))]
mod server;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("web_softphone=info")))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = server::config::ServerConfig::from_env()?;
    tracing::info!("Starting Web Softphone server on port {}", config.port);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(server::run_server(config))
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Same origin as the page, the server hosts both
    let api_url = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".to_string());
    api::init_api_client(&api_url);

    dioxus::launch(App);
}

#[cfg(target_arch = "wasm32")]
use dioxus::prelude::*;

#[cfg(target_arch = "wasm32")]
const TWILIO_VOICE_SDK: &str = "https://unpkg.com/@twilio/voice-sdk@2.11.0/dist/twilio.min.js";

#[cfg(target_arch = "wasm32")]
#[component]
fn App() -> Element {
    rsx! {
        document::Script { src: "https://cdn.tailwindcss.com" }
        document::Script { src: TWILIO_VOICE_SDK }
        document::Script { src: asset!("/assets/softphone.js") }

        Router::<routes::Route> {}
    }
}
