use dioxus::prelude::*;

use crate::components::{phone::Phone, MaintenancePage};

#[derive(Routable, Clone, PartialEq, Debug)]
#[rustfmt::skip]
pub enum Route {
    #[route("/")]
    Softphone {},

    #[route("/maintenance")]
    Maintenance {},
}

// Route handler components
#[component]
fn Softphone() -> Element {
    rsx! {
        div { class: "min-h-screen bg-gray-100 flex flex-col items-center justify-center p-4",
            h1 { class: "text-2xl font-bold text-gray-800 mb-6", "Web Softphone" }
            Phone {}
        }
    }
}

#[component]
fn Maintenance() -> Element {
    rsx! {
        MaintenancePage {}
    }
}
