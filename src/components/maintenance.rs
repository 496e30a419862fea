use dioxus::prelude::*;

#[component]
pub fn MaintenancePage() -> Element {
    rsx! {
        div { class: "min-h-screen bg-gray-50 flex items-center justify-center p-4",
            div { class: "max-w-md w-full bg-white rounded-lg shadow-lg p-8 text-center",
                div { class: "mx-auto mb-6 h-24 w-24 bg-yellow-100 rounded-full flex items-center justify-center",
                    span { class: "text-5xl", "\u{26A0}" }
                }

                h1 { class: "text-2xl font-bold text-gray-900 mb-2", "Service Temporarily Unavailable" }
                p { class: "text-gray-600 mb-6",
                    "We're performing scheduled maintenance on our phone service. We'll be back online shortly."
                }

                div { class: "bg-blue-50 rounded-lg p-4",
                    p { class: "text-sm text-blue-800",
                        "Expected to be back online within a few minutes. Thank you for your patience."
                    }
                }
            }
        }
    }
}
