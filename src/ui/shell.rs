use dioxus::prelude::*;

use crate::app::Route;
use crate::util::version::APP_NAME;

#[component]
pub fn Shell(children: Element) -> Element {
    let current_route = use_route::<Route>();
    let nav = use_navigator();

    rsx! {
        div {
            header { class: "app-header",
                div {
                    h1 { class: "app-title", "{APP_NAME}" }
                    p { class: "app-tagline", "door-to-district rates, IGV included" }
                }
                nav { class: "app-nav",
                    NavButton {
                        active: matches!(current_route, Route::Quote {}),
                        onclick: move |_| { nav.push(Route::Quote {}); },
                        label: "📦 Quote",
                    }
                    NavButton {
                        active: matches!(current_route, Route::Settings {}),
                        onclick: move |_| { nav.push(Route::Settings {}); },
                        label: "⚙️ Settings",
                    }
                }
            }
            main { class: "app-main",
                {children}
            }
        }
    }
}

#[component]
fn NavButton(active: bool, onclick: EventHandler<()>, label: &'static str) -> Element {
    let class = if active {
        "nav-button nav-button--active"
    } else {
        "nav-button"
    };

    rsx! {
        button {
            class,
            onclick: move |_| onclick.call(()),
            "{label}"
        }
    }
}
