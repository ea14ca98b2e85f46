use dioxus::prelude::*;

/// One level of the department / province / district picker.
#[component]
pub fn LocationSelect(
    label: &'static str,
    value: Option<String>,
    options: Vec<String>,
    disabled: bool,
    onchange: EventHandler<String>,
) -> Element {
    let current = value.unwrap_or_default();
    rsx! {
        div {
            label { class: "field-label", "{label}" }
            select {
                class: "field-input",
                disabled,
                value: "{current}",
                onchange: move |evt| onchange.call(evt.value()),
                option { value: "", selected: current.is_empty(), "Select..." }
                for name in options {
                    option {
                        key: "{name}",
                        value: "{name}",
                        selected: name == current,
                        "{name}"
                    }
                }
            }
        }
    }
}
