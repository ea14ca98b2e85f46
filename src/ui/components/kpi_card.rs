use dioxus::prelude::*;

#[component]
pub fn KpiCard(
    title: String,
    value: String,
    description: Option<String>,
    #[props(default)] highlight: bool,
) -> Element {
    let class = if highlight {
        "kpi-card kpi-card--highlight"
    } else {
        "kpi-card"
    };
    rsx! {
        div { class,
            h3 { class: "kpi-title", "{title}" }
            p { class: "kpi-value", "{value}" }
            if let Some(desc) = description {
                p { class: "kpi-description", "{desc}" }
            }
        }
    }
}
