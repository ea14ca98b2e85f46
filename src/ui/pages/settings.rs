use std::time::SystemTime;

use dioxus::prelude::*;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    app::{persist_user_state, request_rates_reload},
    domain::{AppState, RateRecord, RoundingPolicy, DEFAULT_RATE_SOURCE},
    infra::rate_source::RateLocation,
    ui::{
        components::toast::{push_toast, ToastKind, ToastMessage},
        pages::quote::soles,
    },
    util::version::version_label,
};

const MAX_LISTED_DIAGNOSTICS: usize = 20;

#[component]
pub fn SettingsPage() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let rates_request = use_context::<Signal<Option<bool>>>();

    let initial_source = state.with(|st| st.settings.rate_source.clone());
    let mut source_input = use_signal(|| initial_source);

    let rounding = state.with(|st| st.settings.rounding);
    let loading = rates_request().is_some();

    let status_rows = state.with(|st| {
        let (Some(table), Some(status)) = (st.rates.as_ref(), st.rates_status.as_ref()) else {
            return Vec::new();
        };
        let mut rows = vec![
            ("Source", status.origin.clone()),
            ("Destinations", table.len().to_string()),
            ("First-kilo prices", price_range(table.records())),
            ("Dropped rows", table.diagnostics().len().to_string()),
            ("Fetched", fetched_label(status.fetched_at)),
        ];
        if status.stale {
            rows.push(("Status", "Offline copy, source unreachable".to_string()));
        } else if status.from_snapshot {
            rows.push(("Status", "Local copy".to_string()));
        }
        rows
    });
    let stale = state.with(|st| st.rates_status.as_ref().is_some_and(|status| status.stale));

    let (diagnostics, hidden_diagnostics) = state.with(|st| {
        let Some(table) = st.rates.as_ref() else {
            return (Vec::new(), 0);
        };
        let all = table.diagnostics();
        let listed = all
            .iter()
            .take(MAX_LISTED_DIAGNOSTICS)
            .map(|diag| format!("Row {}: {}", diag.row + 1, diag.issue))
            .collect::<Vec<_>>();
        (listed, all.len().saturating_sub(MAX_LISTED_DIAGNOSTICS))
    });

    let on_apply_source = {
        let mut state = state.clone();
        let toasts = toasts.clone();
        let rates_request = rates_request.clone();
        move |_| {
            let raw = source_input();
            if let Err(err) = RateLocation::parse(&raw) {
                push_toast(toasts.clone(), ToastKind::Error, format!("Rate source rejected: {err}"));
                return;
            }
            state.with_mut(|st| st.settings.rate_source = raw.trim().to_string());
            persist_user_state(&state);
            request_rates_reload(rates_request.clone(), true);
            push_toast(toasts.clone(), ToastKind::Info, "Loading rates from the new source...");
        }
    };

    let on_reset_source = move |_| source_input.set(DEFAULT_RATE_SOURCE.to_string());

    let on_reload = {
        let toasts = toasts.clone();
        let rates_request = rates_request.clone();
        move |_| {
            request_rates_reload(rates_request.clone(), true);
            push_toast(toasts.clone(), ToastKind::Info, "Reloading rates...");
        }
    };

    rsx! {
        div {
            section { class: "quote-panel",
                h2 { class: "panel-heading", "Weight Rounding" }
                p { class: "panel-note", "Applies to the greater of physical and volumetric weight." }
                div { class: "button-row",
                    for policy in [RoundingPolicy::HalfKg, RoundingPolicy::Exact] {
                        button {
                            key: "{policy.label()}",
                            class: if policy == rounding { "button" } else { "button button--ghost" },
                            onclick: move |_| {
                                state.with_mut(|st| st.settings.rounding = policy);
                                persist_user_state(&state);
                                push_toast(
                                    toasts,
                                    ToastKind::Success,
                                    format!("Weight rounding set to {}.", policy.label().to_lowercase()),
                                );
                            },
                            "{policy.label()}"
                        }
                    }
                }
            }

            section { class: "quote-panel",
                h2 { class: "panel-heading", "Rate Source" }
                p { class: "panel-note", "Endpoint URL or path to a JSON export of the rate sheet." }
                input {
                    class: "field-input",
                    value: source_input(),
                    oninput: move |evt| source_input.set(evt.value()),
                    placeholder: DEFAULT_RATE_SOURCE,
                }
                div { class: "button-row",
                    button { class: "button", disabled: loading, onclick: on_apply_source, "Apply & Reload" }
                    button { class: "button button--ghost", onclick: on_reset_source, "Default" }
                    button { class: "button button--ghost", disabled: loading, onclick: on_reload, "Reload Rates" }
                }
            }

            section { class: "quote-panel",
                h2 { class: "panel-heading", "Rates Status" }
                if loading {
                    p { class: "loading", "Loading rates..." }
                }
                if status_rows.is_empty() {
                    p { class: "panel-note", "No rates loaded yet." }
                } else {
                    ul { class: if stale { "status-list status-stale" } else { "status-list" },
                        for (label, value) in status_rows {
                            li { key: "{label}",
                                span { "{label}" }
                                span { "{value}" }
                            }
                        }
                    }
                }
                if !diagnostics.is_empty() {
                    h3 { class: "panel-heading", "Dropped rows" }
                    ul {
                        for line in diagnostics {
                            li { class: "diagnostic", "{line}" }
                        }
                    }
                    if hidden_diagnostics > 0 {
                        p { class: "panel-note", "...and {hidden_diagnostics} more." }
                    }
                }
            }

            p { class: "panel-note", "Version {version_label()}" }
        }
    }
}

fn price_range(records: &[RateRecord]) -> String {
    let mut prices = records.iter().map(|record| record.base_unit_price);
    let Some(first) = prices.next() else {
        return "n/a".to_string();
    };
    let (low, high) = prices.fold((first, first), |(low, high), price| {
        (low.min(price), high.max(price))
    });
    format!("{} to {}", soles(low), soles(high))
}

fn fetched_label(at: SystemTime) -> String {
    match OffsetDateTime::from(at).format(&Rfc3339) {
        Ok(stamp) => format!("{} ({stamp})", humanize_age(at)),
        Err(_) => humanize_age(at),
    }
}

pub fn humanize_age(updated_at: SystemTime) -> String {
    let age = SystemTime::now()
        .duration_since(updated_at)
        .unwrap_or_default()
        .as_secs();
    if age < 60 {
        format!("{age}s ago")
    } else if age < 3_600 {
        format!("{}m ago", age / 60)
    } else if age < 86_400 {
        format!("{}h ago", age / 3_600)
    } else {
        format!("{}d ago", age / 86_400)
    }
}
