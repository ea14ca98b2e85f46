use std::env;

use dioxus::{prelude::*, signals::Signal};
use tracing::{error, info, warn};

use crate::{
    domain::{AppState, RatesStatus},
    infra::rate_source::{CacheStatus, RateLocation, RateSourceClient, RATE_SOURCE_ENV},
    ui::{
        components::toast::{push_toast, Toast, ToastKind, ToastMessage},
        pages::{QuotePage, SettingsPage},
        shell::Shell,
    },
    util::{
        assets,
        persistence::{load_persisted_state, save_persisted_state},
    },
};

#[derive(Routable, Clone, PartialEq)]
pub enum Route {
    #[route("/")]
    Quote {},
    #[route("/settings")]
    Settings {},
}

#[component]
pub fn App() -> Element {
    let state = use_signal(AppState::default);
    use_hook({
        let mut state = state.clone();
        move || {
            if let Some(saved) = load_persisted_state() {
                state.with_mut(|st| st.apply_persisted(saved));
            }
            if let Ok(source) = env::var(RATE_SOURCE_ENV) {
                if !source.trim().is_empty() {
                    info!(source = %source, "rate source overridden from {RATE_SOURCE_ENV}");
                    state.with_mut(|st| st.settings.rate_source = source.trim().to_string());
                }
            }
        }
    });
    use_context_provider(|| state.clone());

    let toasts = use_signal(Vec::<ToastMessage>::new);
    use_context_provider(|| toasts.clone());

    // Pending rate load; the flag forces a refresh past the snapshot.
    let rates_request = use_signal(|| Some(false));
    use_context_provider(|| rates_request.clone());

    let _rates = use_resource({
        let state = state.clone();
        let toasts = toasts.clone();
        let rates_request = rates_request.clone();
        move || async move { load_rates(state.clone(), toasts.clone(), rates_request.clone()).await }
    });

    rsx! {
        document::Style { "{assets::main_css()}" }
        Router::<Route> {}
        Toast {}
    }
}

pub fn persist_user_state(state: &Signal<AppState>) {
    let snapshot = state.with(|st| st.to_persisted());
    if let Err(err) = save_persisted_state(&snapshot) {
        error!(error = %err, "failed to persist user state");
    }
}

/// Queues a rate load; ignored while one is already pending.
pub fn request_rates_reload(mut rates_request: Signal<Option<bool>>, force_refresh: bool) {
    if rates_request.peek().is_none() {
        rates_request.set(Some(force_refresh));
    }
}

async fn load_rates(
    mut state: Signal<AppState>,
    toasts: Signal<Vec<ToastMessage>>,
    mut rates_request: Signal<Option<bool>>,
) -> Option<CacheStatus> {
    let force_refresh = rates_request()?;
    let source = state.peek().settings.rate_source.clone();

    let client = match RateLocation::parse(&source).and_then(RateSourceClient::new) {
        Ok(client) => client,
        Err(err) => {
            rates_request.set(None);
            error!(source = %source, error = %err, "cannot build rate source client");
            push_toast(toasts, ToastKind::Error, format!("Invalid rate source: {err}"));
            return None;
        }
    };

    info!(location = %client.location(), force_refresh, "loading rates");
    let result = client.load(force_refresh).await;
    rates_request.set(None);

    match result {
        Ok(loaded) => {
            let dropped = loaded.table.diagnostics().len();
            let records = loaded.table.len();
            let empty = loaded.table.is_empty();
            let status = loaded.status.clone();
            state.with_mut(|st| {
                st.install_rates(
                    loaded.table,
                    RatesStatus {
                        origin: loaded.origin,
                        fetched_at: loaded.fetched_at,
                        from_snapshot: status != CacheStatus::Fresh,
                        stale: status == CacheStatus::Stale,
                    },
                )
            });

            match status {
                CacheStatus::Stale => push_toast(
                    toasts,
                    ToastKind::Warning,
                    "Rate source unavailable; showing the last saved rates.",
                ),
                CacheStatus::Cached => {
                    info!(records, "rates served from local snapshot");
                }
                CacheStatus::Fresh => {
                    push_toast(toasts, ToastKind::Success, format!("Loaded {records} destinations."))
                }
            }
            if empty {
                warn!(source = %source, "rate table is empty");
                push_toast(
                    toasts,
                    ToastKind::Error,
                    "The rate sheet has no usable rows; no destination can be quoted.",
                );
            }
            if dropped > 0 {
                warn!(dropped, "rate rows were dropped while loading");
                push_toast(
                    toasts,
                    ToastKind::Warning,
                    format!("{dropped} rate rows were skipped. See Settings for details."),
                );
            }
            Some(status)
        }
        Err(err) => {
            error!(source = %source, error = %err, "failed to load rates");
            push_toast(toasts, ToastKind::Error, format!("Failed to load rates: {err}"));
            None
        }
    }
}

#[component]
pub fn Quote() -> Element {
    rsx! { Shell { QuotePage {} } }
}

#[component]
pub fn Settings() -> Element {
    rsx! { Shell { SettingsPage {} } }
}
