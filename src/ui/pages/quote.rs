use dioxus::prelude::*;

use crate::{
    app::persist_user_state,
    domain::{
        chargeable_weight, insurance_cost, shipping_cost, volumetric_weight, AppState, QuoteInput,
        QuoteResult, RateRecord, RoundingPolicy,
    },
    ui::components::{kpi_card::KpiCard, location_select::LocationSelect},
};

#[component]
pub fn QuotePage() -> Element {
    let mut state = use_context::<Signal<AppState>>();

    let (rates, selection, form) =
        state.with(|st| (st.rates.clone(), st.selection.clone(), st.form.clone()));

    let Some(table) = rates else {
        return rsx! {
            div { class: "loading", "Loading rates..." }
        };
    };

    let regions = selection.region_options(&table);
    let sub_regions = selection.sub_region_options(&table);
    let localities = selection.locality_options(&table);
    let record = selection.resolve(&table).cloned();
    let quote = state.with(|st| st.quote());
    let rounding = state.with(|st| st.engine().policy());

    let input = form.to_input();
    let hint = pending_hint(selection.is_complete(), record.as_ref(), input.is_some());
    let package_line = input.as_ref().map(|input| package_note(input, rounding));
    let rate_line = record.as_ref().map(rate_preview);

    rsx! {
        div {
            section { class: "quote-panel",
                h2 { class: "panel-heading", "Destination" }
                div { class: "field-grid",
                    LocationSelect {
                        label: "Department",
                        value: selection.region.clone(),
                        options: regions,
                        disabled: false,
                        onchange: move |value: String| {
                            state.with_mut(|st| st.selection.set_region(value));
                            persist_user_state(&state);
                        },
                    }
                    LocationSelect {
                        label: "Province",
                        value: selection.sub_region.clone(),
                        options: sub_regions,
                        disabled: selection.region.is_none(),
                        onchange: move |value: String| {
                            state.with_mut(|st| st.selection.set_sub_region(value));
                            persist_user_state(&state);
                        },
                    }
                    LocationSelect {
                        label: "District",
                        value: selection.locality.clone(),
                        options: localities,
                        disabled: selection.sub_region.is_none(),
                        onchange: move |value: String| {
                            state.with_mut(|st| st.selection.set_locality(value));
                            persist_user_state(&state);
                        },
                    }
                }
                if let Some(line) = rate_line {
                    p { class: "panel-note", "{line}" }
                }
            }

            section { class: "quote-panel",
                h2 { class: "panel-heading", "Package" }
                div { class: "field-grid field-grid--two",
                    NumberField {
                        label: "Weight (kg)",
                        value: form.weight.clone(),
                        placeholder: "1",
                        oninput: move |value: String| state.with_mut(|st| st.form.weight = value),
                    }
                    NumberField {
                        label: "Declared value (S/)",
                        value: form.declared_value.clone(),
                        placeholder: "0 = no insurance",
                        oninput: move |value: String| state.with_mut(|st| st.form.declared_value = value),
                    }
                }
                div { class: "field-grid",
                    NumberField {
                        label: "Length (cm)",
                        value: form.length.clone(),
                        placeholder: "0",
                        oninput: move |value: String| state.with_mut(|st| st.form.length = value),
                    }
                    NumberField {
                        label: "Width (cm)",
                        value: form.width.clone(),
                        placeholder: "0",
                        oninput: move |value: String| state.with_mut(|st| st.form.width = value),
                    }
                    NumberField {
                        label: "Height (cm)",
                        value: form.height.clone(),
                        placeholder: "0",
                        oninput: move |value: String| state.with_mut(|st| st.form.height = value),
                    }
                }
                if let Some(line) = package_line {
                    p { class: "panel-note", "{line}" }
                }
            }

            match quote {
                Some(quote) => rsx! { QuoteSummary { quote, rounding } },
                None => rsx! {
                    section { class: "quote-panel",
                        p { class: "panel-note", "{hint}" }
                    }
                },
            }
        }
    }
}

#[component]
fn QuoteSummary(quote: QuoteResult, rounding: RoundingPolicy) -> Element {
    let weight_note = if quote.volumetric_weight_kg > 0.0 {
        format!("{}, volumetric {:.2} kg", rounding.label(), quote.volumetric_weight_kg)
    } else {
        rounding.label().to_string()
    };
    let excess_kg = (quote.chargeable_weight_kg - 1.0).max(0.0);

    rsx! {
        section { class: "quote-panel",
            h2 { class: "panel-heading", "Quote" }
            div { class: "kpi-grid",
                KpiCard {
                    title: "Total".to_string(),
                    value: soles(quote.total_cost),
                    description: None,
                    highlight: true,
                }
                KpiCard {
                    title: "Shipping".to_string(),
                    value: soles(quote.shipping_cost),
                    description: None,
                }
                KpiCard {
                    title: "Insurance".to_string(),
                    value: soles(quote.insurance_cost),
                    description: if quote.insurance_cost > 0.0 { None } else { Some("Not requested".to_string()) },
                }
                KpiCard {
                    title: "Chargeable weight".to_string(),
                    value: format!("{:.2} kg", quote.chargeable_weight_kg),
                    description: Some(weight_note),
                }
            }
            ul { class: "breakdown",
                li {
                    span { "Base rate (1 kg)" }
                    span { "{soles(quote.base_charge)}" }
                }
                if excess_kg > 0.0 {
                    li {
                        span { "Additional weight ({excess_kg:.2} kg)" }
                        span { "{soles(quote.excess_charge)}" }
                    }
                }
                if quote.insurance_cost > 0.0 {
                    li {
                        span { "Declared-value insurance" }
                        span { "{soles(quote.insurance_cost)}" }
                    }
                }
            }
        }
    }
}

#[component]
fn NumberField(
    label: &'static str,
    value: String,
    placeholder: &'static str,
    oninput: EventHandler<String>,
) -> Element {
    rsx! {
        div {
            label { class: "field-label", "{label}" }
            input {
                class: "field-input",
                r#type: "number",
                min: "0",
                step: "0.1",
                inputmode: "decimal",
                value,
                placeholder,
                oninput: move |evt| oninput.call(evt.value()),
            }
        }
    }
}

fn pending_hint(selection_complete: bool, record: Option<&RateRecord>, has_weight: bool) -> String {
    match (selection_complete, record) {
        (false, _) => "Pick a department, province and district to see a quote.".to_string(),
        (true, None) => "No rate is published for this district.".to_string(),
        (true, Some(_)) if !has_weight => "Enter the package weight.".to_string(),
        (true, Some(record)) => format!(
            "Weight must be above zero. Base rate to {} is {}.",
            record.locality,
            soles(record.base_unit_price)
        ),
    }
}

/// Billed weight and insurance for the typed package, before a destination is picked.
fn package_note(input: &QuoteInput, rounding: RoundingPolicy) -> String {
    let volumetric = volumetric_weight(input.length_cm, input.width_cm, input.height_cm);
    let billed = chargeable_weight(input.physical_weight_kg, volumetric, rounding);
    let mut note = format!("Billed as {billed:.2} kg");
    if volumetric > 0.0 {
        note.push_str(&format!(" (volumetric {volumetric:.2} kg)"));
    }
    let insurance = insurance_cost(input.declared_value);
    if insurance > 0.0 {
        note.push_str(&format!(", insurance {}", soles(insurance)));
    }
    note
}

fn rate_preview(record: &RateRecord) -> String {
    format!(
        "1 kg ships for {}, 5 kg for {}.",
        soles(shipping_cost(record, 1.0)),
        soles(shipping_cost(record, 5.0))
    )
}

pub fn soles(amount: f64) -> String {
    format!("S/ {amount:.2}")
}
