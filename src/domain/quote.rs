//! The carrier's pricing rules: chargeable weight, shipping and insurance.
//!
//! Rounding-sensitive steps run on [`Decimal`] so the printed tariff values are
//! reproduced exactly; results are handed back as `f64` for display.

use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal, RoundingStrategy,
};
use tracing::debug;

use super::entities::{QuoteInput, QuoteResult, RateRecord, RoundingPolicy};

/// Divisor turning cm³ into volumetric kilos.
const VOLUMETRIC_DIVISOR: i64 = 6_000;
/// Upper bound of the per-bracket insurance tier.
const BRACKET_TIER_LIMIT: i64 = 2_999;
/// Declared value above this is not insured.
const INSURED_VALUE_CAP: i64 = 10_000;

/// 0.60 per started 100 of declared value.
fn bracket_rate() -> Decimal {
    Decimal::new(60, 2)
}

/// IGV, 18%.
fn tax_factor() -> Decimal {
    Decimal::new(118, 2)
}

/// Flat 2% above the bracket tier.
fn flat_rate() -> Decimal {
    Decimal::new(2, 2)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuoteEngine {
    policy: RoundingPolicy,
}

impl QuoteEngine {
    pub fn new(policy: RoundingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RoundingPolicy {
        self.policy
    }

    /// Prices a shipment to `rate`'s destination.
    ///
    /// Returns `None` when there is no rate or the physical weight is not
    /// positive, so an incomplete form is never shown as a free shipment.
    pub fn compute(&self, rate: Option<&RateRecord>, input: &QuoteInput) -> Option<QuoteResult> {
        let rate = rate?;
        if input.physical_weight_kg.is_nan() || input.physical_weight_kg <= 0.0 {
            return None;
        }

        let physical = to_decimal(input.physical_weight_kg);
        let volumetric = volumetric_decimal(input.length_cm, input.width_cm, input.height_cm);
        let chargeable = round_weight(physical.max(volumetric), self.policy);

        let (base_charge, excess_charge) = shipping_charges(rate, chargeable);
        let shipping = to_cents(saturating_add(base_charge, excess_charge));
        let insurance = insurance_decimal(to_decimal(input.declared_value));
        let total = saturating_add(shipping, insurance);

        debug!(
            destination = %rate.locality,
            chargeable = %chargeable,
            shipping = %shipping,
            insurance = %insurance,
            "computed quote"
        );

        Some(QuoteResult {
            volumetric_weight_kg: to_f64(volumetric),
            chargeable_weight_kg: to_f64(chargeable),
            base_charge: to_f64(to_cents(base_charge)),
            excess_charge: to_f64(to_cents(excess_charge)),
            shipping_cost: to_f64(shipping),
            insurance_cost: to_f64(insurance),
            total_cost: to_f64(total),
        })
    }
}

/// `length * width * height / 6000`; zero if any side is zero or negative.
pub fn volumetric_weight(length_cm: f64, width_cm: f64, height_cm: f64) -> f64 {
    to_f64(volumetric_decimal(length_cm, width_cm, height_cm))
}

/// Greater of physical and volumetric weight, rounded per `policy`.
pub fn chargeable_weight(physical_kg: f64, volumetric_kg: f64, policy: RoundingPolicy) -> f64 {
    let raw = to_decimal(physical_kg).max(to_decimal(volumetric_kg));
    to_f64(round_weight(raw, policy))
}

/// First kilo at the base price, every further kilo at the excess price.
pub fn shipping_cost(rate: &RateRecord, chargeable_kg: f64) -> f64 {
    let (base, excess) = shipping_charges(rate, to_decimal(chargeable_kg));
    to_f64(to_cents(saturating_add(base, excess)))
}

pub fn insurance_cost(declared_value: f64) -> f64 {
    to_f64(insurance_decimal(to_decimal(declared_value)))
}

fn volumetric_decimal(length_cm: f64, width_cm: f64, height_cm: f64) -> Decimal {
    let volume = to_decimal(length_cm)
        .checked_mul(to_decimal(width_cm))
        .and_then(|area| area.checked_mul(to_decimal(height_cm)))
        .unwrap_or(Decimal::MAX);
    volume / Decimal::from(VOLUMETRIC_DIVISOR)
}

fn round_weight(raw: Decimal, policy: RoundingPolicy) -> Decimal {
    match policy {
        RoundingPolicy::HalfKg => {
            let whole = raw.floor();
            if raw - whole < Decimal::new(5, 1) {
                whole
            } else {
                raw.ceil()
            }
        }
        RoundingPolicy::Exact => raw,
    }
}

/// Unrounded first-kilo and excess charges.
fn shipping_charges(rate: &RateRecord, chargeable: Decimal) -> (Decimal, Decimal) {
    let excess_weight = (chargeable - Decimal::ONE).max(Decimal::ZERO);
    let base = to_decimal(rate.base_unit_price);
    let excess = excess_weight
        .checked_mul(to_decimal(rate.excess_unit_price))
        .unwrap_or(Decimal::MAX);
    (base, excess)
}

fn insurance_decimal(declared: Decimal) -> Decimal {
    if declared <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    if declared <= Decimal::from(BRACKET_TIER_LIMIT) {
        let brackets = (declared / Decimal::ONE_HUNDRED).ceil();
        return round_on_third_digit(brackets * bracket_rate() * tax_factor());
    }

    let insured = declared.min(Decimal::from(INSURED_VALUE_CAP));
    to_cents(insured * flat_rate())
}

/// Keeps two decimals, bumping the second when the third digit is 5 or more.
/// Digits past the third are ignored.
fn round_on_third_digit(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(3, RoundingStrategy::ToZero)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn saturating_add(left: Decimal, right: Decimal) -> Decimal {
    left.checked_add(right).unwrap_or(Decimal::MAX)
}

fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Negative and non-finite inputs count as zero; values past the decimal
/// range saturate at `Decimal::MAX`.
fn to_decimal(value: f64) -> Decimal {
    if !value.is_finite() || value <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::MAX)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn rate(base: f64, excess: f64) -> RateRecord {
        RateRecord {
            region: "LIMA".to_string(),
            sub_region: "LIMA".to_string(),
            locality: "SURCO".to_string(),
            base_unit_price: base,
            excess_unit_price: excess,
        }
    }

    #[rstest]
    #[case(1.49, 1.0)]
    #[case(1.50, 2.0)]
    #[case(0.99, 1.0)]
    #[case(0.3, 0.0)]
    #[case(2.0, 2.0)]
    #[case(7.5, 8.0)]
    fn half_kg_rounding(#[case] weight: f64, #[case] expected: f64) {
        assert_eq!(chargeable_weight(weight, 0.0, RoundingPolicy::HalfKg), expected);
    }

    #[test]
    fn exact_policy_keeps_fraction() {
        assert_eq!(chargeable_weight(1.49, 0.0, RoundingPolicy::Exact), 1.49);
    }

    #[test]
    fn volumetric_weight_uses_6000_divisor() {
        assert_eq!(volumetric_weight(60.0, 40.0, 40.0), 16.0);
        assert_eq!(volumetric_weight(60.0, 0.0, 40.0), 0.0);
        assert_eq!(volumetric_weight(60.0, -40.0, 40.0), 0.0);
    }

    #[test]
    fn bulky_parcel_bills_volumetric_weight() {
        let engine = QuoteEngine::default();
        let input = QuoteInput::new(5.0).with_dimensions(60.0, 40.0, 40.0);
        let quote = engine.compute(Some(&rate(10.0, 4.0)), &input).unwrap();

        assert_eq!(quote.volumetric_weight_kg, 16.0);
        assert_eq!(quote.chargeable_weight_kg, 16.0);
        assert_eq!(quote.shipping_cost, 10.0 + 15.0 * 4.0);
    }

    #[test]
    fn shipping_cost_bills_excess_kilos() {
        assert_eq!(shipping_cost(&rate(10.0, 4.0), 3.0), 18.0);
    }

    #[test]
    fn first_kilo_is_never_discounted() {
        assert_eq!(shipping_cost(&rate(10.0, 4.0), 0.0), 10.0);
        assert_eq!(shipping_cost(&rate(10.0, 4.0), 0.4), 10.0);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(-50.0, 0.0)]
    #[case(0.5, 0.71)]
    #[case(100.0, 0.71)]
    #[case(250.0, 2.12)]
    #[case(290.0, 2.12)]
    #[case(291.0, 2.12)]
    #[case(300.0, 2.12)]
    #[case(301.0, 2.83)]
    #[case(2999.0, 21.24)]
    #[case(3000.0, 60.0)]
    #[case(5000.0, 100.0)]
    #[case(10_000.0, 200.0)]
    #[case(50_000.0, 200.0)]
    #[case(1e29, 200.0)]
    #[case(f64::MAX, 200.0)]
    fn insurance_tiers(#[case] declared: f64, #[case] expected: f64) {
        assert_eq!(insurance_cost(declared), expected);
    }

    #[test]
    fn third_digit_rounding_ignores_later_digits() {
        assert_eq!(round_on_third_digit(Decimal::new(2124, 3)), Decimal::new(212, 2));
        assert_eq!(round_on_third_digit(Decimal::new(2125, 3)), Decimal::new(213, 2));
        assert_eq!(round_on_third_digit(Decimal::new(21249, 4)), Decimal::new(212, 2));
        assert_eq!(round_on_third_digit(Decimal::new(21_159_999, 7)), Decimal::new(212, 2));
    }

    #[test]
    fn flat_tier_rounds_to_cents() {
        assert_eq!(insurance_decimal(Decimal::new(3_000_25, 2)), Decimal::new(60_01, 2));
    }

    #[test]
    fn compute_totals_shipping_and_insurance() {
        let engine = QuoteEngine::new(RoundingPolicy::HalfKg);
        let input = QuoteInput::new(3.2).with_declared_value(250.0);
        let quote = engine.compute(Some(&rate(10.0, 4.0)), &input).unwrap();

        assert_eq!(
            quote,
            QuoteResult {
                volumetric_weight_kg: 0.0,
                chargeable_weight_kg: 3.0,
                base_charge: 10.0,
                excess_charge: 8.0,
                shipping_cost: 18.0,
                insurance_cost: 2.12,
                total_cost: 20.12,
            }
        );
    }

    #[test]
    fn exact_policy_prices_fractional_excess() {
        let engine = QuoteEngine::new(RoundingPolicy::Exact);
        let quote = engine
            .compute(Some(&rate(10.0, 4.0)), &QuoteInput::new(2.5))
            .unwrap();
        assert_eq!(quote.chargeable_weight_kg, 2.5);
        assert_eq!(quote.excess_charge, 6.0);
        assert_eq!(quote.total_cost, 16.0);
    }

    #[test]
    fn sub_kilo_parcel_still_quotes() {
        let quote = QuoteEngine::default()
            .compute(Some(&rate(10.0, 4.0)), &QuoteInput::new(0.99))
            .unwrap();
        assert_eq!(quote.chargeable_weight_kg, 1.0);
        assert_eq!(quote.total_cost, 10.0);
    }

    #[test]
    fn out_of_range_weight_saturates_instead_of_vanishing() {
        let quote = QuoteEngine::default()
            .compute(Some(&rate(10.0, 4.0)), &QuoteInput::new(1e29).with_declared_value(1e29))
            .unwrap();
        assert!(quote.chargeable_weight_kg > 7.9e28);
        assert!(quote.shipping_cost > 1e28);
        assert_eq!(quote.insurance_cost, 200.0);
        assert!(quote.total_cost >= quote.shipping_cost);
    }

    #[test]
    fn shipping_rounds_only_the_sum() {
        let engine = QuoteEngine::new(RoundingPolicy::Exact);
        let quote = engine
            .compute(Some(&rate(1.125, 0.25)), &QuoteInput::new(1.02))
            .unwrap();
        assert_eq!(quote.base_charge, 1.13);
        assert_eq!(quote.excess_charge, 0.01);
        assert_eq!(quote.shipping_cost, 1.13);
        assert_eq!(shipping_cost(&rate(10.0, 4.5), 1.333), 11.5);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn non_positive_weight_has_no_quote(#[case] weight: f64) {
        let input = QuoteInput::new(weight).with_dimensions(60.0, 40.0, 40.0);
        assert_eq!(QuoteEngine::default().compute(Some(&rate(10.0, 4.0)), &input), None);
    }

    #[test]
    fn missing_rate_has_no_quote() {
        assert_eq!(QuoteEngine::default().compute(None, &QuoteInput::new(2.0)), None);
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let input = QuoteInput::new(2.0)
            .with_dimensions(-10.0, 30.0, 30.0)
            .with_declared_value(-500.0);
        let quote = QuoteEngine::default()
            .compute(Some(&rate(10.0, 4.0)), &input)
            .unwrap();
        assert_eq!(quote.volumetric_weight_kg, 0.0);
        assert_eq!(quote.insurance_cost, 0.0);
        assert_eq!(quote.total_cost, 14.0);
    }
}
