#![deny(warnings)]

//! Economic models: market diffusion and pricing helpers for the venture plan.
//!
//! This module provides pure utilities for:
//! - One Bass diffusion step with churn and an optional market ceiling
//! - Purchase frequency and weighted ARPU from a product list
//! - Compounded wage and price growth factors

use plan_core::{ProductSpec, ScenarioParameters};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Market inputs for the Bass diffusion recurrence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BassParams {
    /// Obtainable market M (SAM x target share).
    pub market_potential: Decimal,
    /// Innovation coefficient p.
    pub p: Decimal,
    /// Imitation coefficient q.
    pub q: Decimal,
    /// Yearly churn as a fraction of last year's customers.
    pub churn: Decimal,
    /// Customers in year 1.
    pub start_customers: Decimal,
    /// Clamp the result to `market_potential`.
    pub cap_at_market: bool,
}

impl BassParams {
    /// Collect the market block of a scenario.
    pub fn from_scenario(p: &ScenarioParameters) -> Self {
        Self {
            market_potential: p.market_potential(),
            p: p.p_innovation,
            q: p.q_imitation,
            churn: p.churn_rate,
            start_customers: p.start_customers,
            cap_at_market: p.cap_customers_at_market,
        }
    }

    /// A market potential of zero or less leaves the imitation term undefined.
    pub fn is_degenerate(&self) -> bool {
        self.market_potential <= Decimal::ZERO
    }
}

/// Customers at the end of year `t` given last year's count.
///
/// Year 1 returns the configured start. Later years keep `n_prev * (1 - churn)`
/// and add `(p + q * n_prev / M) * max(0, M - n_prev)` new adopters. A
/// degenerate market (M <= 0) adds nobody and skips the ceiling.
///
/// Example:
/// let n2 = next_customers(dec!(10), 2, &bass);
/// // 9 retained + (0.025 + 0.38 * 10/897) * 887 new, about 34.93
pub fn next_customers(n_prev: Decimal, t: u32, bass: &BassParams) -> Decimal {
    if t <= 1 {
        return bass.start_customers;
    }
    let retained = n_prev * (Decimal::ONE - bass.churn);
    if bass.is_degenerate() {
        return retained.max(Decimal::ZERO);
    }
    let m = bass.market_potential;
    let remaining = (m - n_prev).max(Decimal::ZERO);
    let adoption = (bass.p + bass.q * (n_prev / m)) * remaining;
    let n_t = (retained + adoption).max(Decimal::ZERO);
    if bass.cap_at_market {
        n_t.min(m)
    } else {
        n_t
    }
}

/// Purchases per customer per year for a product with a repurchase cycle.
///
/// `1 + repurchase_rate * (12 / cycle_months - 1)` when the cycle fits into a
/// year at least once; otherwise a single purchase.
pub fn purchase_frequency(repurchase_rate: Decimal, cycle_months: Decimal) -> Decimal {
    if cycle_months <= Decimal::ZERO {
        return Decimal::ONE;
    }
    let cycles = MONTHS_PER_YEAR / cycle_months;
    if cycles < Decimal::ONE {
        return Decimal::ONE;
    }
    Decimal::ONE + repurchase_rate * (cycles - Decimal::ONE)
}

/// Expected yearly revenue per customer from one product.
pub fn product_unit_revenue(p: &ProductSpec) -> Decimal {
    if p.price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    p.price
        * (Decimal::ONE - p.discount)
        * p.take_rate
        * purchase_frequency(p.repurchase_rate, p.cycle_months)
}

/// Expected yearly cost of goods per customer from one product.
pub fn product_unit_cost(p: &ProductSpec) -> Decimal {
    if p.price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    p.unit_cost * p.take_rate * purchase_frequency(p.repurchase_rate, p.cycle_months)
}

/// Where the effective ARPU came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PricingSource {
    /// Flat ARPU and COGS figures from the scenario.
    Manual,
    /// Weighted blend of the product list.
    ProductMix,
    /// Product mix requested but its weighted ARPU was zero.
    ManualFallback,
}

/// Per-customer economics used for every simulated year.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingProfile {
    pub arpu: Decimal,
    pub cogs_ratio: Decimal,
    pub cogs_per_customer: Decimal,
    pub source: PricingSource,
}

/// Weighted ARPU and COGS per customer over a product list.
/// Returns None when the weighted ARPU is zero.
pub fn weighted_mix(products: &[ProductSpec]) -> Option<(Decimal, Decimal)> {
    let arpu: Decimal = products.iter().map(product_unit_revenue).sum();
    let cost: Decimal = products.iter().map(product_unit_cost).sum();
    if arpu <= Decimal::ZERO {
        return None;
    }
    Some((arpu, cost))
}

/// Resolve the scenario's pricing once per run.
pub fn pricing_profile(params: &ScenarioParameters) -> PricingProfile {
    let manual = |source| PricingProfile {
        arpu: params.arpu,
        cogs_ratio: params.cogs_ratio,
        cogs_per_customer: params.cogs_per_customer,
        source,
    };
    if !params.use_product_mix {
        return manual(PricingSource::Manual);
    }
    match weighted_mix(&params.products_data) {
        Some((arpu, cost)) => PricingProfile {
            arpu,
            cogs_ratio: cost / arpu,
            cogs_per_customer: cost,
            source: PricingSource::ProductMix,
        },
        None => manual(PricingSource::ManualFallback),
    }
}

/// `factor^(t-1)` by repeated multiplication; year 1 is always 1.
pub fn compound(factor: Decimal, t: u32) -> Decimal {
    let mut acc = Decimal::ONE;
    for _ in 1..t {
        acc *= factor;
    }
    acc
}

/// Salary multiplier for year `t`: `((1 + wage_increase) * (1 + inflation))^(t-1)`.
pub fn wage_growth_factor(t: u32, wage_increase: Decimal, inflation: Decimal) -> Decimal {
    compound((Decimal::ONE + wage_increase) * (Decimal::ONE + inflation), t)
}

/// Price-level multiplier for year `t`: `(1 + inflation)^(t-1)`.
pub fn inflation_factor(t: u32, inflation: Decimal) -> Decimal {
    compound(Decimal::ONE + inflation, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reference_market() -> BassParams {
        BassParams::from_scenario(&ScenarioParameters::default())
    }

    #[test]
    fn year_one_is_start_customers() {
        let bass = reference_market();
        assert_eq!(next_customers(Decimal::ZERO, 1, &bass), dec!(10));
    }

    #[test]
    fn reference_year_two() {
        let bass = reference_market();
        assert_eq!(bass.market_potential, dec!(897));
        let n2 = next_customers(dec!(10), 2, &bass);
        // 9 + (0.025 + 0.38 * 10/897) * 887
        assert!((n2 - dec!(34.9326)).abs() < dec!(0.001), "n2 = {n2}");
    }

    #[test]
    fn clamp_holds_customers_at_ceiling() {
        let mut bass = reference_market();
        bass.churn = Decimal::ZERO;
        bass.p = dec!(0.9);
        let n = next_customers(dec!(800), 2, &bass);
        assert!(n <= bass.market_potential);

        bass.cap_at_market = false;
        bass.q = dec!(1);
        let unclamped = next_customers(dec!(800), 2, &bass);
        assert!(unclamped > bass.market_potential);
    }

    #[test]
    fn degenerate_market_only_retains() {
        let mut bass = reference_market();
        bass.market_potential = Decimal::ZERO;
        assert!(bass.is_degenerate());
        assert_eq!(next_customers(dec!(100), 3, &bass), dec!(90));
    }

    #[test]
    fn frequency_rules() {
        assert_eq!(purchase_frequency(dec!(0.5), Decimal::ZERO), Decimal::ONE);
        assert_eq!(purchase_frequency(dec!(0.5), dec!(24)), Decimal::ONE);
        assert_eq!(purchase_frequency(dec!(0.5), dec!(12)), Decimal::ONE);
        assert_eq!(purchase_frequency(dec!(0.5), dec!(3)), dec!(2.5));
        assert_eq!(purchase_frequency(Decimal::ONE, dec!(1)), dec!(12));
    }

    #[test]
    fn default_product_mix_blend() {
        let p = ScenarioParameters {
            use_product_mix: true,
            ..Default::default()
        };
        let profile = pricing_profile(&p);
        assert_eq!(profile.source, PricingSource::ProductMix);
        // 2400 + 150 * 0.95 * 0.6 * 2.5
        assert_eq!(profile.arpu, dec!(2613.75));
        // 200 + 60 * 0.6 * 2.5
        assert_eq!(profile.cogs_per_customer, dec!(290));
        assert_eq!(profile.cogs_ratio, dec!(290) / dec!(2613.75));
    }

    #[test]
    fn zero_priced_mix_falls_back_to_manual() {
        let mut p = ScenarioParameters {
            use_product_mix: true,
            ..Default::default()
        };
        for prod in &mut p.products_data {
            prod.price = Decimal::ZERO;
        }
        let profile = pricing_profile(&p);
        assert_eq!(profile.source, PricingSource::ManualFallback);
        assert_eq!(profile.arpu, dec!(3000));
        assert_eq!(profile.cogs_ratio, dec!(0.10));
    }

    #[test]
    fn growth_factors_compound_from_year_two() {
        assert_eq!(wage_growth_factor(1, dec!(0.015), dec!(0.02)), Decimal::ONE);
        assert_eq!(wage_growth_factor(2, dec!(0.015), dec!(0.02)), dec!(1.0353));
        assert_eq!(
            wage_growth_factor(3, dec!(0.015), dec!(0.02)),
            dec!(1.0353) * dec!(1.0353)
        );
        assert_eq!(inflation_factor(3, dec!(0.1)), dec!(1.21));
    }

    proptest! {
        #[test]
        fn capped_diffusion_never_exceeds_market(
            sam in 1u32..1_000_000,
            share in 1u32..1000,
            p in 0u32..1000,
            q in 0u32..1000,
            churn in 0u32..1000,
        ) {
            let bass = BassParams {
                market_potential: Decimal::from(sam) * Decimal::new(share as i64, 3),
                p: Decimal::new(p as i64, 3),
                q: Decimal::new(q as i64, 3),
                churn: Decimal::new(churn as i64, 3),
                start_customers: dec!(10).min(Decimal::from(sam) * Decimal::new(share as i64, 3)),
                cap_at_market: true,
            };
            let mut n = next_customers(Decimal::ZERO, 1, &bass);
            for t in 2..=10 {
                n = next_customers(n, t, &bass);
                prop_assert!(n <= bass.market_potential);
                prop_assert!(n >= Decimal::ZERO);
            }
        }

        #[test]
        fn frequency_at_least_one(rate in 0u32..=100, months in 0u32..48) {
            let f = purchase_frequency(Decimal::new(rate as i64, 2), Decimal::from(months));
            prop_assert!(f >= Decimal::ONE);
        }
    }
}
