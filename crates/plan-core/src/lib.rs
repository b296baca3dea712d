#![deny(warnings)]

//! Core domain models and invariants for the venture plan.
//!
//! This crate defines the serializable scenario inputs consumed by the
//! projection engine, their reference defaults, and validation helpers that
//! report parameter sets the engine would otherwise have to patch up.

pub mod numeric;

use numeric::{lenient, lenient_u32};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Number of simulated years in a standard plan.
pub const HORIZON_YEARS: u32 = 10;

/// Longest horizon the engine will run; longer plans are cut to this.
pub const MAX_HORIZON_YEARS: u32 = 100;

/// Customers at the end of year 1.
pub const START_CUSTOMERS: Decimal = dec!(10);

/// Lot type used for the unconditional yearly capex allowance.
pub const MISC_ASSET_TYPE: &str = "misc";

/// Hours per month times months per year, used to turn hourly rates into salaries.
pub const HOURS_PER_YEAR: Decimal = dec!(1920);

/// How cost of goods sold is derived each year.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CogsPolicy {
    /// `revenue * cogs_ratio`
    #[default]
    RevenueRatio,
    /// `customers * cogs_per_customer`
    PerCustomer,
}

/// What a cost center scales with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostDriver {
    /// Fixed base inflated yearly; the coupled share follows revenue.
    #[default]
    Revenue,
    /// Base value per FTE, inflated yearly.
    Headcount,
}

/// A job role on the headcount roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Role title, unique within a roster.
    pub title: String,
    /// Gross annual salary per FTE in year-1 money.
    #[serde(default, deserialize_with = "lenient")]
    pub annual_salary: Decimal,
    /// FTEs in year 1. Roles at zero never scale.
    #[serde(default, deserialize_with = "lenient")]
    pub base_fte: Decimal,
    /// Equipment types (asset catalog keys) each FTE of this role needs.
    #[serde(default)]
    pub equipment: Vec<String>,
    /// One-off opex per newly hired FTE (recruiting, onboarding).
    #[serde(default, deserialize_with = "lenient")]
    pub setup_cost: Decimal,
}

/// A product in the weighted price list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub name: String,
    /// List price per purchase.
    #[serde(default, deserialize_with = "lenient")]
    pub price: Decimal,
    /// Product-level discount as a fraction.
    #[serde(default, deserialize_with = "lenient")]
    pub discount: Decimal,
    /// Share of customers buying this product, in [0,1].
    #[serde(default, deserialize_with = "lenient")]
    pub take_rate: Decimal,
    /// Share of buyers who repurchase every cycle.
    #[serde(default, deserialize_with = "lenient")]
    pub repurchase_rate: Decimal,
    /// Repurchase cycle length in months; 0 means one purchase per year.
    #[serde(default, deserialize_with = "lenient")]
    pub cycle_months: Decimal,
    /// Cost of goods per purchase.
    #[serde(default, deserialize_with = "lenient")]
    pub unit_cost: Decimal,
}

/// A recurring overhead line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostCenterSpec {
    pub name: String,
    /// Year-1 amount (or amount per FTE for headcount-driven centers).
    #[serde(default, deserialize_with = "lenient")]
    pub base_value: Decimal,
    /// Share of the cost that moves with revenue, in [0,1].
    #[serde(default, deserialize_with = "lenient")]
    pub revenue_coupling: Decimal,
    #[serde(default)]
    pub driver: CostDriver,
}

/// A purchasable equipment type in the asset catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    /// Catalog key referenced by `RoleSpec::equipment`.
    pub equipment: String,
    #[serde(default, deserialize_with = "lenient")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub useful_life_years: u32,
}

/// Complete, read-only input for one projection run.
///
/// Missing keys take the reference values from [`Default`]; malformed numeric
/// values (blank, non-numeric, NaN) become zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParameters {
    // Market
    #[serde(deserialize_with = "lenient")]
    pub sam: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub target_share: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub p_innovation: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub q_imitation: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub churn_rate: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub start_customers: Decimal,
    #[serde(deserialize_with = "lenient_u32")]
    pub horizon_years: u32,

    // Pricing
    #[serde(deserialize_with = "lenient")]
    pub arpu: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub discount_total: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub cogs_ratio: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub cogs_per_customer: Decimal,
    pub use_product_mix: bool,
    pub cogs_policy: CogsPolicy,

    // People
    #[serde(deserialize_with = "lenient")]
    pub wage_increase: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub inflation: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub payroll_tax_rate: Decimal,
    /// Revenue per FTE used when the year-1 baseline cannot provide one.
    #[serde(deserialize_with = "lenient")]
    pub fallback_revenue_per_fte: Decimal,

    // Operating expenses
    /// Marketing spend per customer (CAC).
    #[serde(deserialize_with = "lenient")]
    pub cac: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub consulting_pct: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub misc_opex_year1: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub misc_opex_recurring: Decimal,

    // Capex
    #[serde(deserialize_with = "lenient")]
    pub misc_capex_annual: Decimal,
    #[serde(deserialize_with = "lenient_u32")]
    pub misc_capex_useful_life: u32,

    // Financing
    #[serde(deserialize_with = "lenient")]
    pub starting_equity: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub starting_debt: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub min_cash: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub interest_rate: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub tax_rate: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub dso_days: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub dpo_days: Decimal,

    // Policies
    pub cap_customers_at_market: bool,
    pub use_loss_carryforward: bool,

    // Tables
    pub jobs_data: Vec<RoleSpec>,
    pub products_data: Vec<ProductSpec>,
    pub cost_centers_data: Vec<CostCenterSpec>,
    pub assets_data: Vec<AssetSpec>,
}

impl ScenarioParameters {
    /// Obtainable market (SOM): `sam * target_share`.
    pub fn market_potential(&self) -> Decimal {
        self.sam * self.target_share
    }

    /// Sum of year-1 FTEs across the roster.
    pub fn total_base_fte(&self) -> Decimal {
        self.jobs_data.iter().map(|r| r.base_fte).sum()
    }

    /// Look up an equipment type in the asset catalog.
    pub fn asset(&self, equipment: &str) -> Option<&AssetSpec> {
        self.assets_data.iter().find(|a| a.equipment == equipment)
    }
}

fn role(title: &str, hourly_rate: Decimal, base_fte: Decimal, equipment: &[&str]) -> RoleSpec {
    RoleSpec {
        title: title.to_string(),
        annual_salary: hourly_rate * HOURS_PER_YEAR,
        base_fte,
        equipment: equipment.iter().map(|e| e.to_string()).collect(),
        setup_cost: dec!(2000),
    }
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            sam: dec!(39000),
            target_share: dec!(0.023),
            p_innovation: dec!(0.025),
            q_imitation: dec!(0.38),
            churn_rate: dec!(0.10),
            start_customers: START_CUSTOMERS,
            horizon_years: HORIZON_YEARS,
            arpu: dec!(3000),
            discount_total: Decimal::ZERO,
            cogs_ratio: dec!(0.10),
            cogs_per_customer: dec!(300),
            use_product_mix: false,
            cogs_policy: CogsPolicy::RevenueRatio,
            wage_increase: dec!(0.015),
            inflation: dec!(0.02),
            payroll_tax_rate: dec!(0.25),
            fallback_revenue_per_fte: dec!(150000),
            cac: dec!(3590),
            consulting_pct: dec!(0.05),
            misc_opex_year1: dec!(13000),
            misc_opex_recurring: dec!(3000),
            misc_capex_annual: dec!(2000),
            misc_capex_useful_life: 3,
            starting_equity: dec!(250000),
            starting_debt: Decimal::ZERO,
            min_cash: dec!(50000),
            interest_rate: dec!(0.06),
            tax_rate: dec!(0.30),
            dso_days: dec!(30),
            dpo_days: dec!(20),
            cap_customers_at_market: true,
            use_loss_carryforward: true,
            jobs_data: vec![
                role("Managing Director", dec!(80), Decimal::ZERO, &["car", "laptop"]),
                role("Executives", dec!(50), dec!(1.0), &["car", "laptop"]),
                role("Field Service", dec!(40), dec!(0.25), &["car", "laptop"]),
                role("Internal Sales", dec!(40), dec!(0.5), &["laptop"]),
                role("Marketing", dec!(40), dec!(0.125), &["laptop"]),
                role("Accounting", dec!(40), dec!(0.125), &["laptop"]),
            ],
            products_data: vec![
                ProductSpec {
                    name: "Subscription".to_string(),
                    price: dec!(2400),
                    discount: Decimal::ZERO,
                    take_rate: Decimal::ONE,
                    repurchase_rate: Decimal::ZERO,
                    cycle_months: Decimal::ZERO,
                    unit_cost: dec!(200),
                },
                ProductSpec {
                    name: "Consumables".to_string(),
                    price: dec!(150),
                    discount: dec!(0.05),
                    take_rate: dec!(0.6),
                    repurchase_rate: dec!(0.5),
                    cycle_months: dec!(3),
                    unit_cost: dec!(60),
                },
            ],
            cost_centers_data: vec![
                CostCenterSpec {
                    name: "Office".to_string(),
                    base_value: dec!(4044),
                    revenue_coupling: Decimal::ZERO,
                    driver: CostDriver::Headcount,
                },
                CostCenterSpec {
                    name: "IT & Licences".to_string(),
                    base_value: dec!(1011),
                    revenue_coupling: Decimal::ZERO,
                    driver: CostDriver::Headcount,
                },
                CostCenterSpec {
                    name: "Insurance & Admin".to_string(),
                    base_value: dec!(6000),
                    revenue_coupling: dec!(0.2),
                    driver: CostDriver::Revenue,
                },
            ],
            assets_data: vec![
                AssetSpec {
                    equipment: "car".to_string(),
                    unit_price: dec!(30000),
                    useful_life_years: 6,
                },
                AssetSpec {
                    equipment: "laptop".to_string(),
                    unit_price: dec!(1500),
                    useful_life_years: 3,
                },
            ],
        }
    }
}

/// Validation errors for scenario invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A fraction-valued parameter lies outside [0, 1].
    #[error("{field} must be within [0,1], got {value}")]
    RateOutOfRange { field: String, value: Decimal },
    /// Money, counts and day figures must be non-negative.
    #[error("{0} must not be negative")]
    Negative(String),
    /// The plan must cover at least one year.
    #[error("horizon must be at least one year")]
    EmptyHorizon,
    /// Compounded figures leave the representable range on very long plans.
    #[error("horizon of {years} years exceeds the maximum of {max}")]
    HorizonTooLong { years: u32, max: u32 },
    /// Names in the roster, product list, cost centers and catalog must be non-blank.
    #[error("blank name in {0}")]
    BlankName(&'static str),
    /// A table key appears twice.
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    /// Assets must depreciate over at least one year.
    #[error("useful life of {0} must be > 0")]
    ZeroUsefulLife(String),
    /// A role references equipment missing from the asset catalog.
    #[error("role {role} needs unknown equipment {equipment}")]
    UnknownEquipment { role: String, equipment: String },
}

fn check_rate(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::RateOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_non_negative(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative(field.to_string()));
    }
    Ok(())
}

fn check_unique<'a>(
    table: &'static str,
    keys: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if key.trim().is_empty() {
            return Err(ValidationError::BlankName(table));
        }
        if !seen.insert(key) {
            return Err(ValidationError::Duplicate(format!("{table}: {key}")));
        }
    }
    Ok(())
}

/// Validate a role.
pub fn validate_role(r: &RoleSpec) -> Result<(), ValidationError> {
    check_non_negative("annual_salary", r.annual_salary)?;
    check_non_negative("base_fte", r.base_fte)?;
    check_non_negative("setup_cost", r.setup_cost)?;
    Ok(())
}

/// Validate a product.
pub fn validate_product(p: &ProductSpec) -> Result<(), ValidationError> {
    check_non_negative("price", p.price)?;
    check_non_negative("unit_cost", p.unit_cost)?;
    check_non_negative("cycle_months", p.cycle_months)?;
    check_rate("discount", p.discount)?;
    check_rate("take_rate", p.take_rate)?;
    check_rate("repurchase_rate", p.repurchase_rate)?;
    Ok(())
}

/// Validate a cost center.
pub fn validate_cost_center(c: &CostCenterSpec) -> Result<(), ValidationError> {
    check_non_negative("base_value", c.base_value)?;
    check_rate("revenue_coupling", c.revenue_coupling)
}

/// Validate an asset catalog entry.
pub fn validate_asset(a: &AssetSpec) -> Result<(), ValidationError> {
    check_non_negative("unit_price", a.unit_price)?;
    if a.useful_life_years == 0 {
        return Err(ValidationError::ZeroUsefulLife(a.equipment.clone()));
    }
    Ok(())
}

/// Validate a full scenario, including cross-references from roles to the catalog.
///
/// The engine tolerates every problem reported here by falling back to safe
/// values; callers use this to tell the user before running.
pub fn validate_scenario(p: &ScenarioParameters) -> Result<(), ValidationError> {
    if p.horizon_years == 0 {
        return Err(ValidationError::EmptyHorizon);
    }
    if p.horizon_years > MAX_HORIZON_YEARS {
        return Err(ValidationError::HorizonTooLong {
            years: p.horizon_years,
            max: MAX_HORIZON_YEARS,
        });
    }
    for (field, value) in [
        ("target_share", p.target_share),
        ("p_innovation", p.p_innovation),
        ("q_imitation", p.q_imitation),
        ("churn_rate", p.churn_rate),
        ("discount_total", p.discount_total),
        ("cogs_ratio", p.cogs_ratio),
        ("payroll_tax_rate", p.payroll_tax_rate),
        ("consulting_pct", p.consulting_pct),
        ("tax_rate", p.tax_rate),
    ] {
        check_rate(field, value)?;
    }
    for (field, value) in [
        ("sam", p.sam),
        ("start_customers", p.start_customers),
        ("arpu", p.arpu),
        ("cogs_per_customer", p.cogs_per_customer),
        ("fallback_revenue_per_fte", p.fallback_revenue_per_fte),
        ("cac", p.cac),
        ("misc_opex_year1", p.misc_opex_year1),
        ("misc_opex_recurring", p.misc_opex_recurring),
        ("misc_capex_annual", p.misc_capex_annual),
        ("starting_equity", p.starting_equity),
        ("starting_debt", p.starting_debt),
        ("min_cash", p.min_cash),
        ("interest_rate", p.interest_rate),
        ("dso_days", p.dso_days),
        ("dpo_days", p.dpo_days),
    ] {
        check_non_negative(field, value)?;
    }
    if p.misc_capex_annual > Decimal::ZERO && p.misc_capex_useful_life == 0 {
        return Err(ValidationError::ZeroUsefulLife(MISC_ASSET_TYPE.to_string()));
    }

    check_unique("jobs_data", p.jobs_data.iter().map(|r| r.title.as_str()))?;
    check_unique("products_data", p.products_data.iter().map(|x| x.name.as_str()))?;
    check_unique(
        "cost_centers_data",
        p.cost_centers_data.iter().map(|c| c.name.as_str()),
    )?;
    check_unique(
        "assets_data",
        p.assets_data
            .iter()
            .map(|a| a.equipment.as_str())
            .chain(std::iter::once(MISC_ASSET_TYPE)),
    )?;

    for r in &p.jobs_data {
        validate_role(r)?;
        for e in &r.equipment {
            if p.asset(e).is_none() {
                return Err(ValidationError::UnknownEquipment {
                    role: r.title.clone(),
                    equipment: e.clone(),
                });
            }
        }
    }
    for x in &p.products_data {
        validate_product(x)?;
    }
    for c in &p.cost_centers_data {
        validate_cost_center(c)?;
    }
    for a in &p.assets_data {
        validate_asset(a)?;
    }
    Ok(())
}
