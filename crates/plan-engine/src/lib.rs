#![deny(warnings)]

//! Ten-year projection engine for the venture plan.
//!
//! Each simulated year runs the same fixed pipeline over the previous year's
//! carried state: Bass diffusion to customers and revenue, the headcount
//! planner, the asset ledger, then P&L, cash sweep and balance sheet.
//! `simulate` is a pure function; every call owns its own state.

pub mod accounts;
pub mod headcount;
pub mod ledger;
pub mod opex;

use accounts::{BalanceState, FinancingPolicy, OperatingYear};
use headcount::{HeadcountPlanner, RoleHeadcount};
use ledger::{AssetRegister, AssetYearEntry, MiscCapex};
use plan_core::{CogsPolicy, ScenarioParameters, MAX_HORIZON_YEARS};
use plan_econ::{next_customers, pricing_profile, BassParams, PricingSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// A degenerate input the engine recovered from, or a balance sheet that did not close.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// SAM x target share is zero or negative; customers only churn.
    ZeroMarketPotential,
    /// Product mix requested but its weighted ARPU is zero; manual ARPU used.
    ZeroWeightedArpu,
    /// No year-1 FTEs or revenue to derive revenue per FTE from.
    ZeroBaselineFte { fallback_revenue_per_fte: Decimal },
    /// Catalog entry with zero useful life; depreciated over one year.
    ZeroUsefulLife { equipment: String },
    /// Role lists equipment missing from the catalog; ignored.
    UnknownEquipment { role: String, equipment: String },
    /// Requested horizon longer than the engine runs; cut to `max` years.
    HorizonClamped { requested: u32, max: u32 },
    /// Assets minus liabilities and equity beyond tolerance.
    BalanceMismatch { year: u32, residual: Decimal },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ZeroMarketPotential => {
                write!(f, "market potential is zero; no new customers are acquired")
            }
            Diagnostic::ZeroWeightedArpu => {
                write!(f, "product mix yields zero ARPU; using manual ARPU")
            }
            Diagnostic::ZeroBaselineFte {
                fallback_revenue_per_fte,
            } => write!(
                f,
                "no year-1 baseline for headcount; using {fallback_revenue_per_fte} revenue per FTE"
            ),
            Diagnostic::ZeroUsefulLife { equipment } => {
                write!(f, "{equipment} has zero useful life; depreciating over one year")
            }
            Diagnostic::UnknownEquipment { role, equipment } => {
                write!(f, "role {role} needs {equipment}, which is not in the catalog")
            }
            Diagnostic::HorizonClamped { requested, max } => {
                write!(f, "horizon of {requested} years cut to {max}")
            }
            Diagnostic::BalanceMismatch { year, residual } => {
                write!(f, "balance sheet off by {residual} in year {year}")
            }
        }
    }
}

pub(crate) fn note(diagnostics: &mut Vec<Diagnostic>, d: Diagnostic) {
    warn!("{d}");
    diagnostics.push(d);
}

/// One simulated year. Created once and never modified.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearRecord {
    pub year: u32,
    pub customers: Decimal,
    pub revenue: Decimal,
    pub fte_by_role: Vec<RoleHeadcount>,
    pub fte_total: Decimal,
    pub payroll: Decimal,
    pub setup_opex: Decimal,
    pub cogs: Decimal,
    pub marketing: Decimal,
    pub cost_centers: Decimal,
    pub consulting: Decimal,
    pub misc_opex: Decimal,
    /// Cost centers, consulting and misc opex.
    pub other_opex: Decimal,
    pub opex_total: Decimal,
    pub ebitda: Decimal,
    /// EBITDA / revenue, zero without revenue.
    pub ebitda_margin: Decimal,
    pub depreciation: Decimal,
    pub ebit: Decimal,
    pub interest: Decimal,
    pub ebt: Decimal,
    pub tax: Decimal,
    pub loss_carryforward: Decimal,
    pub net_income: Decimal,
    pub capex: Decimal,
    pub receivables: Decimal,
    pub payables: Decimal,
    pub operating_cashflow: Decimal,
    pub borrowing: Decimal,
    pub repayment: Decimal,
    pub cash: Decimal,
    pub debt: Decimal,
    pub fixed_assets: Decimal,
    pub equity: Decimal,
    pub total_assets: Decimal,
    pub total_liabilities_and_equity: Decimal,
    pub balance_residual: Decimal,
}

/// Result of one run: yearly table, asset ledger and diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Projection {
    pub effective_arpu: Decimal,
    pub effective_cogs_ratio: Decimal,
    pub revenue_per_fte: Decimal,
    pub years: Vec<YearRecord>,
    pub register: AssetRegister,
    pub asset_log: Vec<AssetYearEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Projection {
    pub fn year(&self, t: u32) -> Option<&YearRecord> {
        self.years.iter().find(|y| y.year == t)
    }

    pub fn final_year(&self) -> Option<&YearRecord> {
        self.years.last()
    }

    /// First year with positive EBITDA.
    pub fn break_even_year(&self) -> Option<u32> {
        self.years
            .iter()
            .find(|y| y.ebitda > Decimal::ZERO)
            .map(|y| y.year)
    }

    pub fn peak_debt(&self) -> Decimal {
        self.years
            .iter()
            .map(|y| y.debt)
            .fold(Decimal::ZERO, Decimal::max)
    }

    pub fn cumulative_net_income(&self) -> Decimal {
        self.years.iter().map(|y| y.net_income).sum()
    }

    /// True when no year reported a balance mismatch.
    pub fn is_balanced(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::BalanceMismatch { .. }))
    }
}

fn check_inputs(params: &ScenarioParameters, diagnostics: &mut Vec<Diagnostic>) {
    for asset in &params.assets_data {
        if asset.useful_life_years == 0 {
            note(
                diagnostics,
                Diagnostic::ZeroUsefulLife {
                    equipment: asset.equipment.clone(),
                },
            );
        }
    }
    if params.misc_capex_annual > Decimal::ZERO && params.misc_capex_useful_life == 0 {
        note(
            diagnostics,
            Diagnostic::ZeroUsefulLife {
                equipment: plan_core::MISC_ASSET_TYPE.to_string(),
            },
        );
    }
    for role in &params.jobs_data {
        for e in &role.equipment {
            if params.asset(e).is_none() {
                note(
                    diagnostics,
                    Diagnostic::UnknownEquipment {
                        role: role.title.clone(),
                        equipment: e.clone(),
                    },
                );
            }
        }
    }
}

/// Run the projection over `params.horizon_years` years, at most [`MAX_HORIZON_YEARS`].
pub fn simulate(params: &ScenarioParameters) -> Projection {
    let mut diagnostics = Vec::new();
    check_inputs(params, &mut diagnostics);
    let horizon = params.horizon_years.min(MAX_HORIZON_YEARS);
    if horizon < params.horizon_years {
        note(
            &mut diagnostics,
            Diagnostic::HorizonClamped {
                requested: params.horizon_years,
                max: MAX_HORIZON_YEARS,
            },
        );
    }

    let pricing = pricing_profile(params);
    if pricing.source == PricingSource::ManualFallback {
        note(&mut diagnostics, Diagnostic::ZeroWeightedArpu);
    }
    let bass = BassParams::from_scenario(params);
    if bass.is_degenerate() {
        note(&mut diagnostics, Diagnostic::ZeroMarketPotential);
    }

    let net_price = pricing.arpu * (Decimal::ONE - params.discount_total);
    let revenue_year1 = bass.start_customers * net_price;
    let planner = HeadcountPlanner::new(params, revenue_year1, &mut diagnostics);
    let policy = FinancingPolicy::from_scenario(params);
    let misc = MiscCapex {
        amount: params.misc_capex_annual,
        useful_life: params.misc_capex_useful_life,
    };

    let mut customers = Decimal::ZERO;
    let mut fte = vec![Decimal::ZERO; params.jobs_data.len()];
    let mut register = AssetRegister::default();
    let mut state = BalanceState::opening(params);
    let mut years = Vec::with_capacity(horizon as usize);
    let mut asset_log = Vec::new();

    for t in 1..=horizon {
        customers = next_customers(customers, t, &bass);
        let revenue = customers * net_price;

        let staff = planner.scale_roles(revenue, &fte, t);
        let fte_total = staff.total_fte();

        let needs = ledger::equipment_needs(&params.jobs_data, &staff.fte_by_role, &params.assets_data);
        let capex_year =
            ledger::replenish_and_depreciate(&needs, &params.assets_data, misc, &mut register, t);

        let costs = opex::operating_costs(params, t, customers, revenue, revenue_year1, fte_total);
        let opex_total = staff.payroll + staff.setup_opex + costs.marketing + costs.other();
        let cogs = match params.cogs_policy {
            CogsPolicy::RevenueRatio => revenue * pricing.cogs_ratio,
            CogsPolicy::PerCustomer => customers * pricing.cogs_per_customer,
        };

        let fin = state.close_year(
            &OperatingYear {
                revenue,
                cogs,
                opex_total,
                depreciation: capex_year.depreciation,
                capex: capex_year.capex,
            },
            &policy,
            t,
        );
        if !fin.is_balanced() {
            note(
                &mut diagnostics,
                Diagnostic::BalanceMismatch {
                    year: t,
                    residual: fin.balance_residual,
                },
            );
        }
        debug!(
            year = t,
            %customers,
            %revenue,
            %fte_total,
            ebitda = %fin.ebitda,
            cash = %fin.cash,
            debt = %fin.debt,
            "year closed"
        );

        let ebitda_margin = if revenue > Decimal::ZERO {
            fin.ebitda / revenue
        } else {
            Decimal::ZERO
        };
        years.push(YearRecord {
            year: t,
            customers,
            revenue,
            fte_by_role: planner.label(&staff.fte_by_role),
            fte_total,
            payroll: staff.payroll,
            setup_opex: staff.setup_opex,
            cogs,
            marketing: costs.marketing,
            cost_centers: costs.cost_centers,
            consulting: costs.consulting,
            misc_opex: costs.misc,
            other_opex: costs.other(),
            opex_total,
            ebitda: fin.ebitda,
            ebitda_margin,
            depreciation: capex_year.depreciation,
            ebit: fin.ebit,
            interest: fin.interest,
            ebt: fin.ebt,
            tax: fin.tax,
            loss_carryforward: fin.loss_carryforward,
            net_income: fin.net_income,
            capex: capex_year.capex,
            receivables: fin.receivables,
            payables: fin.payables,
            operating_cashflow: fin.operating_cashflow,
            borrowing: fin.borrowing,
            repayment: fin.repayment,
            cash: fin.cash,
            debt: fin.debt,
            fixed_assets: fin.fixed_assets,
            equity: fin.equity,
            total_assets: fin.total_assets,
            total_liabilities_and_equity: fin.total_liabilities_and_equity,
            balance_residual: fin.balance_residual,
        });
        asset_log.extend(capex_year.entries);
        fte = staff.fte_by_role;
    }

    info!(
        years = years.len(),
        diagnostics = diagnostics.len(),
        "projection complete"
    );
    Projection {
        effective_arpu: pricing.arpu,
        effective_cogs_ratio: pricing.cogs_ratio,
        revenue_per_fte: planner.revenue_per_fte(),
        years,
        register,
        asset_log,
        diagnostics,
    }
}

/// A labelled parameter set, e.g. "best case" or "fighter pricing".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    pub params: ScenarioParameters,
}

/// Projection of one named scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub projection: Projection,
}

/// Run several scenarios; each gets its own state and asset register.
pub fn run_scenarios(scenarios: &[NamedScenario]) -> Vec<ScenarioOutcome> {
    scenarios
        .iter()
        .map(|s| {
            info!(scenario = %s.name, "running scenario");
            ScenarioOutcome {
                name: s.name.clone(),
                projection: simulate(&s.params),
            }
        })
        .collect()
}
