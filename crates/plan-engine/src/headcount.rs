//! Headcount planner: scales the year-1 roster with revenue, never shrinking a role.

use crate::Diagnostic;
use plan_core::{RoleSpec, ScenarioParameters};
use plan_econ::wage_growth_factor;
use rust_decimal::Decimal;
use serde::Serialize;

/// FTEs of one role in one year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoleHeadcount {
    pub title: String,
    pub fte: Decimal,
}

/// Staffing outcome of one year. `fte_by_role` is aligned with the roster order.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadcountYear {
    pub fte_by_role: Vec<Decimal>,
    pub payroll: Decimal,
    pub setup_opex: Decimal,
}

impl HeadcountYear {
    pub fn total_fte(&self) -> Decimal {
        self.fte_by_role.iter().copied().sum()
    }
}

/// Roster scaling rules fixed by year 1.
#[derive(Clone, Debug)]
pub struct HeadcountPlanner<'a> {
    roster: &'a [RoleSpec],
    base_total: Decimal,
    revenue_per_fte: Decimal,
    wage_increase: Decimal,
    inflation: Decimal,
    payroll_tax_rate: Decimal,
}

impl<'a> HeadcountPlanner<'a> {
    /// Derive the target revenue per FTE from year-1 revenue and the roster.
    ///
    /// An empty baseline or zero year-1 revenue falls back to
    /// `fallback_revenue_per_fte` and records a diagnostic.
    pub fn new(
        params: &'a ScenarioParameters,
        revenue_year1: Decimal,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let base_total = params.total_base_fte();
        let revenue_per_fte = if base_total > Decimal::ZERO && revenue_year1 > Decimal::ZERO {
            revenue_year1 / base_total
        } else {
            crate::note(
                diagnostics,
                Diagnostic::ZeroBaselineFte {
                    fallback_revenue_per_fte: params.fallback_revenue_per_fte,
                },
            );
            params.fallback_revenue_per_fte
        };
        Self {
            roster: &params.jobs_data,
            base_total,
            revenue_per_fte,
            wage_increase: params.wage_increase,
            inflation: params.inflation,
            payroll_tax_rate: params.payroll_tax_rate,
        }
    }

    pub fn revenue_per_fte(&self) -> Decimal {
        self.revenue_per_fte
    }

    /// Staff year `t` for `revenue` given last year's FTEs per role.
    ///
    /// Year 1 takes the roster verbatim. Later years split
    /// `revenue / revenue_per_fte` by each role's baseline share and keep the
    /// larger of that and last year's count.
    pub fn scale_roles(&self, revenue: Decimal, prev: &[Decimal], t: u32) -> HeadcountYear {
        let target_total = if self.revenue_per_fte > Decimal::ZERO {
            revenue / self.revenue_per_fte
        } else {
            Decimal::ZERO
        };
        let wage_factor = wage_growth_factor(t, self.wage_increase, self.inflation);
        let loaded = wage_factor * (Decimal::ONE + self.payroll_tax_rate);

        let mut fte_by_role = Vec::with_capacity(self.roster.len());
        let mut payroll = Decimal::ZERO;
        let mut setup_opex = Decimal::ZERO;
        for (i, role) in self.roster.iter().enumerate() {
            let before = prev.get(i).copied().unwrap_or(Decimal::ZERO);
            let current = if t <= 1 {
                role.base_fte
            } else if role.base_fte > Decimal::ZERO && self.base_total > Decimal::ZERO {
                let required = target_total * role.base_fte / self.base_total;
                required.max(before)
            } else {
                before
            };
            payroll += role.annual_salary * current * loaded;
            setup_opex += (current - before).max(Decimal::ZERO) * role.setup_cost;
            fte_by_role.push(current);
        }
        HeadcountYear {
            fte_by_role,
            payroll,
            setup_opex,
        }
    }

    /// Pair FTE counts with role titles for reporting.
    pub fn label(&self, fte_by_role: &[Decimal]) -> Vec<RoleHeadcount> {
        self.roster
            .iter()
            .zip(fte_by_role)
            .map(|(r, fte)| RoleHeadcount {
                title: r.title.clone(),
                fte: *fte,
            })
            .collect()
    }
}
