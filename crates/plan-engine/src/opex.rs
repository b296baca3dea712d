//! Operating expense drivers other than payroll.

use plan_core::{CostCenterSpec, CostDriver, ScenarioParameters};
use plan_econ::inflation_factor;
use rust_decimal::Decimal;

/// Non-payroll opex of one year.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OpexBreakdown {
    pub marketing: Decimal,
    pub cost_centers: Decimal,
    pub consulting: Decimal,
    pub misc: Decimal,
}

impl OpexBreakdown {
    /// Everything except payroll and hiring setup costs.
    pub fn other(&self) -> Decimal {
        self.cost_centers + self.consulting + self.misc
    }
}

/// Cost of one center in year `t`.
///
/// Revenue-driven centers keep `1 - coupling` of the base fixed (inflated) and
/// scale the coupled part with `revenue / revenue_year1`. Headcount-driven
/// centers charge the inflated base per FTE.
pub fn cost_center_cost(
    center: &CostCenterSpec,
    t: u32,
    revenue: Decimal,
    revenue_year1: Decimal,
    total_fte: Decimal,
    inflation: Decimal,
) -> Decimal {
    let infl = inflation_factor(t, inflation);
    match center.driver {
        CostDriver::Revenue => {
            let growth = if revenue_year1 > Decimal::ZERO {
                revenue / revenue_year1
            } else {
                Decimal::ONE
            };
            let fixed = center.base_value * (Decimal::ONE - center.revenue_coupling) * infl;
            let coupled = center.base_value * center.revenue_coupling * growth;
            fixed + coupled
        }
        CostDriver::Headcount => center.base_value * total_fte * infl,
    }
}

/// Marketing, cost centers, consulting and misc opex for year `t`.
pub fn operating_costs(
    params: &ScenarioParameters,
    t: u32,
    customers: Decimal,
    revenue: Decimal,
    revenue_year1: Decimal,
    total_fte: Decimal,
) -> OpexBreakdown {
    let cost_centers = params
        .cost_centers_data
        .iter()
        .map(|c| cost_center_cost(c, t, revenue, revenue_year1, total_fte, params.inflation))
        .sum();
    OpexBreakdown {
        marketing: customers * params.cac,
        cost_centers,
        consulting: revenue * params.consulting_pct,
        misc: if t <= 1 {
            params.misc_opex_year1
        } else {
            params.misc_opex_recurring
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn center(driver: CostDriver, coupling: Decimal) -> CostCenterSpec {
        CostCenterSpec {
            name: "c".to_string(),
            base_value: dec!(1000),
            revenue_coupling: coupling,
            driver,
        }
    }

    #[test]
    fn revenue_coupling_blends_fixed_and_variable() {
        let c = center(CostDriver::Revenue, dec!(0.5));
        assert_eq!(
            cost_center_cost(&c, 1, dec!(100), dec!(100), dec!(3), dec!(0.1)),
            dec!(1000)
        );
        // 500 * 1.1 fixed + 500 * 3 coupled
        assert_eq!(
            cost_center_cost(&c, 2, dec!(300), dec!(100), dec!(3), dec!(0.1)),
            dec!(2050)
        );
        // zero year-1 revenue keeps the coupled part flat
        assert_eq!(
            cost_center_cost(&c, 2, dec!(300), Decimal::ZERO, dec!(3), dec!(0.1)),
            dec!(1050)
        );
    }

    #[test]
    fn headcount_centers_charge_per_fte() {
        let c = center(CostDriver::Headcount, Decimal::ZERO);
        assert_eq!(
            cost_center_cost(&c, 3, dec!(1), dec!(1), dec!(2.5), dec!(0.1)),
            dec!(2500) * dec!(1.21)
        );
    }

    #[test]
    fn reference_year_one_opex() {
        let p = ScenarioParameters::default();
        let o = operating_costs(&p, 1, dec!(10), dec!(30000), dec!(30000), dec!(2));
        assert_eq!(o.marketing, dec!(35900));
        assert_eq!(o.consulting, dec!(1500));
        assert_eq!(o.misc, dec!(13000));
        // office 4044*2 + IT 1011*2 + insurance 6000
        assert_eq!(o.cost_centers, dec!(16110));
        assert_eq!(o.other(), dec!(30610));
    }
}
