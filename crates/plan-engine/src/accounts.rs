//! P&L, working capital, cash sweep and balance sheet: one state transition per year.

use plan_core::ScenarioParameters;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Relative tolerance for the balance-sheet identity.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.000001);

/// Financing and tax settings of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinancingPolicy {
    pub starting_equity: Decimal,
    pub min_cash: Decimal,
    pub interest_rate: Decimal,
    pub tax_rate: Decimal,
    pub dso_days: Decimal,
    pub dpo_days: Decimal,
    pub use_loss_carryforward: bool,
}

impl FinancingPolicy {
    pub fn from_scenario(p: &ScenarioParameters) -> Self {
        Self {
            starting_equity: p.starting_equity,
            min_cash: p.min_cash,
            interest_rate: p.interest_rate,
            tax_rate: p.tax_rate,
            dso_days: p.dso_days,
            dpo_days: p.dpo_days,
            use_loss_carryforward: p.use_loss_carryforward,
        }
    }
}

/// Operating figures of a year, computed before financing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OperatingYear {
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub opex_total: Decimal,
    pub depreciation: Decimal,
    pub capex: Decimal,
}

/// Financial statements of a closed year.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FinancialYear {
    pub ebitda: Decimal,
    pub ebit: Decimal,
    pub interest: Decimal,
    pub ebt: Decimal,
    pub tax: Decimal,
    pub net_income: Decimal,
    pub loss_carryforward: Decimal,
    pub receivables: Decimal,
    pub payables: Decimal,
    pub operating_cashflow: Decimal,
    pub cash_before_financing: Decimal,
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

impl FinancialYear {
    /// Whether the residual is within tolerance relative to the balance sheet size.
    pub fn is_balanced(&self) -> bool {
        let scale = self.total_assets.abs().max(Decimal::ONE);
        self.balance_residual.abs() <= BALANCE_TOLERANCE * scale
    }
}

/// Balances carried from one year into the next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BalanceState {
    pub cash: Decimal,
    pub debt: Decimal,
    pub paid_in_equity: Decimal,
    pub retained_earnings: Decimal,
    pub loss_carryforward: Decimal,
    pub fixed_assets: Decimal,
    pub receivables: Decimal,
    pub payables: Decimal,
}

/// Tax on `ebt` and the carryforward balance afterwards.
///
/// Losses bank into the carryforward; profits first consume it. Without
/// carryforward, losses are simply untaxed.
pub fn apply_tax(
    ebt: Decimal,
    carryforward: Decimal,
    tax_rate: Decimal,
    use_carryforward: bool,
) -> (Decimal, Decimal) {
    if ebt <= Decimal::ZERO {
        let banked = if use_carryforward {
            carryforward + ebt.abs()
        } else {
            carryforward
        };
        return (Decimal::ZERO, banked);
    }
    if !use_carryforward {
        return (ebt * tax_rate, carryforward);
    }
    let offset = ebt.min(carryforward);
    ((ebt - offset) * tax_rate, carryforward - offset)
}

/// Borrow or repay so cash lands on `min_cash` where possible.
///
/// Returns `(borrowing, repayment)`. A shortfall is borrowed in full; a surplus
/// repays at most the outstanding debt.
pub fn sweep(cash_before_financing: Decimal, debt: Decimal, min_cash: Decimal) -> (Decimal, Decimal) {
    let gap = min_cash - cash_before_financing;
    if gap > Decimal::ZERO {
        (gap, Decimal::ZERO)
    } else {
        (Decimal::ZERO, debt.min(gap.abs()).max(Decimal::ZERO))
    }
}

impl BalanceState {
    /// Year-0 balances: the starting loan sits in cash; equity arrives in year 1.
    pub fn opening(p: &ScenarioParameters) -> Self {
        Self {
            cash: p.starting_debt,
            debt: p.starting_debt,
            ..Default::default()
        }
    }

    pub fn equity(&self) -> Decimal {
        self.paid_in_equity + self.retained_earnings
    }

    /// Close year `t`: income statement, working capital, financing, balance sheet.
    pub fn close_year(
        &mut self,
        op: &OperatingYear,
        policy: &FinancingPolicy,
        t: u32,
    ) -> FinancialYear {
        let ebitda = op.revenue - op.cogs - op.opex_total;
        let ebit = ebitda - op.depreciation;
        let interest = self.debt * policy.interest_rate;
        let ebt = ebit - interest;
        let (tax, loss_carryforward) = apply_tax(
            ebt,
            self.loss_carryforward,
            policy.tax_rate,
            policy.use_loss_carryforward,
        );
        let net_income = ebt - tax;

        let receivables = op.revenue * policy.dso_days / DAYS_PER_YEAR;
        let payables = op.opex_total * policy.dpo_days / DAYS_PER_YEAR;
        let operating_cashflow = net_income + op.depreciation - (receivables - self.receivables)
            + (payables - self.payables);

        let injection = if t <= 1 {
            policy.starting_equity
        } else {
            Decimal::ZERO
        };
        let cash_before_financing = self.cash + operating_cashflow - op.capex + injection;
        let (borrowing, repayment) = sweep(cash_before_financing, self.debt, policy.min_cash);
        let cash = cash_before_financing + borrowing - repayment;
        let debt = self.debt + borrowing - repayment;

        let fixed_assets = (self.fixed_assets + op.capex - op.depreciation).max(Decimal::ZERO);

        self.cash = cash;
        self.debt = debt;
        self.paid_in_equity += injection;
        self.retained_earnings += net_income;
        self.loss_carryforward = loss_carryforward;
        self.fixed_assets = fixed_assets;
        self.receivables = receivables;
        self.payables = payables;

        let equity = self.equity();
        let total_assets = cash + fixed_assets + receivables;
        let total_liabilities_and_equity = debt + payables + equity;
        FinancialYear {
            ebitda,
            ebit,
            interest,
            ebt,
            tax,
            net_income,
            loss_carryforward,
            receivables,
            payables,
            operating_cashflow,
            cash_before_financing,
            borrowing,
            repayment,
            cash,
            debt,
            fixed_assets,
            equity,
            total_assets,
            total_liabilities_and_equity,
            balance_residual: total_assets - total_liabilities_and_equity,
        }
    }
}
