//! Append-only asset register with straight-line depreciation.
//!
//! Lots are never edited or removed. A lot is in service in year `t` iff
//! `0 <= t - year < useful_life`; once it ages out it stops counting toward
//! holdings and depreciation, which forces a replacement purchase if the
//! equipment is still needed.

use plan_core::{AssetSpec, RoleSpec, MISC_ASSET_TYPE};
use rust_decimal::Decimal;
use serde::Serialize;

/// One immutable purchase record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetLot {
    pub equipment: String,
    pub year: u32,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_cost: Decimal,
    /// Always >= 1.
    pub useful_life: u32,
}

impl AssetLot {
    fn new(equipment: &str, year: u32, quantity: Decimal, unit_price: Decimal, life: u32) -> Self {
        Self {
            equipment: equipment.to_string(),
            year,
            quantity,
            unit_price,
            total_cost: quantity * unit_price,
            useful_life: life.max(1),
        }
    }

    pub fn in_service(&self, t: u32) -> bool {
        t >= self.year && t - self.year < self.useful_life
    }

    pub fn annual_depreciation(&self) -> Decimal {
        self.total_cost / Decimal::from(self.useful_life)
    }

    /// Straight-line charge for year `t`, zero outside the service window.
    pub fn depreciation_in(&self, t: u32) -> Decimal {
        if self.in_service(t) {
            self.annual_depreciation()
        } else {
            Decimal::ZERO
        }
    }
}

/// Every lot bought during a run, in purchase order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AssetRegister {
    lots: Vec<AssetLot>,
}

impl AssetRegister {
    pub fn lots(&self) -> &[AssetLot] {
        &self.lots
    }

    pub fn lots_of<'a>(&'a self, equipment: &'a str) -> impl Iterator<Item = &'a AssetLot> + 'a {
        self.lots.iter().filter(move |l| l.equipment == equipment)
    }

    /// Units of `equipment` in service in year `t`.
    pub fn in_service(&self, equipment: &str, t: u32) -> Decimal {
        self.lots_of(equipment)
            .filter(|l| l.in_service(t))
            .map(|l| l.quantity)
            .sum()
    }

    /// Depreciation of `equipment` lots in year `t`.
    pub fn depreciation_of(&self, equipment: &str, t: u32) -> Decimal {
        self.lots_of(equipment).map(|l| l.depreciation_in(t)).sum()
    }

    /// Depreciation over all lots in year `t`.
    pub fn depreciation(&self, t: u32) -> Decimal {
        self.lots.iter().map(|l| l.depreciation_in(t)).sum()
    }

    fn append(&mut self, lot: AssetLot) {
        self.lots.push(lot);
    }
}

/// Per-type line of the yearly investment log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetYearEntry {
    pub year: u32,
    pub equipment: String,
    pub needed: Decimal,
    /// Units in service before this year's purchase.
    pub in_service: Decimal,
    pub purchased: Decimal,
    pub capex: Decimal,
    pub depreciation: Decimal,
}

/// Capex and depreciation of one year.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapexYear {
    pub capex: Decimal,
    pub depreciation: Decimal,
    pub entries: Vec<AssetYearEntry>,
}

/// Fixed yearly capex booked regardless of need.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MiscCapex {
    pub amount: Decimal,
    pub useful_life: u32,
}

/// Units needed per catalog type: `ceil(sum of FTEs of roles listing that type)`.
/// Equipment names missing from the catalog are ignored.
pub fn equipment_needs(
    roster: &[RoleSpec],
    fte_by_role: &[Decimal],
    catalog: &[AssetSpec],
) -> Vec<(String, Decimal)> {
    catalog
        .iter()
        .map(|asset| {
            let fte: Decimal = roster
                .iter()
                .zip(fte_by_role)
                .filter(|(r, _)| r.equipment.iter().any(|e| *e == asset.equipment))
                .map(|(_, fte)| *fte)
                .sum();
            (asset.equipment.clone(), fte.ceil())
        })
        .collect()
}

/// Top up every catalog type to its need, book the misc lot, and charge the year's depreciation.
pub fn replenish_and_depreciate(
    needs: &[(String, Decimal)],
    catalog: &[AssetSpec],
    misc: MiscCapex,
    register: &mut AssetRegister,
    t: u32,
) -> CapexYear {
    let mut year = CapexYear::default();
    for asset in catalog {
        let needed = needs
            .iter()
            .find(|(e, _)| *e == asset.equipment)
            .map(|(_, n)| *n)
            .unwrap_or(Decimal::ZERO);
        let in_service = register.in_service(&asset.equipment, t);
        let to_buy = (needed - in_service).max(Decimal::ZERO);
        let mut capex = Decimal::ZERO;
        if to_buy > Decimal::ZERO {
            let lot = AssetLot::new(
                &asset.equipment,
                t,
                to_buy,
                asset.unit_price,
                asset.useful_life_years,
            );
            capex = lot.total_cost;
            register.append(lot);
        }
        year.capex += capex;
        year.entries.push(AssetYearEntry {
            year: t,
            equipment: asset.equipment.clone(),
            needed,
            in_service,
            purchased: to_buy,
            capex,
            depreciation: Decimal::ZERO,
        });
    }

    if misc.amount > Decimal::ZERO {
        let in_service = register.in_service(MISC_ASSET_TYPE, t);
        let lot = AssetLot::new(MISC_ASSET_TYPE, t, Decimal::ONE, misc.amount, misc.useful_life);
        year.capex += lot.total_cost;
        register.append(lot);
        year.entries.push(AssetYearEntry {
            year: t,
            equipment: MISC_ASSET_TYPE.to_string(),
            needed: Decimal::ONE,
            in_service,
            purchased: Decimal::ONE,
            capex: misc.amount,
            depreciation: Decimal::ZERO,
        });
    }

    for entry in &mut year.entries {
        entry.depreciation = register.depreciation_of(&entry.equipment, t);
    }
    year.depreciation = register.depreciation(t);
    year
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn laptop(life: u32) -> Vec<AssetSpec> {
        vec![AssetSpec {
            equipment: "laptop".to_string(),
            unit_price: dec!(1500),
            useful_life_years: life,
        }]
    }

    const NO_MISC: MiscCapex = MiscCapex {
        amount: Decimal::ZERO,
        useful_life: 1,
    };

    fn need(n: Decimal) -> Vec<(String, Decimal)> {
        vec![("laptop".to_string(), n)]
    }

    #[test]
    fn needs_round_up_fractional_fte() {
        let roster = plan_core::ScenarioParameters::default().jobs_data;
        let fte: Vec<Decimal> = roster.iter().map(|r| r.base_fte).collect();
        let catalog = plan_core::ScenarioParameters::default().assets_data;
        let needs = equipment_needs(&roster, &fte, &catalog);
        // cars: MD 0 + Exec 1 + Field 0.25
        assert_eq!(needs[0], ("car".to_string(), dec!(2)));
        assert_eq!(needs[1], ("laptop".to_string(), dec!(2)));
    }

    #[test]
    fn buys_only_the_shortfall() {
        let catalog = laptop(3);
        let mut reg = AssetRegister::default();
        let y1 = replenish_and_depreciate(&need(dec!(2)), &catalog, NO_MISC, &mut reg, 1);
        assert_eq!(y1.capex, dec!(3000));
        assert_eq!(y1.depreciation, dec!(1000));
        let y2 = replenish_and_depreciate(&need(dec!(3)), &catalog, NO_MISC, &mut reg, 2);
        assert_eq!(y2.entries[0].in_service, dec!(2));
        assert_eq!(y2.capex, dec!(1500));
        assert_eq!(y2.depreciation, dec!(1500));
        assert_eq!(reg.lots().len(), 2);
    }

    #[test]
    fn expired_lots_are_replaced() {
        let catalog = laptop(2);
        let mut reg = AssetRegister::default();
        replenish_and_depreciate(&need(dec!(1)), &catalog, NO_MISC, &mut reg, 1);
        let y2 = replenish_and_depreciate(&need(dec!(1)), &catalog, NO_MISC, &mut reg, 2);
        assert_eq!(y2.capex, Decimal::ZERO);
        let y3 = replenish_and_depreciate(&need(dec!(1)), &catalog, NO_MISC, &mut reg, 3);
        assert_eq!(y3.entries[0].in_service, Decimal::ZERO);
        assert_eq!(y3.capex, dec!(1500));
        assert_eq!(y3.depreciation, dec!(750));
    }

    #[test]
    fn misc_lot_is_booked_every_year() {
        let misc = MiscCapex {
            amount: dec!(2000),
            useful_life: 4,
        };
        let mut reg = AssetRegister::default();
        for t in 1..=3 {
            let y = replenish_and_depreciate(&[], &[], misc, &mut reg, t);
            assert_eq!(y.capex, dec!(2000));
            assert_eq!(y.depreciation, dec!(500) * Decimal::from(t));
        }
        assert_eq!(reg.lots_of(MISC_ASSET_TYPE).count(), 3);
    }

    #[test]
    fn zero_life_depreciates_in_one_year() {
        let catalog = laptop(0);
        let mut reg = AssetRegister::default();
        let y1 = replenish_and_depreciate(&need(dec!(1)), &catalog, NO_MISC, &mut reg, 1);
        assert_eq!(y1.depreciation, dec!(1500));
        assert_eq!(reg.lots()[0].useful_life, 1);
    }

    proptest! {
        #[test]
        fn lot_depreciates_for_exactly_its_life(year in 1u32..10, life in 1u32..12, qty in 1u32..50) {
            let lot = AssetLot::new("laptop", year, Decimal::from(qty), dec!(999), life);
            let mut years_charged = 0u32;
            let mut total = Decimal::ZERO;
            for t in 1..=30 {
                let d = lot.depreciation_in(t);
                if d > Decimal::ZERO {
                    prop_assert!(t >= year && t < year + life);
                    years_charged += 1;
                }
                total += d;
            }
            prop_assert_eq!(years_charged, life);
            prop_assert!((total - lot.total_cost).abs() < dec!(0.000001));
        }
    }
}
