#![deny(warnings)]

//! Persistence layer: scenario files and projection exports.
//!
//! Scenarios are flat JSON (or YAML) objects whose scalar keys are the
//! parameter names and whose `jobs_data`, `products_data`,
//! `cost_centers_data` and `assets_data` keys hold the tables. Projections
//! export as JSON or as a CSV table with one row per year.

use plan_core::ScenarioParameters;
use plan_engine::{Projection, YearRecord};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Decimal places written to CSV cells.
pub const CSV_DECIMALS: u32 = 2;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported scenario format: {0}")]
    UnsupportedFormat(String),
}

/// On-disk encoding of a scenario file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioFormat {
    Json,
    Yaml,
}

impl ScenarioFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, PersistError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(PersistError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub fn scenario_to_json(p: &ScenarioParameters) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(p)?)
}

pub fn scenario_from_json(text: &str) -> Result<ScenarioParameters, PersistError> {
    Ok(serde_json::from_str(text)?)
}

pub fn scenario_to_yaml(p: &ScenarioParameters) -> Result<String, PersistError> {
    Ok(serde_yaml::to_string(p)?)
}

pub fn scenario_from_yaml(text: &str) -> Result<ScenarioParameters, PersistError> {
    Ok(serde_yaml::from_str(text)?)
}

/// Read a scenario file, JSON or YAML by extension.
pub fn load_scenario(path: &Path) -> Result<ScenarioParameters, PersistError> {
    let format = ScenarioFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let params = match format {
        ScenarioFormat::Json => scenario_from_json(&text)?,
        ScenarioFormat::Yaml => scenario_from_yaml(&text)?,
    };
    info!(path = %path.display(), "loaded scenario");
    Ok(params)
}

/// Write a scenario file, JSON or YAML by extension.
pub fn save_scenario(path: &Path, p: &ScenarioParameters) -> Result<(), PersistError> {
    let text = match ScenarioFormat::from_path(path)? {
        ScenarioFormat::Json => scenario_to_json(p)?,
        ScenarioFormat::Yaml => scenario_to_yaml(p)?,
    };
    fs::write(path, text)?;
    info!(path = %path.display(), "saved scenario");
    Ok(())
}

pub fn projection_to_json(proj: &Projection) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(proj)?)
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn csv_number(d: Decimal) -> String {
    d.round_dp_with_strategy(CSV_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

const YEAR_COLUMNS: &[(&str, fn(&YearRecord) -> Decimal)] = &[
    ("customers", |y| y.customers),
    ("revenue", |y| y.revenue),
    ("fte_total", |y| y.fte_total),
    ("payroll", |y| y.payroll),
    ("setup_opex", |y| y.setup_opex),
    ("cogs", |y| y.cogs),
    ("marketing", |y| y.marketing),
    ("cost_centers", |y| y.cost_centers),
    ("consulting", |y| y.consulting),
    ("misc_opex", |y| y.misc_opex),
    ("other_opex", |y| y.other_opex),
    ("opex_total", |y| y.opex_total),
    ("ebitda", |y| y.ebitda),
    ("ebitda_margin", |y| y.ebitda_margin),
    ("depreciation", |y| y.depreciation),
    ("ebit", |y| y.ebit),
    ("interest", |y| y.interest),
    ("ebt", |y| y.ebt),
    ("tax", |y| y.tax),
    ("loss_carryforward", |y| y.loss_carryforward),
    ("net_income", |y| y.net_income),
    ("capex", |y| y.capex),
    ("receivables", |y| y.receivables),
    ("payables", |y| y.payables),
    ("operating_cashflow", |y| y.operating_cashflow),
    ("borrowing", |y| y.borrowing),
    ("repayment", |y| y.repayment),
    ("cash", |y| y.cash),
    ("debt", |y| y.debt),
    ("fixed_assets", |y| y.fixed_assets),
    ("equity", |y| y.equity),
    ("total_assets", |y| y.total_assets),
    ("total_liabilities_and_equity", |y| y.total_liabilities_and_equity),
    ("balance_residual", |y| y.balance_residual),
];

/// Yearly table as CSV: `year`, one `fte_<title>` column per role, then the figures.
pub fn projection_to_csv(proj: &Projection) -> String {
    let titles: Vec<&str> = proj
        .years
        .first()
        .map(|y| y.fte_by_role.iter().map(|r| r.title.as_str()).collect())
        .unwrap_or_default();

    let mut header = vec!["year".to_string()];
    header.extend(titles.iter().map(|t| csv_field(&format!("fte_{t}"))));
    header.extend(YEAR_COLUMNS.iter().map(|(name, _)| name.to_string()));

    let mut out = header.join(",");
    out.push('\n');
    for y in &proj.years {
        let mut row = vec![y.year.to_string()];
        row.extend(y.fte_by_role.iter().map(|r| csv_number(r.fte)));
        row.extend(YEAR_COLUMNS.iter().map(|(_, get)| csv_number(get(y))));
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Per-year, per-type asset investment and depreciation log as CSV.
pub fn asset_log_to_csv(proj: &Projection) -> String {
    let mut out = String::from("year,equipment,needed,in_service,purchased,capex,depreciation\n");
    for e in &proj.asset_log {
        let row = [
            e.year.to_string(),
            csv_field(&e.equipment),
            csv_number(e.needed),
            csv_number(e.in_service),
            csv_number(e.purchased),
            csv_number(e.capex),
            csv_number(e.depreciation),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn write_projection_json(path: &Path, proj: &Projection) -> Result<(), PersistError> {
    fs::write(path, projection_to_json(proj)?)?;
    info!(path = %path.display(), "wrote projection json");
    Ok(())
}

pub fn write_projection_csv(path: &Path, proj: &Projection) -> Result<(), PersistError> {
    fs::write(path, projection_to_csv(proj))?;
    info!(path = %path.display(), "wrote projection csv");
    Ok(())
}

pub fn write_asset_log_csv(path: &Path, proj: &Projection) -> Result<(), PersistError> {
    fs::write(path, asset_log_to_csv(proj))?;
    info!(path = %path.display(), entries = proj.asset_log.len(), "wrote asset log csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_engine::simulate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("venture-plan-{}-{name}", std::process::id()))
    }

    #[test]
    fn json_roundtrip_is_identical_and_reproduces_output() {
        let p = ScenarioParameters {
            use_product_mix: true,
            starting_debt: dec!(25000),
            ..Default::default()
        };
        let text = scenario_to_json(&p).unwrap();
        let back = scenario_from_json(&text).unwrap();
        assert_eq!(back, p);
        assert_eq!(scenario_to_json(&back).unwrap(), text);
        assert_eq!(
            projection_to_json(&simulate(&p)).unwrap(),
            projection_to_json(&simulate(&back)).unwrap()
        );
    }

    #[test]
    fn yaml_roundtrip() {
        let p = ScenarioParameters::default();
        let back = scenario_from_yaml(&scenario_to_yaml(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn ui_style_json_with_strings_and_blanks() {
        let text = r#"{
            "sam": "39000",
            "target_share": 0.023,
            "arpu": "",
            "churn_rate": "NaN",
            "jobs_data": [
                {"title": "Founder", "annual_salary": 60000, "base_fte": "1", "equipment": ["laptop"]}
            ],
            "products_data": [],
            "cost_centers_data": [{"name": "Rent", "base_value": "12000"}]
        }"#;
        let p = scenario_from_json(text).unwrap();
        assert_eq!(p.sam, dec!(39000));
        assert_eq!(p.arpu, Decimal::ZERO);
        assert_eq!(p.churn_rate, Decimal::ZERO);
        assert_eq!(p.jobs_data[0].base_fte, dec!(1));
        assert_eq!(p.cost_centers_data[0].revenue_coupling, Decimal::ZERO);
        // zero ARPU is degenerate but still simulates
        let proj = simulate(&p);
        assert_eq!(proj.years.len(), 10);
        assert!(proj.is_balanced());
    }

    #[test]
    fn csv_has_role_columns_and_one_row_per_year() {
        let proj = simulate(&ScenarioParameters::default());
        let csv = projection_to_csv(&proj);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with("year,fte_Managing Director,fte_Executives,"));
        assert!(lines[0].ends_with(",balance_residual"));
        let cols = lines[0].split(',').count();
        assert!(lines.iter().all(|l| l.split(',').count() == cols));
        assert!(lines[1].starts_with("1,0,1,0.25,0.5,0.13,0.13,10,30000,"));
    }

    #[test]
    fn asset_log_csv_lists_types() {
        let proj = simulate(&ScenarioParameters::default());
        let csv = asset_log_to_csv(&proj);
        assert!(csv.lines().nth(1).unwrap().starts_with("1,car,2,0,2,60000,10000"));
        assert!(csv.contains("\n1,misc,1,0,1,2000,"));
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("IT, Licences"), "\"IT, Licences\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn files_roundtrip_by_extension() {
        let p = ScenarioParameters::default();
        for name in ["scenario.json", "scenario.yaml"] {
            let path = scratch(name);
            save_scenario(&path, &p).unwrap();
            assert_eq!(load_scenario(&path).unwrap(), p);
            let _ = fs::remove_file(&path);
        }
        assert!(matches!(
            load_scenario(Path::new("scenario.toml")),
            Err(PersistError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn exports_write_files() {
        let proj = simulate(&ScenarioParameters::default());
        let json = scratch("projection.json");
        let csv = scratch("projection.csv");
        let assets = scratch("assets.csv");
        write_projection_json(&json, &proj).unwrap();
        write_projection_csv(&csv, &proj).unwrap();
        write_asset_log_csv(&assets, &proj).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(parsed["years"].as_array().unwrap().len(), 10);
        assert_eq!(fs::read_to_string(&csv).unwrap().lines().count(), 11);
        assert_eq!(
            fs::read_to_string(&assets).unwrap().lines().count(),
            proj.asset_log.len() + 1
        );
        let _ = fs::remove_file(&json);
        let _ = fs::remove_file(&csv);
        let _ = fs::remove_file(&assets);
    }

    proptest! {
        #[test]
        fn scalar_roundtrip(sam in 0u64..10_000_000, share in 0u32..1000, life in 1u32..20) {
            let p = ScenarioParameters {
                sam: Decimal::from(sam),
                target_share: Decimal::new(share as i64, 3),
                misc_capex_useful_life: life,
                ..Default::default()
            };
            let back = scenario_from_json(&scenario_to_json(&p).unwrap()).unwrap();
            prop_assert_eq!(back, p);
        }
    }
}
