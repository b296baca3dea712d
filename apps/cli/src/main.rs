#![deny(warnings)]

//! Headless CLI: run a scenario file through the projection engine and print the plan.

use anyhow::{bail, Result};
use persistence::{
    load_scenario, save_scenario, write_asset_log_csv, write_projection_csv, write_projection_json,
};
use plan_core::{validate_scenario, ScenarioParameters};
use plan_engine::{simulate, Projection};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    export_json: Option<PathBuf>,
    export_csv: Option<PathBuf>,
    export_assets: Option<PathBuf>,
    write_default: Option<PathBuf>,
    strict: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(raw: I) -> Result<Args> {
    let mut args = Args::default();
    let mut missing = Vec::new();
    let mut it = raw.into_iter();
    while let Some(arg) = it.next() {
        let slot = match arg.as_str() {
            "--scenario" => &mut args.scenario,
            "--export-json" => &mut args.export_json,
            "--export-csv" => &mut args.export_csv,
            "--export-assets" => &mut args.export_assets,
            "--write-default" => &mut args.write_default,
            "--strict" => {
                args.strict = true;
                continue;
            }
            other => {
                warn!(arg = other, "ignoring unknown argument");
                continue;
            }
        };
        match it.next() {
            Some(path) => *slot = Some(PathBuf::from(path)),
            None => missing.push(arg),
        }
    }
    for flag in &missing {
        if args.strict {
            bail!("{flag} needs a file path");
        }
        warn!(flag = %flag, "ignoring flag without a file path");
    }
    Ok(args)
}

fn print_table(proj: &Projection) {
    println!(
        "{:>4} {:>9} {:>13} {:>8} {:>13} {:>13} {:>13} {:>13} {:>13}",
        "year", "customers", "revenue", "fte", "ebitda", "net income", "cash", "debt", "residual"
    );
    for y in &proj.years {
        println!(
            "{:>4} {:>9.1} {:>13.0} {:>8.2} {:>13.0} {:>13.0} {:>13.0} {:>13.0} {:>13.6}",
            y.year,
            y.customers,
            y.revenue,
            y.fte_total,
            y.ebitda,
            y.net_income,
            y.cash,
            y.debt,
            y.balance_residual
        );
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(?args, sha = env!("GIT_SHA"), "starting CLI");

    if let Some(path) = &args.write_default {
        save_scenario(path, &ScenarioParameters::default())?;
        println!("Wrote default scenario to {}", path.display());
        return Ok(());
    }

    let params = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => ScenarioParameters::default(),
    };
    if let Err(e) = validate_scenario(&params) {
        if args.strict {
            bail!("invalid scenario: {e}");
        }
        warn!(error = %e, "scenario failed validation; running with fallbacks");
    }

    let proj = simulate(&params);
    print_table(&proj);

    if let Some(last) = proj.final_year() {
        println!(
            "KPI | years: {} | revenue: ${:.0} | EBITDA margin: {:.1}% | FTE: {:.1} | break-even: {} | peak debt: ${:.0} | cumulative net income: ${:.0}",
            proj.years.len(),
            last.revenue,
            last.ebitda_margin * rust_decimal::Decimal::ONE_HUNDRED,
            last.fte_total,
            proj.break_even_year()
                .map(|y| format!("year {y}"))
                .unwrap_or_else(|| "none".to_string()),
            proj.peak_debt(),
            proj.cumulative_net_income()
        );
    }
    for d in &proj.diagnostics {
        println!("diagnostic: {d}");
    }
    if !proj.is_balanced() {
        warn!("balance sheet did not close in every year");
    }

    if let Some(path) = &args.export_json {
        write_projection_json(path, &proj)?;
    }
    if let Some(path) = &args.export_csv {
        write_projection_csv(path, &proj)?;
    }
    if let Some(path) = &args.export_assets {
        write_asset_log_csv(path, &proj)?;
    }
    Ok(())
}
