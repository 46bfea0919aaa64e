//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for backtest results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: portfolio value series and calendar-year returns, one column per portfolio
//! - **Markdown**: single-vintage reports and cross-vintage comparisons
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use glidepath_core::{AssetId, Horizon, SeedStrategy};

use crate::metrics::{PerformanceMetrics, YearReturn};
use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::VintageComparison;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Serialize every vintage of a comparison as one JSON object keyed by vintage.
pub fn export_comparison_json(comparison: &VintageComparison) -> Result<String> {
    let by_vintage: BTreeMap<&str, &BacktestResult> = comparison
        .results
        .iter()
        .map(|(id, r)| (id.as_str(), r.as_ref()))
        .collect();
    serde_json::to_string_pretty(&by_vintage).context("failed to serialize comparison to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export portfolio values as CSV: `period` followed by one column per portfolio.
///
/// The first row is the common base value, labelled `base`.
pub fn export_series_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let outcomes: Vec<_> = result.portfolios.values().collect();

    let mut header = vec!["period".to_string()];
    header.extend(outcomes.iter().map(|o| o.name.clone()));
    wtr.write_record(&header)?;

    let mut row = vec!["base".to_string()];
    row.extend(outcomes.iter().map(|o| format!("{:.6}", o.series.base_value)));
    wtr.write_record(&row)?;

    let periods = outcomes.first().map_or(0, |o| o.series.len());
    for i in 0..periods {
        let label = outcomes[0].series.points[i].label();
        let mut row = vec![label];
        for o in &outcomes {
            let value = o.series.points.get(i).map_or(f64::NAN, |p| p.value);
            row.push(format!("{value:.6}"));
        }
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export calendar-year returns (percent) as CSV: `year` followed by one column per portfolio.
pub fn export_annual_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let names: Vec<&str> = result.portfolio_names().collect();

    let mut header = vec!["year"];
    header.extend(names.iter().copied());
    wtr.write_record(&header)?;

    for (year, by_portfolio) in &result.annual_returns {
        let mut row = vec![year.to_string()];
        for name in &names {
            row.push(
                by_portfolio
                    .get(*name)
                    .map_or_else(String::new, |r| format!("{:.4}", r * 100.0)),
            );
        }
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single vintage run.
///
/// Creates a directory named `{vintage}_{timestamp}/` under `output_dir`
/// containing:
/// - `result.json`: the full `BacktestResult`
/// - `series.csv`: monthly portfolio values
/// - `annual.csv`: calendar-year returns
/// - `report.md`: Markdown report
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("{}_{}", sanitize(&result.vintage_id), timestamp());
    let run_dir = output_dir.join(dirname);
    write_bundle(result, &run_dir)?;
    tracing::info!(vintage = %result.vintage_id, dir = %run_dir.display(), "saved artifacts");
    Ok(run_dir)
}

/// Save artifacts for every vintage of a comparison.
///
/// Creates `{scenario}_{timestamp}/` with `comparison.md`, `comparison.json`,
/// and one bundle subdirectory per vintage.
pub fn save_comparison_artifacts(
    comparison: &VintageComparison,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!("{}_{}", sanitize(&comparison.scenario), timestamp());
    let root = output_dir.join(dirname);
    std::fs::create_dir_all(&root)
        .with_context(|| format!("failed to create artifact dir: {}", root.display()))?;

    std::fs::write(root.join("comparison.md"), generate_vintage_comparison(comparison))?;
    std::fs::write(root.join("comparison.json"), export_comparison_json(comparison)?)?;
    for (id, result) in &comparison.results {
        write_bundle(result, &root.join(sanitize(id)))?;
    }

    tracing::info!(
        scenario = %comparison.scenario,
        vintages = comparison.len(),
        dir = %root.display(),
        "saved comparison artifacts"
    );
    Ok(root)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_bundle(result: &BacktestResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create artifact dir: {}", dir.display()))?;
    std::fs::write(dir.join("result.json"), export_json(result)?)?;
    std::fs::write(dir.join("series.csv"), export_series_csv(result)?)?;
    std::fs::write(dir.join("annual.csv"), export_annual_csv(result)?)?;
    std::fs::write(dir.join("report.md"), generate_report(result))?;
    Ok(())
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for a single vintage run.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(4096);
    let names: Vec<&str> = result.portfolio_names().collect();

    md.push_str(&format!("# Vintage {} Backtest\n\n", result.vintage_id));

    // Metadata
    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Period | {} |\n", horizon_label(&result.horizon)));
    md.push_str(&format!("| Seed | {} |\n", seed_label(&result.seed)));
    md.push_str(&format!("| Scenario Hash | {} |\n", result.scenario_hash.short()));
    md.push_str(&format!("| Schema | v{} |\n", result.schema_version));
    md.push('\n');

    // Allocations
    let assets: BTreeSet<&AssetId> = result
        .portfolios
        .values()
        .flat_map(|o| o.weights.assets())
        .collect();
    md.push_str("## Allocations\n\n");
    md.push_str(&table_header("Asset | Label", &names, true));
    md.push_str(" Volatility |\n");
    md.push_str(&table_rule(names.len() + 2));
    for asset in assets {
        let label = result.asset_labels.get(asset).map_or(asset.as_str(), String::as_str);
        md.push_str(&format!("| {asset} | {label} |"));
        for o in result.portfolios.values() {
            match o.weights.get(asset.as_str()) {
                Some(w) => md.push_str(&format!(" {w:.1}% |")),
                None => md.push_str(" - |"),
            }
        }
        let vol = result.volatility.get(asset).copied().unwrap_or_default();
        md.push_str(&format!(" {:.2}% |\n", vol * 100.0));
    }
    md.push('\n');

    // Performance Summary
    md.push_str("## Performance Summary\n\n");
    md.push_str(&table_header("Metric", &names, false));
    md.push_str(&table_rule(names.len()));
    let rows: [(&str, fn(&PerformanceMetrics) -> String); 7] = [
        ("Final Value", |m| format!("{:.2}", m.final_value)),
        ("Total Return", |m| format!("{:.2}%", m.total_return * 100.0)),
        ("CAGR", |m| format!("{:.2}%", m.cagr * 100.0)),
        ("Max Drawdown", |m| format!("{:.2}%", m.max_drawdown_pct)),
        ("Volatility (ann.)", |m| format!("{:.2}%", m.annualized_volatility_pct)),
        ("Best Year", |m| year_label(m.best_year)),
        ("Worst Year", |m| year_label(m.worst_year)),
    ];
    for (label, cell) in rows {
        md.push_str(&format!("| {label} |"));
        for o in result.portfolios.values() {
            md.push_str(&format!(" {} |", cell(&o.metrics)));
        }
        md.push('\n');
    }
    md.push('\n');

    // Annual Returns
    md.push_str("## Annual Returns\n\n");
    md.push_str(&table_header("Year", &names, false));
    md.push_str(&table_rule(names.len()));
    for (year, by_portfolio) in &result.annual_returns {
        let partial = *year == result.horizon.end_year && result.horizon.is_partial();
        if partial {
            md.push_str(&format!("| {year} (YTD) |"));
        } else {
            md.push_str(&format!("| {year} |"));
        }
        for name in &names {
            match by_portfolio.get(*name) {
                Some(r) => md.push_str(&format!(" {:.2}% |", r * 100.0)),
                None => md.push_str(" - |"),
            }
        }
        md.push('\n');
    }

    md
}

/// Generate a Markdown comparison of every vintage in a sweep.
pub fn generate_vintage_comparison(comparison: &VintageComparison) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# Vintage Comparison: {}\n\n", comparison.scenario));

    if let Some(first) = comparison.results.values().next() {
        md.push_str(&format!("Period: {}\n\n", horizon_label(&first.horizon)));
    }

    md.push_str("| Vintage | Portfolio | Final Value | Total Return | CAGR | Max Drawdown |\n");
    md.push_str("| --- | --- | ---: | ---: | ---: | ---: |\n");
    for (id, result) in &comparison.results {
        for outcome in result.portfolios.values() {
            let m = &outcome.metrics;
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.2}% | {:.2}% | {:.2}% |\n",
                id,
                outcome.name,
                m.final_value,
                m.total_return * 100.0,
                m.cagr * 100.0,
                m.max_drawdown_pct,
            ));
        }
    }
    md.push('\n');

    // Current vs prior delta per vintage, when both exist
    let deltas: Vec<(&str, f64)> = comparison
        .results
        .iter()
        .filter_map(|(id, r)| {
            let current = r.portfolio("current")?;
            let prior = r.portfolio("prior")?;
            Some((
                id.as_str(),
                current.metrics.final_value - prior.metrics.final_value,
            ))
        })
        .collect();
    if !deltas.is_empty() {
        md.push_str("## Current vs Prior\n\n");
        md.push_str("| Vintage | Final Value Delta |\n");
        md.push_str("| --- | ---: |\n");
        for (id, delta) in deltas {
            md.push_str(&format!("| {id} | {delta:+.2} |\n"));
        }
        md.push('\n');
    }

    md
}

fn table_header(first: &str, names: &[&str], open: bool) -> String {
    let mut line = format!("| {first} |");
    for name in names {
        line.push_str(&format!(" {name} |"));
    }
    if !open {
        line.push('\n');
    }
    line
}

fn table_rule(value_columns: usize) -> String {
    let mut line = String::from("| --- |");
    for _ in 0..value_columns {
        line.push_str(" ---: |");
    }
    line.push('\n');
    line
}

fn horizon_label(h: &Horizon) -> String {
    format!(
        "{:04}-01 to {:04}-{:02} ({} months)",
        h.start_year,
        h.end_year,
        h.final_year_months,
        h.period_count()
    )
}

fn seed_label(seed: &SeedStrategy) -> String {
    match seed {
        SeedStrategy::AnnualReturn => "annual return".to_string(),
        SeedStrategy::Composite { master_seed } => format!("composite (master seed {master_seed})"),
    }
}

fn year_label(y: Option<YearReturn>) -> String {
    y.map_or_else(|| "-".to_string(), |y| format!("{} ({:.2}%)", y.year, y.value * 100.0))
}
