//! Glidepath CLI: run, compare, and cache management commands.
//!
//! Commands:
//! - `run`: backtest one vintage of a scenario
//! - `compare`: backtest every vintage and print a side-by-side table
//! - `vintages`: list the vintages and portfolios a scenario defines
//! - `sample`: print the built-in sample scenario as TOML
//! - `cache status` / `cache clear`: inspect or empty the result cache

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use glidepath_core::SeedStrategy;
use glidepath_runner::export::{
    export_comparison_json, export_json, save_artifacts, save_comparison_artifacts,
};
use glidepath_runner::{
    BacktestOrchestrator, BacktestResult, ResultCache, Scenario, ScenarioConfig,
    VintageComparison, VintageSweep,
};

#[derive(Parser)]
#[command(
    name = "glidepath",
    version,
    about = "Glidepath CLI: synthetic-return backtests for target-date portfolios"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that load a scenario.
#[derive(clap::Args)]
struct ScenarioArgs {
    /// Path to a scenario TOML file. Without it the built-in sample is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the scenario's seed with a composite master seed.
    #[arg(long, conflicts_with = "legacy_seed")]
    master_seed: Option<u64>,

    /// Seed noise from the annual return values themselves.
    #[arg(long, default_value_t = false)]
    legacy_seed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one vintage.
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Vintage to run (e.g., 2040).
        #[arg(long)]
        vintage: String,

        /// Save result.json, series.csv, annual.csv and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Reuse results cached in this directory.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Backtest every vintage and compare them.
    Compare {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Save the comparison report and per-vintage bundles here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Reuse results cached in this directory.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Print all results as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Run vintages one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// List the vintages and portfolios a scenario defines.
    Vintages {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Print the built-in sample scenario as TOML.
    Sample {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Result cache commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report entry count and size of the result cache.
    Status {
        /// Cache directory.
        #[arg(long, default_value = ".glidepath-cache")]
        cache_dir: PathBuf,
    },
    /// Remove every cached result.
    Clear {
        /// Cache directory.
        #[arg(long, default_value = ".glidepath-cache")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            vintage,
            output_dir,
            cache_dir,
            json,
        } => run_cmd(&scenario, &vintage, output_dir, cache_dir, json),
        Commands::Compare {
            scenario,
            output_dir,
            cache_dir,
            json,
            sequential,
        } => compare_cmd(&scenario, output_dir, cache_dir, json, sequential),
        Commands::Vintages { scenario } => vintages_cmd(&scenario),
        Commands::Sample { output } => sample_cmd(output.as_deref()),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => cache_status(&cache_dir),
            CacheAction::Clear { cache_dir, confirm } => cache_clear(&cache_dir, confirm),
        },
    }
}

/// Log to stderr so `--json` output on stdout stays machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_scenario(args: &ScenarioArgs) -> Result<Scenario> {
    let mut config = match &args.config {
        Some(path) => ScenarioConfig::from_file(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => {
            tracing::warn!("no --config given, using the built-in sample scenario");
            ScenarioConfig::sample()
        }
    };

    if let Some(master_seed) = args.master_seed {
        config.seed = SeedStrategy::Composite { master_seed };
    } else if args.legacy_seed {
        config.seed = SeedStrategy::AnnualReturn;
    }

    config
        .to_scenario()
        .with_context(|| format!("invalid scenario '{}'", config.name))
}

fn orchestrator(scenario: Scenario, cache_dir: Option<PathBuf>) -> Result<BacktestOrchestrator> {
    let orch = BacktestOrchestrator::new(scenario);
    match cache_dir {
        Some(dir) => Ok(orch.with_result_cache(ResultCache::new(dir)?)),
        None => Ok(orch),
    }
}

fn run_cmd(
    args: &ScenarioArgs,
    vintage: &str,
    output_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let orch = orchestrator(load_scenario(args)?, cache_dir)?;
    let result = orch
        .run(vintage)
        .with_context(|| format!("backtest failed for vintage {vintage}"))?;

    if json {
        println!("{}", export_json(&result)?);
    } else {
        print_summary(&result);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        eprintln!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn compare_cmd(
    args: &ScenarioArgs,
    output_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    json: bool,
    sequential: bool,
) -> Result<()> {
    let orch = orchestrator(load_scenario(args)?, cache_dir)?;
    let comparison = VintageSweep::new(&orch)
        .with_parallelism(!sequential)
        .run_with_progress(|done, total, result| {
            tracing::info!(vintage = %result.vintage_id, "{done}/{total} vintages complete");
        })
        .context("vintage sweep failed")?;

    if json {
        println!("{}", export_comparison_json(&comparison)?);
    } else {
        print_comparison(&comparison);
    }

    if let Some(dir) = output_dir {
        let root = save_comparison_artifacts(&comparison, &dir)?;
        eprintln!("Artifacts saved to: {}", root.display());
    }
    Ok(())
}

fn vintages_cmd(args: &ScenarioArgs) -> Result<()> {
    let scenario = load_scenario(args)?;
    println!("Scenario: {}", scenario.name);
    println!(
        "Horizon:  {}-01 to {}-{:02}",
        scenario.params.horizon.start_year,
        scenario.params.horizon.end_year,
        scenario.params.horizon.final_year_months
    );
    println!();
    println!("{:<10} Portfolios", "Vintage");
    println!("{}", "-".repeat(40));
    for (id, set) in &scenario.vintages {
        let names: Vec<&str> = set.keys().map(String::as_str).collect();
        println!("{:<10} {}", id, names.join(", "));
    }
    Ok(())
}

fn sample_cmd(output: Option<&Path>) -> Result<()> {
    let toml = ScenarioConfig::sample().to_toml()?;
    match output {
        Some(path) => {
            std::fs::write(path, toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Sample scenario written to: {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}

fn cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ResultCache::new(cache_dir)?;
    let count = cache.len()?;
    if count == 0 {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    println!("Cache:      {}", cache_dir.display());
    println!("Results:    {count}");
    println!("Total size: {}", format_size(cache.size_bytes()?));
    Ok(())
}

fn cache_clear(cache_dir: &Path, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ResultCache::new(cache_dir)?;
    let count = cache.len()?;
    if count == 0 {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    if !confirm {
        println!(
            "Found {count} cached result(s) ({}).",
            format_size(cache.size_bytes()?)
        );
        println!("Dry run. Pass --confirm to actually delete.");
        return Ok(());
    }

    let removed = cache.clear()?;
    println!("Done. Removed {removed} cached result(s).");
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn print_summary(result: &BacktestResult) {
    let h = &result.horizon;
    println!();
    println!("=== Vintage {} ===", result.vintage_id);
    println!(
        "Period:  {}-01 to {}-{:02} ({} months)",
        h.start_year,
        h.end_year,
        h.final_year_months,
        h.period_count()
    );
    println!("Run id:  {}", result.run_id);
    println!();
    println!(
        "{:<12} {:>10} {:>9} {:>9} {:>9} {:>8}",
        "Portfolio", "Final", "Return", "CAGR", "MDD", "Vol"
    );
    println!("{}", "-".repeat(62));
    for (name, outcome) in &result.portfolios {
        let m = &outcome.metrics;
        println!(
            "{:<12} {:>10.2} {:>8.2}% {:>8.2}% {:>8.2}% {:>7.2}%",
            name,
            m.final_value,
            m.total_return * 100.0,
            m.cagr * 100.0,
            m.max_drawdown_pct,
            m.annualized_volatility_pct
        );
    }

    println!();
    print!("{:<6}", "Year");
    for name in result.portfolio_names() {
        print!(" {:>10}", name);
    }
    println!();
    for (year, returns) in &result.annual_returns {
        print!("{:<6}", year);
        for name in result.portfolio_names() {
            match returns.get(name) {
                Some(r) => print!(" {:>9.2}%", r * 100.0),
                None => print!(" {:>10}", "-"),
            }
        }
        println!();
    }
    println!();
}

fn print_comparison(comparison: &VintageComparison) {
    println!();
    println!("=== Scenario {} ===", comparison.scenario);
    println!();
    println!(
        "{:<10} {:>12} {:>12} {:>12} {:>10}",
        "Vintage", "Current", "Prior", "Benchmark", "Cur MDD"
    );
    println!("{}", "-".repeat(60));
    for (id, result) in &comparison.results {
        let final_of = |name: &str| {
            result
                .portfolio(name)
                .map(|o| format!("{:.2}", o.metrics.final_value))
                .unwrap_or_else(|| "-".to_string())
        };
        let mdd = result
            .portfolio("current")
            .map(|o| format!("{:.2}%", o.metrics.max_drawdown_pct))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:>12} {:>12} {:>12} {:>10}",
            id,
            final_of("current"),
            final_of("prior"),
            final_of("benchmark"),
            mdd
        );
    }

    let ranked = comparison.ranked_by_final_value("current");
    if let Some((best, value)) = ranked.first() {
        println!();
        println!("Best current allocation: {best} ({value:.2})");
    }
    println!();
}
