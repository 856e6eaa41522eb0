//! twscope CLI: Taiwan stock dashboard in the terminal.
//!
//! Commands:
//! - `analyze`: full analysis of one code (score, levels, details, optional AI report)
//! - `report`: AI report for one code
//! - `scan`: quick quotes and fast scores for many codes (defaults to the watchlist)
//! - `pulse`: market indices
//! - `hot`: configured hot picks
//! - `watchlist list|add|remove|select|clear`: persisted watchlist

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use twscope_core::data::{
    CachedProvider, CircuitBreaker, MarketDataProvider, SyntheticProvider, YahooProvider,
};
use twscope_core::domain::Period;
use twscope_core::report::GeminiClient;
use twscope_runner::{
    analyze_symbol, generate_report, hot_picks, init_logging, load_state, market_pulse,
    save_analysis, save_state, BatchScanner, DashboardConfig, LabeledOutcome, LogConfig,
    LogFormat, ReportSlot, ScanOutcome, StockAnalysis,
};

const APP_DIR: &str = "twscope";

#[derive(Parser)]
#[command(name = "twscope", about = "twscope: Taiwan stock dashboard", version)]
struct Cli {
    /// Path to a TOML config file. Defaults to <config dir>/twscope/config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use deterministic synthetic data instead of the network.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Log format: pretty, compact or json. Overrides TWSCOPE_LOG_FORMAT.
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Log at debug level (RUST_LOG still wins).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Print results as JSON.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one code: score, reasons, levels and detail metrics.
    Analyze {
        /// Stock code (e.g. 2330) or index symbol (e.g. ^TWII).
        code: String,

        /// Look-back: 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, max. Defaults to the config value.
        #[arg(long)]
        period: Option<Period>,

        /// Also request the AI report.
        #[arg(long, default_value_t = false)]
        report: bool,

        /// Write analysis.json, indicators.csv and summary.md under this directory.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Generate the AI report for one code.
    Report {
        code: String,

        #[arg(long)]
        period: Option<Period>,
    },
    /// Quick quotes for many codes. Uses the watchlist when none are given.
    Scan {
        codes: Vec<String>,

        /// Fetch one code at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Market indices: last value and percent change.
    Pulse,
    /// Hot picks from the config.
    Hot,
    /// Watchlist management.
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
}

#[derive(Subcommand)]
enum WatchlistAction {
    /// Show the watchlist and the current selection.
    List,
    /// Add a code.
    Add { code: String },
    /// Remove a code.
    Remove { code: String },
    /// Select a watched code.
    Select { code: String },
    /// Return to the market overview.
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log = LogConfig::from_env();
    if let Some(format) = cli.log_format {
        log.format = format;
    }
    if cli.verbose {
        log.level = "debug".to_string();
    }
    init_logging(&log)?;

    let config = load_config(cli.config.as_deref())?;
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Analyze {
            code,
            period,
            report,
            export,
        } => {
            let provider = build_provider(&config, cli.synthetic)?;
            let period = period.unwrap_or(config.data.default_period);
            run_analyze(&config, &*provider, &out, &code, period, report, export.as_deref())
        }
        Commands::Report { code, period } => {
            let provider = build_provider(&config, cli.synthetic)?;
            let period = period.unwrap_or(config.data.default_period);
            run_report(&config, &*provider, &out, &code, period)
        }
        Commands::Scan { codes, sequential } => {
            let provider = build_provider(&config, cli.synthetic)?;
            run_scan(&config, &*provider, &out, codes, sequential)
        }
        Commands::Pulse => {
            let provider = build_provider(&config, cli.synthetic)?;
            out.labeled("Market pulse", &market_pulse(&*provider, &config.market.indices))
        }
        Commands::Hot => {
            let provider = build_provider(&config, cli.synthetic)?;
            out.labeled("Hot picks", &hot_picks(&*provider, &config.market.hot_picks))
        }
        Commands::Watchlist { action } => run_watchlist(&config, &out, action),
    }
}

// ─── Setup ──────────────────────────────────────────────────────────

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn load_config(explicit: Option<&Path>) -> Result<DashboardConfig> {
    if let Some(path) = explicit {
        return DashboardConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    match default_config_path().filter(|p| p.exists()) {
        Some(path) => {
            debug!(path = %path.display(), "using default config file");
            DashboardConfig::from_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => Ok(DashboardConfig::default()),
    }
}

fn watchlist_path(config: &DashboardConfig) -> Result<PathBuf> {
    if let Some(path) = &config.watchlist.path {
        return Ok(path.clone());
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR).join("watchlist.json"))
        .context("no data directory on this platform; set watchlist.path in the config")
}

fn build_provider(config: &DashboardConfig, synthetic: bool) -> Result<Box<dyn MarketDataProvider>> {
    let policy = config.cache_policy();
    if synthetic {
        return Ok(Box::new(CachedProvider::new(SyntheticProvider::ending_today(), policy)));
    }
    let breaker = Arc::new(CircuitBreaker::new(config.breaker_cooldown(), 3));
    let yahoo = YahooProvider::new(breaker, config.yahoo_options())?;
    Ok(Box::new(CachedProvider::new(yahoo, policy)))
}

fn report_slot(config: &DashboardConfig, analysis: &StockAnalysis) -> Result<ReportSlot> {
    let client = GeminiClient::new(config.gemini_options(|var| std::env::var(var).ok()))?;
    Ok(generate_report(&client, analysis))
}

// ─── Commands ───────────────────────────────────────────────────────

fn run_analyze(
    config: &DashboardConfig,
    provider: &dyn MarketDataProvider,
    out: &Output,
    code: &str,
    period: Period,
    with_report: bool,
    export: Option<&Path>,
) -> Result<()> {
    let analysis = analyze_symbol(provider, code, period)?;
    let report = if with_report {
        Some(report_slot(config, &analysis)?)
    } else {
        None
    };

    if out.json {
        let mut value = serde_json::to_value(&analysis)?;
        if let Some(slot) = &report {
            value["report"] = serde_json::to_value(slot)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_analysis(&analysis);
        if let Some(slot) = &report {
            println!("\nAI report\n{}", slot.text());
        }
    }

    if let Some(dir) = export {
        let saved = save_analysis(&analysis, report.as_ref(), dir)?;
        eprintln!("Saved to {}", saved.display());
    }
    Ok(())
}

fn run_report(
    config: &DashboardConfig,
    provider: &dyn MarketDataProvider,
    out: &Output,
    code: &str,
    period: Period,
) -> Result<()> {
    let analysis = analyze_symbol(provider, code, period)?;
    let slot = report_slot(config, &analysis)?;
    if out.json {
        println!("{}", serde_json::to_string_pretty(&slot)?);
    } else {
        println!("{}", slot.text());
    }
    if !slot.is_ready() {
        std::process::exit(2);
    }
    Ok(())
}

fn run_scan(
    config: &DashboardConfig,
    provider: &dyn MarketDataProvider,
    out: &Output,
    codes: Vec<String>,
    sequential: bool,
) -> Result<()> {
    let codes = if codes.is_empty() {
        let state = load_state(&watchlist_path(config)?, &config.watchlist.defaults);
        state.watchlist.codes().to_vec()
    } else {
        codes
    };
    if codes.is_empty() {
        bail!("nothing to scan: the watchlist is empty");
    }

    let report = BatchScanner::new(provider)
        .with_parallelism(!sequential)
        .scan(&codes);

    if out.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{:<8} {:<24} {:>10} {:>8} {:>5}", "Code", "Name", "Last", "Chg%", "Fast");
    for outcome in &report.outcomes {
        print_outcome(None, outcome);
    }
    Ok(())
}

fn run_watchlist(config: &DashboardConfig, out: &Output, action: WatchlistAction) -> Result<()> {
    let path = watchlist_path(config)?;
    let mut state = load_state(&path, &config.watchlist.defaults);

    let changed = match action {
        WatchlistAction::List => false,
        WatchlistAction::Add { code } => {
            if !state.add(&code)? {
                eprintln!("{code} is already on the watchlist");
            }
            true
        }
        WatchlistAction::Remove { code } => {
            state.remove(&code)?;
            true
        }
        WatchlistAction::Select { code } => {
            state.select(&code)?;
            true
        }
        WatchlistAction::Clear => {
            state.clear_selection();
            true
        }
    };
    if changed {
        save_state(&path, &state)?;
    }

    if out.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        for code in state.watchlist.codes() {
            let marker = if state.selected() == Some(code.as_str()) { "*" } else { " " };
            println!("{marker} {code}");
        }
    }
    Ok(())
}

// ─── Output ─────────────────────────────────────────────────────────

struct Output {
    json: bool,
}

impl Output {
    fn labeled(&self, title: &str, rows: &[LabeledOutcome]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(rows)?);
            return Ok(());
        }
        println!("{title}");
        for row in rows {
            print_outcome(Some(&row.name), &row.outcome);
        }
        Ok(())
    }
}

fn print_outcome(label: Option<&str>, outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::Quoted(q) => println!(
            "{:<8} {:<24} {:>10.2} {:>+7.2}% {:>5}",
            q.code,
            label.unwrap_or(&q.display_name),
            q.last_price,
            q.change_pct,
            q.fast_score
        ),
        ScanOutcome::Failed { code, error } => {
            println!("{:<8} {:<24} unavailable: {error}", code, label.unwrap_or("-"))
        }
    }
}

fn print_analysis(a: &StockAnalysis) {
    println!("{} ({})", a.name, a.symbol);
    match a.change_pct {
        Some(chg) => println!("  Last {:.2}  {:+.2}%  on {}", a.last.close, chg, a.last.date),
        None => println!("  Last {:.2}  on {}", a.last.close, a.last.date),
    }
    println!("  Score {} / 100  {}", a.score.score, a.score.action.label());
    for reason in &a.score.reasons {
        println!("    - {reason}");
    }

    let m = &a.levels.momentum;
    let v = &a.levels.value;
    println!("  Momentum  entry {:.2}  stop {:.2}  target {:.2}", m.entry, m.stop, m.profit_target);
    println!("  Value     entry {:.2}  stop {:.2}  target {:.2}", v.entry, v.stop, v.profit_target);

    let fmt = |v: Option<f64>, suffix: &str| {
        v.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}{suffix}"))
    };
    println!(
        "  RSI {}  Volume {:.0} lots  P/E {}  ROE {}",
        fmt(a.metrics.rsi14, ""),
        a.metrics.volume_lots,
        fmt(a.metrics.trailing_pe, ""),
        fmt(a.metrics.roe_percent, "%")
    );
    println!("  Recent: {}", a.narrative);
    println!("  {} bars ({}), fingerprint {}", a.bars, a.period, &a.fingerprint[..a.fingerprint.len().min(12)]);
}
