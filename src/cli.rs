//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::warn;

use crate::adapters::csv_adapter::{CsvAdapter, CsvRegimeAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{Profile, RegimeFilter, ScreenConfig, Stabilization};
use crate::domain::config_validation::validate_screen_config;
use crate::domain::error::SniperError;
use crate::domain::fundamentals::{FundamentalsFilter, FundamentalsScoring};
use crate::domain::metrics::TradeStats;
use crate::domain::portfolio::PortfolioAdmissionReport;
use crate::domain::position::ExitReason;
use crate::domain::screen::{MarketContext, RunStats, ScreenReport, Screener, SignalRecord};
use crate::domain::sweep::{
    default_regime_ranges, parse_regime_ranges, rank, regime_grid, stop_timing_grid, SweepOrder,
    SweepResult,
};
use crate::domain::universe::{parse_tickers, UniverseError};
use crate::ports::config_port::{parse_bool, ConfigPort};
use crate::ports::price_port::PriceDataPort;
use crate::ports::regime_port::RegimePort;

#[derive(Parser, Debug)]
#[command(name = "sniper", about = "Mean-reversion equity screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen a ticker universe and simulate portfolio admission
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [run] profile
        #[arg(long)]
        profile: Option<String>,
        /// Comma-separated tickers, overriding [run] tickers
        #[arg(long)]
        tickers: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Screen tickers one at a time
        #[arg(long)]
        sequential: bool,
        /// Print every simulated trade
        #[arg(long)]
        trades: bool,
    },
    /// Screen the universe once per grid case and rank the cases
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        /// stops (every stop mode under every entry timing) or regime (regime bands)
        #[arg(long, default_value = "stops")]
        grid: SweepGrid,
        /// Regime bands for the regime grid, e.g. 20-35,22-38
        #[arg(long)]
        ranges: Option<String>,
        /// pnl, win_rate, avg_return or worst_year
        #[arg(long, default_value = "pnl")]
        order: SweepOrder,
        /// Years whose combined PnL is shown for each case
        #[arg(long, value_delimiter = ',', default_values_t = [2020, 2022])]
        stress_years: Vec<i32>,
        /// Override [run] profile
        #[arg(long)]
        profile: Option<String>,
        /// Comma-separated tickers, overriding [run] tickers
        #[arg(long)]
        tickers: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Screen tickers one at a time
        #[arg(long)]
        sequential: bool,
    },
    /// Validate a screen configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in a data directory
    ListSymbols {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the built-in parameter profiles
    Profiles,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Screen {
            config,
            profile,
            tickers,
            data_dir,
            sequential,
            trades,
        } => run_screen(
            &config,
            &ScreenOverrides {
                profile,
                tickers,
                data_dir,
                sequential,
                trades,
            },
        ),
        Command::Sweep {
            config,
            grid,
            ranges,
            order,
            stress_years,
            profile,
            tickers,
            data_dir,
            sequential,
        } => run_sweep(
            &config,
            &SweepOverrides {
                screen: ScreenOverrides {
                    profile,
                    tickers,
                    data_dir,
                    sequential,
                    trades: false,
                },
                grid,
                ranges,
                order,
            },
            &stress_years,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir, config } => {
            run_list_symbols(data_dir.as_ref(), config.as_ref())
        }
        Command::Profiles => run_profiles(),
    }
}

fn fail(e: &SniperError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

#[derive(Debug, Default)]
pub struct ScreenOverrides {
    pub profile: Option<String>,
    pub tickers: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub sequential: bool,
    pub trades: bool,
}

/// Which parameter grid a sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepGrid {
    Stops,
    Regime,
}

impl FromStr for SweepGrid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stops" => Ok(SweepGrid::Stops),
            "regime" => Ok(SweepGrid::Regime),
            other => Err(format!("unknown grid '{other}' (expected stops or regime)")),
        }
    }
}

#[derive(Debug)]
pub struct SweepOverrides {
    pub screen: ScreenOverrides,
    pub grid: SweepGrid,
    /// Regime bands; the built-in bands when absent.
    pub ranges: Option<String>,
    pub order: SweepOrder,
}

/// `[run]` settings: where the data lives and what to screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub data_dir: PathBuf,
    /// `None` screens every ticker in the data directory.
    pub tickers: Option<Vec<String>>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub benchmark: Option<String>,
    pub regime_symbol: Option<String>,
}

fn read_parsed<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, SniperError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    config
        .get_trimmed(section, key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| SniperError::invalid(section, key, format!("'{raw}': {e}")))
        })
        .transpose()
}

fn read_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<bool>, SniperError> {
    config
        .get_trimmed(section, key)
        .map(|raw| {
            parse_bool(&raw).ok_or_else(|| {
                SniperError::invalid(section, key, format!("'{raw}' is not a boolean"))
            })
        })
        .transpose()
}

/// `off`/`none` disables an optional value.
fn read_switchable(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Option<f64>>, SniperError> {
    match config.get_trimmed(section, key) {
        None => Ok(None),
        Some(raw) if matches!(raw.to_lowercase().as_str(), "off" | "none") => Ok(Some(None)),
        Some(_) => read_parsed(config, section, key).map(|v| v.map(Some)),
    }
}

fn override_value<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    target: &mut T,
) -> Result<(), SniperError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = read_parsed(config, section, key)? {
        *target = value;
    }
    Ok(())
}

fn read_date(config: &dyn ConfigPort, section: &str, key: &str) -> Result<NaiveDate, SniperError> {
    let raw = config
        .get_trimmed(section, key)
        .ok_or_else(|| SniperError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        SniperError::invalid(section, key, "invalid date format (expected YYYY-MM-DD)")
    })
}

/// Builds a screen configuration from the `[run] profile` preset plus any
/// keys present in the file.
pub fn build_screen_config(config: &dyn ConfigPort) -> Result<ScreenConfig, SniperError> {
    build_screen_config_for(config, None)
}

/// Like [`build_screen_config`], with `profile` taking precedence over the
/// file's `[run] profile`.
pub fn build_screen_config_for(
    config: &dyn ConfigPort,
    profile: Option<Profile>,
) -> Result<ScreenConfig, SniperError> {
    let profile = match profile {
        Some(p) => p,
        None => read_parsed(config, "run", "profile")?.unwrap_or(Profile::Sniper),
    };
    let mut cfg = profile.config();

    let ind = &mut cfg.indicators;
    override_value(config, "indicators", "rsi_period", &mut ind.rsi_period)?;
    override_value(config, "indicators", "adx_period", &mut ind.adx_period)?;
    override_value(config, "indicators", "atr_period", &mut ind.atr_period)?;
    override_value(config, "indicators", "sma_period", &mut ind.sma_period)?;
    override_value(config, "indicators", "high_window", &mut ind.high_window)?;
    override_value(config, "indicators", "sma_slope_days", &mut ind.sma_slope_days)?;
    override_value(config, "indicators", "volume_avg_days", &mut ind.volume_avg_days)?;
    override_value(
        config,
        "indicators",
        "relative_strength_lookback",
        &mut ind.relative_strength_lookback,
    )?;
    override_value(config, "indicators", "min_bars", &mut cfg.min_bars)?;

    let entry = &mut cfg.entry;
    override_value(config, "entry", "rsi_oversold", &mut entry.rsi_oversold)?;
    override_value(config, "entry", "rsi_signal", &mut entry.rsi_signal)?;
    override_value(config, "entry", "rsi_lookback", &mut entry.rsi_lookback)?;
    override_value(config, "entry", "adx_min", &mut entry.adx_min)?;
    override_value(config, "entry", "min_below_high_pct", &mut entry.min_below_high_pct)?;
    override_value(config, "entry", "max_below_high_pct", &mut entry.max_below_high_pct)?;
    override_value(config, "entry", "max_from_sma_pct", &mut entry.max_from_sma_pct)?;
    override_value(config, "entry", "sma_floor_slack", &mut entry.sma_floor_slack)?;
    override_value(config, "entry", "sma_slope_floor", &mut entry.sma_slope_floor)?;
    if let Some(mult) = read_switchable(config, "entry", "volume_surge_mult")? {
        entry.volume_surge_mult = mult;
    }
    if let Some(floor) = read_switchable(config, "entry", "relative_strength_floor")? {
        entry.relative_strength_floor = floor;
    }
    override_value(config, "entry", "min_gap_days", &mut entry.min_gap_days)?;
    override_value(config, "entry", "entry_timing", &mut entry.entry_timing)?;

    cfg.regime = build_regime_filter(config, cfg.regime.take())?;

    let exit = &mut cfg.exit;
    override_value(config, "exit", "stop_mode", &mut exit.stop_mode)?;
    override_value(config, "exit", "stop_loss_pct", &mut exit.stop_loss_pct)?;
    override_value(config, "exit", "take_profit_pct", &mut exit.take_profit_pct)?;
    if let Some(activation) = read_switchable(config, "exit", "trail_activation_pct")? {
        exit.trail_activation_pct = activation;
    }
    override_value(config, "exit", "trail_distance_pct", &mut exit.trail_distance_pct)?;
    if let Some(enabled) = read_bool(config, "exit", "trailing_enabled")? {
        exit.trailing_enabled = enabled;
    }
    override_value(config, "exit", "max_hold_days", &mut exit.max_hold_days)?;
    override_value(config, "exit", "atr_stop_mult", &mut exit.atr_stop_mult)?;
    override_value(config, "exit", "atr_trail_mult", &mut exit.atr_trail_mult)?;
    override_value(config, "exit", "pivot_lookback", &mut exit.pivot_lookback)?;
    override_value(config, "exit", "pivot_buffer_pct", &mut exit.pivot_buffer_pct)?;
    override_value(config, "exit", "pivot_trail_fraction", &mut exit.pivot_trail_fraction)?;
    override_value(config, "exit", "hybrid_atr_buffer", &mut exit.hybrid_atr_buffer)?;
    override_value(config, "exit", "reward_risk_ratio", &mut exit.reward_risk_ratio)?;
    override_value(config, "exit", "min_stop_pct", &mut exit.min_stop_pct)?;
    override_value(config, "exit", "max_stop_pct", &mut exit.max_stop_pct)?;

    let sizing = &mut cfg.sizing;
    override_value(config, "sizing", "account_size", &mut sizing.account_size)?;
    override_value(config, "sizing", "risk_per_trade_pct", &mut sizing.risk_per_trade_pct)?;
    override_value(config, "sizing", "max_position_pct", &mut sizing.max_position_pct)?;

    override_value(config, "portfolio", "max_positions", &mut cfg.max_positions)?;

    cfg.fundamentals = build_fundamentals_filter(config, cfg.fundamentals.take())?;

    Ok(cfg)
}

fn build_regime_filter(
    config: &dyn ConfigPort,
    preset: Option<RegimeFilter>,
) -> Result<Option<RegimeFilter>, SniperError> {
    let min: Option<f64> = read_parsed(config, "regime", "regime_min")?;
    let max: Option<f64> = read_parsed(config, "regime", "regime_max")?;
    let enabled = read_bool(config, "regime", "enabled")?
        .unwrap_or(preset.is_some() || min.is_some() || max.is_some());
    if !enabled {
        return Ok(None);
    }

    let mut filter = preset.unwrap_or(RegimeFilter {
        min: 0.0,
        max: 100.0,
        stabilization: None,
    });
    if let Some(min) = min {
        filter.min = min;
    }
    if let Some(max) = max {
        filter.max = max;
    }

    let lookback: Option<usize> = read_parsed(config, "regime", "stabilization_lookback")?;
    let min_drop: Option<f64> = read_parsed(config, "regime", "stabilization_min_drop_pct")?;
    match (lookback, min_drop) {
        (Some(0), _) => filter.stabilization = None,
        (Some(lookback), drop) => {
            filter.stabilization = Some(Stabilization {
                lookback,
                min_drop_pct: drop.unwrap_or(0.0),
            });
        }
        (None, Some(drop)) => match filter.stabilization.as_mut() {
            Some(stab) => stab.min_drop_pct = drop,
            None => {
                return Err(SniperError::ConfigMissing {
                    section: "regime".into(),
                    key: "stabilization_lookback".into(),
                });
            }
        },
        (None, None) => {}
    }
    Ok(Some(filter))
}

fn build_fundamentals_filter(
    config: &dyn ConfigPort,
    preset: Option<FundamentalsFilter>,
) -> Result<Option<FundamentalsFilter>, SniperError> {
    let enabled = read_bool(config, "fundamentals", "enabled")?.unwrap_or(preset.is_some());
    if !enabled {
        return Ok(None);
    }
    let mut filter = preset.unwrap_or_default();
    if let Some(scoring) = read_parsed::<FundamentalsScoring>(config, "fundamentals", "scoring")? {
        if scoring != filter.scoring {
            filter = FundamentalsFilter::for_scoring(scoring);
        }
    }
    if let Some(cap) = read_switchable(config, "fundamentals", "min_market_cap")? {
        filter.min_market_cap = cap;
    }
    override_value(config, "fundamentals", "max_pe", &mut filter.max_pe)?;
    override_value(config, "fundamentals", "min_roe_pct", &mut filter.min_roe_pct)?;
    override_value(config, "fundamentals", "max_debt_equity", &mut filter.max_debt_equity)?;
    override_value(config, "fundamentals", "prefer_pe_below", &mut filter.prefer_pe_below)?;
    override_value(config, "fundamentals", "max_peg", &mut filter.max_peg)?;
    override_value(config, "fundamentals", "max_price_to_book", &mut filter.max_price_to_book)?;
    override_value(config, "fundamentals", "min_profit_margin", &mut filter.min_profit_margin)?;
    if let Some(required) = read_bool(config, "fundamentals", "require_positive_fcf")? {
        filter.require_positive_fcf = required;
    }
    override_value(config, "fundamentals", "min_score", &mut filter.min_score)?;
    Ok(Some(filter))
}

pub fn build_run_settings(config: &dyn ConfigPort) -> Result<RunSettings, SniperError> {
    let tickers = config
        .get_trimmed("run", "tickers")
        .map(|raw| parse_tickers(&raw))
        .transpose()?;

    Ok(RunSettings {
        data_dir: config
            .get_trimmed("run", "data_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data")),
        tickers,
        start_date: read_date(config, "run", "start_date")?,
        end_date: read_date(config, "run", "end_date")?,
        benchmark: config.get_trimmed("run", "benchmark").map(|s| s.to_uppercase()),
        regime_symbol: config
            .get_trimmed("run", "regime_symbol")
            .map(|s| s.to_uppercase()),
    })
}

/// Every ticker in the data directory except the benchmark and regime files.
fn discover_tickers(
    prices: &dyn PriceDataPort,
    settings: &RunSettings,
) -> Result<Vec<String>, SniperError> {
    let reserved = [settings.benchmark.as_deref(), settings.regime_symbol.as_deref()];
    let tickers: Vec<String> = prices
        .list_tickers()?
        .into_iter()
        .filter(|t| !reserved.contains(&Some(t.as_str())))
        .collect();
    if tickers.is_empty() {
        return Err(UniverseError::Empty.into());
    }
    Ok(tickers)
}

fn load_market_context(
    prices: &dyn PriceDataPort,
    settings: &RunSettings,
    config: &ScreenConfig,
) -> Result<MarketContext, SniperError> {
    let benchmark = match &settings.benchmark {
        Some(symbol) => {
            match prices.fetch_prices(symbol, settings.start_date, settings.end_date) {
                Ok(series) => Some(series),
                Err(e) => {
                    warn!(benchmark = %symbol, error = %e, "benchmark unavailable");
                    None
                }
            }
        }
        None => None,
    };

    let regime = match (&config.regime, &settings.regime_symbol) {
        (Some(_), None) => {
            return Err(SniperError::ConfigMissing {
                section: "run".into(),
                key: "regime_symbol".into(),
            });
        }
        (_, Some(symbol)) => {
            let port = CsvRegimeAdapter::new(settings.data_dir.clone(), symbol.clone());
            match port.fetch_regime(settings.start_date, settings.end_date) {
                Ok(series) => Some(series),
                Err(e) if config.regime.is_some() => return Err(e),
                Err(e) => {
                    warn!(regime = %symbol, error = %e, "regime series unavailable");
                    None
                }
            }
        }
        (None, None) => None,
    };

    Ok(MarketContext { benchmark, regime })
}

fn prepare_screen(
    adapter: &dyn ConfigPort,
    overrides: &ScreenOverrides,
) -> Result<(ScreenConfig, RunSettings), SniperError> {
    let profile = overrides
        .profile
        .as_deref()
        .map(|name| {
            name.parse::<Profile>()
                .map_err(|e| SniperError::invalid("run", "profile", e))
        })
        .transpose()?;
    let cfg = build_screen_config_for(adapter, profile)?;
    validate_screen_config(&cfg)?;

    let mut settings = build_run_settings(adapter)?;
    if let Some(raw) = &overrides.tickers {
        settings.tickers = Some(parse_tickers(raw)?);
    }
    if let Some(dir) = &overrides.data_dir {
        settings.data_dir = dir.clone();
    }
    Ok((cfg, settings))
}

pub fn execute_screen(
    adapter: &dyn ConfigPort,
    overrides: &ScreenOverrides,
) -> Result<ScreenReport, SniperError> {
    let (cfg, settings) = prepare_screen(adapter, overrides)?;
    let data = CsvAdapter::new(settings.data_dir.clone());

    let tickers = match &settings.tickers {
        Some(list) => list.clone(),
        None => discover_tickers(&data, &settings)?,
    };
    let market = load_market_context(&data, &settings, &cfg)?;

    let mut screener = Screener::new(&data).with_parallelism(!overrides.sequential);
    if cfg.fundamentals.is_some() {
        screener = screener.with_fundamentals(&data);
    }
    screener.run(
        &tickers,
        settings.start_date,
        settings.end_date,
        &market,
        &cfg,
    )
}

/// Runs the requested grid over the configured universe, best case first.
pub fn execute_sweep(
    adapter: &dyn ConfigPort,
    overrides: &SweepOverrides,
) -> Result<Vec<SweepResult>, SniperError> {
    let (cfg, settings) = prepare_screen(adapter, &overrides.screen)?;
    let cases = match overrides.grid {
        SweepGrid::Stops => stop_timing_grid(&cfg),
        SweepGrid::Regime => {
            let ranges = match &overrides.ranges {
                Some(raw) => parse_regime_ranges(raw)
                    .map_err(|e| SniperError::invalid("sweep", "ranges", e))?,
                None => default_regime_ranges(),
            };
            regime_grid(&cfg, &ranges)
        }
    };
    let Some(first) = cases.first() else {
        return Err(SniperError::invalid("sweep", "ranges", "no regime bands given"));
    };

    let data = CsvAdapter::new(settings.data_dir.clone());
    let tickers = match &settings.tickers {
        Some(list) => list.clone(),
        None => discover_tickers(&data, &settings)?,
    };
    let market = load_market_context(&data, &settings, &first.config)?;

    let mut screener = Screener::new(&data).with_parallelism(!overrides.screen.sequential);
    if cases.iter().any(|case| case.config.fundamentals.is_some()) {
        screener = screener.with_fundamentals(&data);
    }
    let mut results = screener.sweep(
        &tickers,
        settings.start_date,
        settings.end_date,
        &market,
        &cases,
    )?;
    rank(&mut results, overrides.order);
    Ok(results)
}

fn run_sweep(config_path: &Path, overrides: &SweepOverrides, stress_years: &[i32]) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match execute_sweep(&adapter, overrides) {
        Ok(results) => {
            print_sweep(&results, overrides.order, stress_years);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_sweep(results: &[SweepResult], order: SweepOrder, stress_years: &[i32]) {
    let years = stress_years
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join("+");
    println!("=== Sweep ({} cases, ranked by {order}) ===", results.len());
    println!(
        "{:<24} {:>7} {:>5} {:>7} {:>8} {:>8} {:>12} {:>12} {:>8}",
        "Case", "Trades", "Open", "WR%", "AvgRet", "AvgStop", "Total PnL", years, "PnL/Worst"
    );
    for result in results {
        let stats = &result.stats;
        println!(
            "{:<24} {:>7} {:>5} {:>6.1}% {:>+7.2}% {:>7.1}% {:>12.0} {:>12.0} {:>8.2}",
            result.label,
            stats.total_trades,
            result.open_trades,
            stats.win_rate,
            stats.avg_return,
            result.avg_stop_pct,
            stats.total_pnl,
            result.pnl_in_years(stress_years),
            result.pnl_to_worst_year(),
        );
    }
    if let Some(best) = results.first() {
        println!("\nBest: {}", best.label);
        print_trade_stats(&best.label, &best.stats);
    }
}

fn run_screen(config_path: &Path, overrides: &ScreenOverrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match execute_screen(&adapter, overrides) {
        Ok(report) => {
            print_report(&report, overrides.trades);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_report(report: &ScreenReport, with_trades: bool) {
    print_run_stats(&report.stats);
    print_trade_stats("All Signals", &report.all_stats);
    print_admission(&report.admission);
    if with_trades {
        print_trades(&report.records);
    }
}

fn print_run_stats(stats: &RunStats) {
    println!("=== Run ===");
    println!("Tickers:          {} requested, {} scanned", stats.tickers_requested, stats.tickers_scanned);
    println!("Provider errors:  {}", stats.provider_failures);
    println!("Short history:    {}", stats.insufficient_data);
    println!("Fundamentals out: {}", stats.failed_fundamentals);
    println!(
        "Candidates:       {} ({} past end of data)",
        stats.candidates, stats.discarded_end_of_series
    );
    if stats.rejections.total() > 0 {
        println!("Rejections:");
        for (gate, count) in stats.rejections.iter() {
            println!("  {:<22} {}", gate.label(), count);
        }
    }
}

fn print_trade_stats(title: &str, stats: &TradeStats) {
    println!("\n=== {title} ===");
    if stats.total_trades == 0 {
        println!("No trades");
        return;
    }
    println!("Total Trades:     {}", stats.total_trades);
    println!(
        "Win Rate:         {:.1}% ({} W / {} L)",
        stats.win_rate, stats.winners, stats.losers
    );
    println!("Avg Return:       {:+.2}%", stats.avg_return);
    println!("Avg Win / Loss:   {:+.2}% / {:+.2}%", stats.avg_win, stats.avg_loss);
    println!("Best / Worst:     {:+.2}% / {:+.2}%", stats.best_trade, stats.worst_trade);
    println!("Expectancy:       {:+.2}%", stats.expectancy);
    println!("Profit Factor:    {:.2}", stats.profit_factor);
    println!("Sharpe-like:      {:.2}", stats.sharpe_like);
    println!("Total PnL:        ${:.0}", stats.total_pnl);
    println!(
        "Hold Days:        {:.1} avg, {:.1} median",
        stats.avg_hold_days, stats.median_hold_days
    );
    println!("Trailing Active:  {}", stats.trailing_activated);
    for reason in ExitReason::ALL {
        let count = stats.exits(reason);
        if count > 0 {
            println!("  {:<16} {}", reason.label(), count);
        }
    }
}

fn print_admission(report: &PortfolioAdmissionReport) {
    println!("\n=== Portfolio (max {} positions) ===", report.max_positions);
    println!(
        "Taken / Skipped:  {} / {} ({:.1}% skipped)",
        report.taken.len(),
        report.skipped.len(),
        report.skip_rate
    );
    println!("Peak Positions:   {}", report.peak_active);
    if let Some(busiest) = report.overlaps.iter().map(|o| o.max_concurrent).max() {
        println!("Max Overlap:      {}", busiest);
    }
    print_trade_stats("Taken", &report.taken_stats);
    print_trade_stats("Skipped", &report.skipped_stats);
}

fn print_trades(records: &[SignalRecord]) {
    println!("\n=== Trades ===");
    for record in records {
        let trade = &record.trade;
        let exit_date = trade
            .exit_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "open".to_string());
        println!(
            "{:<8} {} {:>10.2} -> {:<10} {:>10.2} {:>+8.2}% {:<15} {:>4}d ${:>10.0}",
            trade.ticker,
            trade.entry_date,
            trade.entry_price,
            exit_date,
            trade.exit_price,
            trade.return_pct,
            trade.exit_reason.label(),
            trade.hold_days,
            record.sizing.pnl,
        );
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let cfg = match build_screen_config(&adapter).and_then(|cfg| {
        validate_screen_config(&cfg)?;
        Ok(cfg)
    }) {
        Ok(cfg) => cfg,
        Err(e) => return fail(&e),
    };
    let settings = match build_run_settings(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if cfg.regime.is_some() && settings.regime_symbol.is_none() {
        return fail(&SniperError::ConfigMissing {
            section: "run".into(),
            key: "regime_symbol".into(),
        });
    }

    print_config(&cfg);
    println!("Data:             {}", settings.data_dir.display());
    println!("Window:           {} to {}", settings.start_date, settings.end_date);
    match &settings.tickers {
        Some(list) => println!("Tickers:          {}", list.join(", ")),
        None => println!("Tickers:          all in data directory"),
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn print_config(cfg: &ScreenConfig) {
    let e = &cfg.entry;
    let x = &cfg.exit;
    println!(
        "Entry:            {:.0}-{:.0}% below high, <= {:.0}% from SMA, ADX >= {:.0}, gap {} bars, {}",
        e.min_below_high_pct,
        e.max_below_high_pct,
        e.max_from_sma_pct,
        e.adx_min,
        e.min_gap_days,
        e.entry_timing
    );
    match e.volume_surge_mult {
        Some(mult) => println!("Volume:           >= {mult:.2}x average"),
        None => println!("Volume:           off"),
    }
    match e.relative_strength_floor {
        Some(floor) => println!("Rel. Strength:    >= {floor:+.2}"),
        None => println!("Rel. Strength:    off"),
    }
    match &cfg.regime {
        Some(r) => println!("Regime:           {:.0}-{:.0}", r.min, r.max),
        None => println!("Regime:           off"),
    }
    println!(
        "Exit:             {} stop {:.1}% target {:.1}% trail {:.1}% ({}), max {} days",
        x.stop_mode,
        x.stop_loss_pct,
        x.take_profit_pct,
        x.trail_distance_pct,
        if x.trailing_enabled { "on" } else { "off" },
        x.max_hold_days
    );
    println!(
        "Sizing:           ${:.0} account, {:.2}% risk, {:.1}% max position, {} slots",
        cfg.sizing.account_size,
        cfg.sizing.risk_per_trade_pct,
        cfg.sizing.max_position_pct,
        cfg.max_positions
    );
    match &cfg.fundamentals {
        Some(f) => println!(
            "Fundamentals:     {} scoring, pass at {}, market cap floor {}",
            f.scoring,
            f.min_score,
            f.min_market_cap
                .map_or_else(|| "off".to_string(), |cap| format!("${:.1}B", cap / 1e9))
        ),
        None => println!("Fundamentals:     off"),
    }
    println!("Warm-up:          {} bars", cfg.warmup_bars());
}

fn run_list_symbols(data_dir: Option<&PathBuf>, config_path: Option<&PathBuf>) -> ExitCode {
    let data_dir = match (data_dir, config_path) {
        (Some(dir), _) => dir.clone(),
        (None, Some(path)) => {
            let config = match load_config(path) {
                Ok(c) => c,
                Err(code) => return code,
            };
            config
                .get_trimmed("run", "data_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data"))
        }
        (None, None) => {
            eprintln!("error: --data-dir or --config is required for list-symbols");
            return ExitCode::from(1);
        }
    };

    let adapter = CsvAdapter::new(data_dir.clone());
    let tickers = match adapter.list_tickers() {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    if tickers.is_empty() {
        eprintln!("No tickers found in {}", data_dir.display());
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    ExitCode::SUCCESS
}

fn run_profiles() -> ExitCode {
    for profile in Profile::ALL {
        println!("[{}]", profile);
        print_config(&profile.config());
        println!();
    }
    ExitCode::SUCCESS
}
