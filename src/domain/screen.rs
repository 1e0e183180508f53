//! Per-ticker screening pipeline and the universe-wide run.
//!
//! Each ticker is screened independently: indicators, signal scan, entry
//! fill, exit levels, exit simulation and sizing. Tickers run in parallel
//! and are joined in input order before portfolio admission, so the output
//! does not depend on scheduling.

use crate::domain::code_data::PriceSeries;
use crate::domain::config::ScreenConfig;
use crate::domain::config_validation::validate_screen_config;
use crate::domain::entry::resolve_entry;
use crate::domain::error::SniperError;
use crate::domain::execution::simulate_exit;
use crate::domain::fundamentals::{FundamentalsFilter, FundamentalsSnapshot};
use crate::domain::indicator::frame::compute_frame;
use crate::domain::metrics::TradeStats;
use crate::domain::portfolio::{admit_trades, PortfolioAdmissionReport};
use crate::domain::position::{size_position, PositionSizing, Trade};
use crate::domain::regime::RegimeSeries;
use crate::domain::signal::{scan_signals, RejectionCounts, SignalCandidate};
use crate::domain::stops::derive_exit_levels;
use crate::domain::sweep::{SweepCase, SweepResult};
use crate::ports::fundamentals_port::FundamentalsPort;
use crate::ports::price_port::PriceDataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// A signal that produced a simulated trade.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub candidate: SignalCandidate,
    pub trade: Trade,
    pub sizing: PositionSizing,
}

impl SignalRecord {
    pub fn ticker(&self) -> &str {
        &self.trade.ticker
    }
}

/// Series shared by every ticker in a run.
#[derive(Debug, Clone, Default)]
pub struct MarketContext {
    pub benchmark: Option<PriceSeries>,
    pub regime: Option<RegimeSeries>,
}

#[derive(Debug, Clone, Default)]
pub struct TickerScan {
    pub ticker: String,
    pub records: Vec<SignalRecord>,
    pub rejections: RejectionCounts,
    /// Signals whose fill bar was past the end of the data.
    pub discarded_end_of_series: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub tickers_requested: usize,
    pub tickers_scanned: usize,
    pub provider_failures: usize,
    pub insufficient_data: usize,
    pub failed_fundamentals: usize,
    pub candidates: usize,
    pub discarded_end_of_series: usize,
    pub rejections: RejectionCounts,
}

#[derive(Debug, Clone)]
pub struct ScreenReport {
    /// Every simulated trade in discovery order (ticker input order, then
    /// signal order).
    pub records: Vec<SignalRecord>,
    pub all_stats: TradeStats,
    pub admission: PortfolioAdmissionReport,
    pub stats: RunStats,
}

/// Screens a single ticker's history.
pub fn screen_ticker(
    series: &PriceSeries,
    config: &ScreenConfig,
    market: &MarketContext,
) -> Result<TickerScan, SniperError> {
    let minimum = config.minimum_bars();
    if series.len() < minimum {
        return Err(SniperError::InsufficientData {
            ticker: series.ticker.clone(),
            bars: series.len(),
            minimum,
        });
    }

    let frame = compute_frame(series, &config.indicators, market.benchmark.as_ref())?;
    let scan = scan_signals(series, &frame, config, market.regime.as_ref());
    let lows: Vec<f64> = series.bars.iter().map(|b| b.low).collect();

    let mut result = TickerScan {
        ticker: series.ticker.clone(),
        rejections: scan.rejections,
        ..TickerScan::default()
    };

    for candidate in scan.candidates {
        let Some(fill) = resolve_entry(series, candidate.signal_index, config.entry.entry_timing)
        else {
            result.discarded_end_of_series += 1;
            continue;
        };

        let levels = derive_exit_levels(
            &config.exit,
            fill.price,
            fill.index,
            candidate.snapshot.atr,
            &lows,
        );
        let outcome = simulate_exit(&series.bars, fill.index, fill.price, &levels, &config.exit);
        let sizing = size_position(&config.sizing, fill.price, levels.stop_pct, outcome.return_pct)?;

        let trade = Trade {
            ticker: series.ticker.clone(),
            entry_date: fill.date,
            entry_price: fill.price,
            stop_pct: levels.stop_pct,
            target_pct: levels.target_pct,
            trail_distance_pct: levels.trail_distance_pct,
            exit_date: outcome.exit_date,
            exit_price: outcome.exit_price,
            exit_reason: outcome.exit_reason,
            return_pct: outcome.return_pct,
            hold_days: outcome.hold_days,
            trailing_activated: outcome.trailing_activated,
            max_adverse_pct: outcome.max_adverse_pct,
            max_favorable_pct: outcome.max_favorable_pct,
        };
        result.records.push(SignalRecord {
            candidate,
            trade,
            sizing,
        });
    }

    Ok(result)
}

enum TickerOutcome {
    Scanned(TickerScan),
    ProviderFailure,
    InsufficientData,
    FailedFundamentals,
}

/// Result of asking the fundamentals port about one ticker.
enum FundamentalsLookup {
    Found(FundamentalsSnapshot),
    Missing,
    Failed,
}

impl FundamentalsLookup {
    fn fetch(port: &dyn FundamentalsPort, ticker: &str) -> Self {
        match port.fetch_fundamentals(ticker) {
            Ok(Some(snapshot)) => FundamentalsLookup::Found(snapshot),
            Ok(None) => FundamentalsLookup::Missing,
            Err(e) => {
                warn!(ticker, error = %e, "fundamentals lookup failed, skipping ticker");
                FundamentalsLookup::Failed
            }
        }
    }

    /// The outcome for a ticker the filter keeps out, `None` when it may be scanned.
    fn screen_out(&self, filter: &FundamentalsFilter, ticker: &str) -> Option<TickerOutcome> {
        match self {
            FundamentalsLookup::Found(snapshot) => {
                let verdict = filter.evaluate(snapshot);
                if verdict.passed() {
                    None
                } else {
                    debug!(ticker, ?verdict, "fundamentals filter rejected ticker");
                    Some(TickerOutcome::FailedFundamentals)
                }
            }
            FundamentalsLookup::Missing => {
                debug!(ticker, "no fundamentals on record");
                Some(TickerOutcome::FailedFundamentals)
            }
            FundamentalsLookup::Failed => Some(TickerOutcome::ProviderFailure),
        }
    }
}

/// Per-ticker inputs fetched once and screened under many configurations.
struct CachedTicker {
    ticker: String,
    series: Option<PriceSeries>,
    fundamentals: Option<FundamentalsLookup>,
}

/// Runs the screen over a ticker universe.
pub struct Screener<'a> {
    prices: &'a (dyn PriceDataPort + Sync),
    fundamentals: Option<&'a (dyn FundamentalsPort + Sync)>,
    parallel: bool,
}

impl<'a> Screener<'a> {
    pub fn new(prices: &'a (dyn PriceDataPort + Sync)) -> Self {
        Self {
            prices,
            fundamentals: None,
            parallel: true,
        }
    }

    pub fn with_fundamentals(mut self, fundamentals: &'a (dyn FundamentalsPort + Sync)) -> Self {
        self.fundamentals = Some(fundamentals);
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        market: &MarketContext,
        config: &ScreenConfig,
    ) -> Result<ScreenReport, SniperError> {
        validate_screen_config(config)?;
        check_window(start, end)?;
        let config = effective_config(config, market)?;

        info!(
            tickers = tickers.len(),
            %start,
            %end,
            parallel = self.parallel,
            "screen started"
        );

        let outcomes =
            self.each(tickers, |ticker| self.screen_one(ticker, start, end, market, &config))?;
        let (records, stats) = tally(tickers.len(), outcomes);

        let admission = admit_trades(&records, config.max_positions);
        info!(
            scanned = stats.tickers_scanned,
            trades = records.len(),
            taken = admission.taken.len(),
            skipped = admission.skipped.len(),
            provider_failures = stats.provider_failures,
            "screen finished"
        );

        Ok(ScreenReport {
            all_stats: TradeStats::compute(&records),
            records,
            admission,
            stats,
        })
    }

    /// Screens the universe once per case, fetching every ticker only once.
    ///
    /// Results come back in case order. Every case is validated before any
    /// data is fetched.
    pub fn sweep(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        market: &MarketContext,
        cases: &[SweepCase],
    ) -> Result<Vec<SweepResult>, SniperError> {
        check_window(start, end)?;
        let configs = cases
            .iter()
            .map(|case| {
                validate_screen_config(&case.config)?;
                effective_config(&case.config, market)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let fundamentals = self
            .fundamentals
            .filter(|_| configs.iter().any(|c| c.fundamentals.is_some()));

        info!(
            tickers = tickers.len(),
            cases = cases.len(),
            %start,
            %end,
            parallel = self.parallel,
            "sweep started"
        );

        let cache = self.each(tickers, |ticker| {
            Ok(CachedTicker {
                ticker: ticker.clone(),
                fundamentals: fundamentals.map(|port| FundamentalsLookup::fetch(port, ticker)),
                series: self.fetch_series(ticker, start, end),
            })
        })?;

        let mut results = Vec::with_capacity(cases.len());
        for (case, config) in cases.iter().zip(configs) {
            let outcomes = self.each(&cache, |cached| screen_cached(cached, market, &config))?;
            let (records, stats) = tally(tickers.len(), outcomes);
            let result = SweepResult::from_records(case.label.clone(), config, &records, stats);
            debug!(
                case = %result.label,
                trades = result.stats.total_trades,
                total_pnl = result.stats.total_pnl,
                "sweep case finished"
            );
            results.push(result);
        }

        info!(cases = results.len(), "sweep finished");
        Ok(results)
    }

    /// Maps every item in input order, in parallel unless disabled.
    fn each<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, SniperError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, SniperError> + Sync + Send,
    {
        if self.parallel {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }

    fn fetch_series(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Option<PriceSeries> {
        match self.prices.fetch_prices(ticker, start, end) {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(ticker, error = %e, "price fetch failed, skipping ticker");
                None
            }
        }
    }

    fn screen_one(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        market: &MarketContext,
        config: &ScreenConfig,
    ) -> Result<TickerOutcome, SniperError> {
        if let (Some(filter), Some(port)) = (&config.fundamentals, self.fundamentals) {
            let lookup = FundamentalsLookup::fetch(port, ticker);
            if let Some(outcome) = lookup.screen_out(filter, ticker) {
                return Ok(outcome);
            }
        }

        let Some(series) = self.fetch_series(ticker, start, end) else {
            return Ok(TickerOutcome::ProviderFailure);
        };
        classify(ticker, screen_ticker(&series, config, market))
    }
}

fn screen_cached(
    cached: &CachedTicker,
    market: &MarketContext,
    config: &ScreenConfig,
) -> Result<TickerOutcome, SniperError> {
    let ticker = cached.ticker.as_str();
    if let (Some(filter), Some(lookup)) = (&config.fundamentals, &cached.fundamentals) {
        if let Some(outcome) = lookup.screen_out(filter, ticker) {
            return Ok(outcome);
        }
    }
    let Some(series) = &cached.series else {
        return Ok(TickerOutcome::ProviderFailure);
    };
    classify(ticker, screen_ticker(series, config, market))
}

fn classify(
    ticker: &str,
    scanned: Result<TickerScan, SniperError>,
) -> Result<TickerOutcome, SniperError> {
    match scanned {
        Ok(scan) => {
            debug!(
                ticker,
                trades = scan.records.len(),
                rejected = scan.rejections.total(),
                "ticker screened"
            );
            Ok(TickerOutcome::Scanned(scan))
        }
        Err(SniperError::InsufficientData { bars, minimum, .. }) => {
            debug!(ticker, bars, minimum, "not enough history");
            Ok(TickerOutcome::InsufficientData)
        }
        Err(e) => Err(e),
    }
}

/// Joins per-ticker outcomes in input order.
fn tally(tickers_requested: usize, outcomes: Vec<TickerOutcome>) -> (Vec<SignalRecord>, RunStats) {
    let mut stats = RunStats {
        tickers_requested,
        ..RunStats::default()
    };
    let mut records = Vec::new();
    for outcome in outcomes {
        match outcome {
            TickerOutcome::Scanned(scan) => {
                stats.tickers_scanned += 1;
                stats.candidates += scan.records.len() + scan.discarded_end_of_series;
                stats.discarded_end_of_series += scan.discarded_end_of_series;
                stats.rejections.merge(&scan.rejections);
                records.extend(scan.records);
            }
            TickerOutcome::ProviderFailure => stats.provider_failures += 1,
            TickerOutcome::InsufficientData => stats.insufficient_data += 1,
            TickerOutcome::FailedFundamentals => stats.failed_fundamentals += 1,
        }
    }
    (records, stats)
}

fn check_window(start: NaiveDate, end: NaiveDate) -> Result<(), SniperError> {
    if start > end {
        return Err(SniperError::contract(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

/// Drops filters whose inputs are absent, or fails when the absence is fatal.
fn effective_config(
    config: &ScreenConfig,
    market: &MarketContext,
) -> Result<ScreenConfig, SniperError> {
    if config.regime.is_some() && market.regime.is_none() {
        return Err(SniperError::contract(
            "regime filter is configured but no regime series was supplied",
        ));
    }

    let mut config = config.clone();
    if config.entry.relative_strength_floor.is_some() && market.benchmark.is_none() {
        warn!("relative strength floor configured without a benchmark, filter disabled");
        config.entry.relative_strength_floor = None;
    }
    Ok(config)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::config::{EntryTiming, IndicatorSettings, Profile, RegimeFilter};
    use crate::domain::ohlcv::PriceBar;
    use crate::domain::position::ExitReason;
    use crate::domain::signal::IndicatorSnapshot;
    use std::collections::HashMap;

    fn parse_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Record with a $10,000 position; hold days are calendar days.
    pub fn make_record(
        ticker: &str,
        entry: &str,
        exit: &str,
        return_pct: f64,
        reason: ExitReason,
    ) -> SignalRecord {
        let entry_date = parse_date(entry);
        let exit_date = parse_date(exit);
        let snapshot = IndicatorSnapshot {
            price: 100.0,
            pct_below_high: 30.0,
            pct_from_sma: 5.0,
            sma_slope: 1.0,
            rsi: 35.0,
            adx: 25.0,
            plus_di: None,
            minus_di: None,
            atr: Some(2.0),
            volume_ratio: None,
            relative_strength: None,
            regime_value: None,
            regime_drop_pct: None,
        };
        SignalRecord {
            candidate: SignalCandidate {
                ticker: ticker.to_string(),
                signal_index: 0,
                signal_date: entry_date,
                snapshot,
            },
            trade: Trade {
                ticker: ticker.to_string(),
                entry_date,
                entry_price: 100.0,
                stop_pct: 10.0,
                target_pct: 30.0,
                trail_distance_pct: 8.0,
                exit_date: match reason {
                    ExitReason::DataExhausted => None,
                    _ => Some(exit_date),
                },
                exit_price: 100.0 * (1.0 + return_pct / 100.0),
                exit_reason: reason,
                return_pct,
                hold_days: (exit_date - entry_date).num_days().max(0) as usize,
                trailing_activated: reason == ExitReason::TrailStopped,
                max_adverse_pct: return_pct.min(0.0),
                max_favorable_pct: return_pct.max(0.0),
            },
            sizing: PositionSizing {
                risk_dollars: 1_000.0,
                position_value: 10_000.0,
                shares: 100,
                pnl: 10_000.0 * return_pct / 100.0,
            },
        }
    }

    /// Every gate wide open, short indicator windows.
    pub fn permissive_config() -> ScreenConfig {
        let mut config = Profile::Balanced.config();
        config.indicators = IndicatorSettings {
            rsi_period: 3,
            adx_period: 3,
            atr_period: 3,
            sma_period: 5,
            high_window: 10,
            sma_slope_days: 2,
            volume_avg_days: 3,
            relative_strength_lookback: 5,
        };
        let entry = &mut config.entry;
        entry.rsi_oversold = 100.0;
        entry.rsi_signal = 100.0;
        entry.adx_min = 0.0;
        entry.min_below_high_pct = 0.0;
        entry.max_below_high_pct = 100.0;
        entry.max_from_sma_pct = 1_000.0;
        entry.sma_floor_slack = 1.0;
        entry.sma_slope_floor = -1_000.0;
        entry.volume_surge_mult = None;
        entry.relative_strength_floor = None;
        entry.min_gap_days = 5;
        entry.entry_timing = EntryTiming::SameBar;
        config.regime = None;
        config.fundamentals = None;
        config.min_bars = 0;
        config.exit.max_hold_days = 10;
        config
    }

    fn wavy_series(ticker: &str, count: usize) -> PriceSeries {
        let start = parse_date("2023-01-02");
        let bars = (0..count)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 4.0;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10_000.0,
                }
            })
            .collect();
        PriceSeries::new(ticker, bars)
    }

    struct MapPrices {
        series: HashMap<String, PriceSeries>,
    }

    impl MapPrices {
        fn new(list: Vec<PriceSeries>) -> Self {
            Self {
                series: list.into_iter().map(|s| (s.ticker.clone(), s)).collect(),
            }
        }
    }

    impl PriceDataPort for MapPrices {
        fn fetch_prices(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, SniperError> {
            self.series
                .get(ticker)
                .cloned()
                .ok_or_else(|| SniperError::provider(ticker, "not found"))
        }

        fn list_tickers(&self) -> Result<Vec<String>, SniperError> {
            let mut tickers: Vec<String> = self.series.keys().cloned().collect();
            tickers.sort();
            Ok(tickers)
        }
    }

    struct MapFundamentals {
        snapshots: HashMap<String, FundamentalsSnapshot>,
    }

    impl FundamentalsPort for MapFundamentals {
        fn fetch_fundamentals(
            &self,
            ticker: &str,
        ) -> Result<Option<FundamentalsSnapshot>, SniperError> {
            Ok(self.snapshots.get(ticker).cloned())
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (parse_date("2020-01-01"), parse_date("2030-01-01"))
    }

    #[test]
    fn short_history_is_insufficient() {
        let mut config = permissive_config();
        config.min_bars = 100;
        let err = screen_ticker(&wavy_series("A", 50), &config, &MarketContext::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SniperError::InsufficientData {
                bars: 50,
                minimum: 100,
                ..
            }
        ));
    }

    #[test]
    fn permissive_scan_produces_debounced_trades() {
        let config = permissive_config();
        let scan =
            screen_ticker(&wavy_series("A", 60), &config, &MarketContext::default()).unwrap();
        assert!(!scan.records.is_empty());
        assert_eq!(scan.discarded_end_of_series, 0);
        let indices: Vec<usize> = scan
            .records
            .iter()
            .map(|r| r.candidate.signal_index)
            .collect();
        assert_eq!(indices[0], config.warmup_bars());
        for pair in indices.windows(2) {
            assert!(pair[1] - pair[0] >= config.entry.min_gap_days);
        }
        for record in &scan.records {
            assert!(record.trade.hold_days <= config.exit.max_hold_days);
            assert!(record.sizing.position_value > 0.0);
        }
    }

    #[test]
    fn next_bar_signal_on_last_bar_is_discarded() {
        let mut config = permissive_config();
        config.entry.entry_timing = EntryTiming::NextOpen;
        config.entry.min_gap_days = 1;
        let series = wavy_series("A", 30);
        let scan = screen_ticker(&series, &config, &MarketContext::default()).unwrap();
        assert_eq!(scan.discarded_end_of_series, 1);
        let last = scan.records.last().unwrap();
        assert_eq!(last.trade.exit_reason, ExitReason::DataExhausted);
        assert!(last.trade.exit_date.is_none());
    }

    #[test]
    fn run_counts_provider_failures_and_keeps_input_order() {
        let prices = MapPrices::new(vec![wavy_series("B", 60), wavy_series("A", 60)]);
        let tickers = vec!["B".to_string(), "MISSING".to_string(), "A".to_string()];
        let (start, end) = range();
        let report = Screener::new(&prices)
            .run(&tickers, start, end, &MarketContext::default(), &permissive_config())
            .unwrap();

        assert_eq!(report.stats.tickers_requested, 3);
        assert_eq!(report.stats.tickers_scanned, 2);
        assert_eq!(report.stats.provider_failures, 1);
        let first_a = report
            .records
            .iter()
            .position(|r| r.ticker() == "A")
            .unwrap();
        assert!(report.records[..first_a].iter().all(|r| r.ticker() == "B"));
        assert_eq!(
            report.admission.taken.len() + report.admission.skipped.len(),
            report.records.len()
        );
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let prices = MapPrices::new(
            (0..6)
                .map(|i| wavy_series(&format!("T{i}"), 50 + i * 7))
                .collect(),
        );
        let tickers = prices.list_tickers().unwrap();
        let (start, end) = range();
        let config = permissive_config();
        let market = MarketContext::default();
        let par = Screener::new(&prices)
            .run(&tickers, start, end, &market, &config)
            .unwrap();
        let seq = Screener::new(&prices)
            .with_parallelism(false)
            .run(&tickers, start, end, &market, &config)
            .unwrap();
        assert_eq!(par.records, seq.records);
        assert_eq!(par.admission.taken, seq.admission.taken);
        assert_eq!(par.stats, seq.stats);
    }

    #[test]
    fn regime_filter_without_series_fails_fast() {
        let prices = MapPrices::new(vec![wavy_series("A", 60)]);
        let mut config = permissive_config();
        config.regime = Some(RegimeFilter {
            min: 0.0,
            max: 100.0,
            stabilization: None,
        });
        let (start, end) = range();
        let err = Screener::new(&prices)
            .run(&["A".to_string()], start, end, &MarketContext::default(), &config)
            .unwrap_err();
        assert!(matches!(err, SniperError::ContractViolation { .. }));
    }

    #[test]
    fn relative_strength_floor_without_benchmark_is_ignored() {
        let prices = MapPrices::new(vec![wavy_series("A", 60)]);
        let mut config = permissive_config();
        config.entry.relative_strength_floor = Some(10.0);
        let (start, end) = range();
        let report = Screener::new(&prices)
            .run(&["A".to_string()], start, end, &MarketContext::default(), &config)
            .unwrap();
        assert!(!report.records.is_empty());
    }

    #[test]
    fn fundamentals_filter_skips_failing_tickers() {
        let prices = MapPrices::new(vec![wavy_series("A", 60), wavy_series("B", 60)]);
        let mut snapshots = HashMap::new();
        snapshots.insert(
            "A".to_string(),
            FundamentalsSnapshot {
                market_cap: Some(5e9),
                trailing_pe: Some(15.0),
                return_on_equity: Some(0.2),
                debt_to_equity: Some(50.0),
                free_cashflow: Some(1e8),
                ..FundamentalsSnapshot::default()
            },
        );
        let fundamentals = MapFundamentals { snapshots };
        let mut config = permissive_config();
        config.fundamentals = Some(FundamentalsFilter {
            min_market_cap: Some(1e9),
            min_score: 0,
            ..FundamentalsFilter::default()
        });
        let (start, end) = range();
        let report = Screener::new(&prices)
            .with_fundamentals(&fundamentals)
            .run(
                &["A".to_string(), "B".to_string()],
                start,
                end,
                &MarketContext::default(),
                &config,
            )
            .unwrap();
        assert_eq!(report.stats.failed_fundamentals, 1);
        assert_eq!(report.stats.tickers_scanned, 1);
        assert!(report.records.iter().all(|r| r.ticker() == "A"));
    }

    struct CountingPrices {
        inner: MapPrices,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl PriceDataPort for CountingPrices {
        fn fetch_prices(
            &self,
            ticker: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<PriceSeries, SniperError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.fetch_prices(ticker, start, end)
        }

        fn list_tickers(&self) -> Result<Vec<String>, SniperError> {
            self.inner.list_tickers()
        }
    }

    #[test]
    fn sweep_fetches_each_ticker_once_and_matches_single_runs() {
        let prices = CountingPrices {
            inner: MapPrices::new(vec![wavy_series("A", 60), wavy_series("B", 70)]),
            calls: Default::default(),
        };
        let tickers = vec!["A".to_string(), "MISSING".to_string(), "B".to_string()];
        let (start, end) = range();
        let market = MarketContext::default();
        let base = permissive_config();
        let mut wide = base.clone();
        wide.exit.stop_loss_pct = 25.0;
        let cases = vec![SweepCase::new("base", base.clone()), SweepCase::new("wide", wide)];

        let results = Screener::new(&prices)
            .sweep(&tickers, start, end, &market, &cases)
            .unwrap();

        assert_eq!(prices.calls.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "base");
        assert_eq!(results[1].config.exit.stop_loss_pct, 25.0);
        assert_eq!(results[0].run.provider_failures, 1);
        assert_eq!(results[0].run.tickers_scanned, 2);

        let single = Screener::new(&prices)
            .run(&tickers, start, end, &market, &base)
            .unwrap();
        assert_eq!(results[0].run, single.stats);
        let realized = single
            .records
            .iter()
            .filter(|r| r.trade.exit_reason.is_realized());
        assert_eq!(results[0].stats, TradeStats::compute(realized));
    }

    #[test]
    fn sweep_validates_every_case_before_fetching() {
        let prices = CountingPrices {
            inner: MapPrices::new(vec![wavy_series("A", 60)]),
            calls: Default::default(),
        };
        let mut broken = permissive_config();
        broken.max_positions = 0;
        let cases = vec![
            SweepCase::new("ok", permissive_config()),
            SweepCase::new("broken", broken),
        ];
        let (start, end) = range();
        let err = Screener::new(&prices)
            .sweep(&["A".to_string()], start, end, &MarketContext::default(), &cases)
            .unwrap_err();
        assert!(matches!(err, SniperError::ConfigInvalid { .. }));
        assert_eq!(prices.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn sweep_applies_fundamentals_per_case() {
        let prices = MapPrices::new(vec![wavy_series("A", 60), wavy_series("B", 60)]);
        let mut snapshots = HashMap::new();
        snapshots.insert(
            "A".to_string(),
            FundamentalsSnapshot {
                market_cap: Some(5e9),
                trailing_pe: Some(15.0),
                ..FundamentalsSnapshot::default()
            },
        );
        let fundamentals = MapFundamentals { snapshots };
        let open = permissive_config();
        let mut screened = permissive_config();
        screened.fundamentals = Some(FundamentalsFilter::checks_passed());
        let cases = vec![SweepCase::new("open", open), SweepCase::new("screened", screened)];
        let (start, end) = range();

        let results = Screener::new(&prices)
            .with_fundamentals(&fundamentals)
            .with_parallelism(false)
            .sweep(
                &["A".to_string(), "B".to_string()],
                start,
                end,
                &MarketContext::default(),
                &cases,
            )
            .unwrap();

        assert_eq!(results[0].run.tickers_scanned, 2);
        assert_eq!(results[0].run.failed_fundamentals, 0);
        assert_eq!(results[1].run.tickers_scanned, 1);
        assert_eq!(results[1].run.failed_fundamentals, 1);
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let prices = MapPrices::new(vec![]);
        let (start, end) = range();
        let err = Screener::new(&prices)
            .run(&[], end, start, &MarketContext::default(), &permissive_config())
            .unwrap_err();
        assert!(matches!(err, SniperError::ContractViolation { .. }));
    }
}
