#![allow(dead_code)]

use chrono::NaiveDate;
use sniper::domain::code_data::PriceSeries;
use sniper::domain::config::{EntryTiming, IndicatorSettings, Profile, ScreenConfig};
use sniper::domain::error::SniperError;
use sniper::domain::fundamentals::FundamentalsSnapshot;
use sniper::domain::position::{ExitReason, PositionSizing, Trade};
use sniper::domain::screen::SignalRecord;
use sniper::domain::signal::{IndicatorSnapshot, SignalCandidate};
pub use sniper::domain::ohlcv::PriceBar;
use sniper::ports::fundamentals_port::FundamentalsPort;
use sniper::ports::price_port::PriceDataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, SniperError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(SniperError::provider("mock", reason.clone()));
        }
        let bars = self
            .data
            .get(ticker)
            .ok_or_else(|| SniperError::provider("mock", format!("no data for {ticker}")))?
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        Ok(PriceSeries::new(ticker, bars))
    }

    fn list_tickers(&self) -> Result<Vec<String>, SniperError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

#[derive(Default)]
pub struct MockFundamentals {
    pub snapshots: HashMap<String, FundamentalsSnapshot>,
    pub errors: HashMap<String, String>,
}

impl MockFundamentals {
    pub fn with_snapshot(mut self, ticker: &str, snapshot: FundamentalsSnapshot) -> Self {
        self.snapshots.insert(ticker.to_string(), snapshot);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl FundamentalsPort for MockFundamentals {
    fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<FundamentalsSnapshot>, SniperError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(SniperError::provider("mock", reason.clone()));
        }
        Ok(self.snapshots.get(ticker).cloned())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// Daily bars whose closes follow `closes`, starting at `start`.
pub fn bars_from_closes(start: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            open: close * 0.995,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 10_000.0,
        })
        .collect()
}

/// Oscillating closes around `base` with amplitude `swing` percent.
pub fn generate_bars(start: &str, count: usize, base: f64, swing: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| base * (1.0 + swing / 100.0 * (i as f64 * 0.3).sin()))
        .collect();
    bars_from_closes(start, &closes)
}

/// Every gate wide open, short indicator windows, same-bar fills.
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

/// A trade on `ticker` entered at 100 on `entry`; `hold` of `None` leaves it open.
pub fn make_record(ticker: &str, entry: NaiveDate, hold: Option<i64>) -> SignalRecord {
    let snapshot = IndicatorSnapshot {
        price: 100.0,
        pct_below_high: 30.0,
        pct_from_sma: 5.0,
        sma_slope: 0.5,
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
    let (exit_date, exit_reason) = match hold {
        Some(days) => (
            Some(entry + chrono::Duration::days(days)),
            ExitReason::TimeExpired,
        ),
        None => (None, ExitReason::DataExhausted),
    };
    SignalRecord {
        candidate: SignalCandidate {
            ticker: ticker.to_string(),
            signal_index: 0,
            signal_date: entry,
            snapshot,
        },
        trade: Trade {
            ticker: ticker.to_string(),
            entry_date: entry,
            entry_price: 100.0,
            stop_pct: 10.0,
            target_pct: 30.0,
            trail_distance_pct: 8.0,
            exit_date,
            exit_price: 101.0,
            exit_reason,
            return_pct: 1.0,
            hold_days: hold.unwrap_or(0).max(0) as usize,
            trailing_activated: false,
            max_adverse_pct: -2.0,
            max_favorable_pct: 3.0,
        },
        sizing: PositionSizing {
            risk_dollars: 1_000.0,
            position_value: 10_000.0,
            shares: 100,
            pnl: 100.0,
        },
    }
}
