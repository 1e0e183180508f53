//! Entry signal evaluation and debounced scanning.
//!
//! A bar is a candidate when every gate passes, checked in this order:
//! indicators defined, distance below the rolling high, distance from the
//! SMA and the SMA floor, SMA slope, RSI trigger, ADX, then the optional
//! volume, relative strength and regime gates. The first failing gate is
//! reported as the bar's [`Rejection`].

use crate::domain::code_data::PriceSeries;
use crate::domain::config::{EntryRules, RegimeFilter, ScreenConfig};
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::frame::IndicatorFrame;
use crate::domain::regime::RegimeSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    IndicatorUndefined,
    DistanceFromHigh,
    DistanceFromSma,
    BelowSmaFloor,
    SmaSlope,
    NoRsiTrigger,
    WeakTrend,
    LowVolume,
    RelativeStrength,
    RegimeMissing,
    RegimeOutOfRange,
    RegimeNotStabilized,
    Debounced,
}

impl Rejection {
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::IndicatorUndefined => "indicator_undefined",
            Rejection::DistanceFromHigh => "distance_from_high",
            Rejection::DistanceFromSma => "distance_from_sma",
            Rejection::BelowSmaFloor => "below_sma_floor",
            Rejection::SmaSlope => "sma_slope",
            Rejection::NoRsiTrigger => "no_rsi_trigger",
            Rejection::WeakTrend => "weak_trend",
            Rejection::LowVolume => "low_volume",
            Rejection::RelativeStrength => "relative_strength",
            Rejection::RegimeMissing => "regime_missing",
            Rejection::RegimeOutOfRange => "regime_out_of_range",
            Rejection::RegimeNotStabilized => "regime_not_stabilized",
            Rejection::Debounced => "debounced",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-gate rejection tally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RejectionCounts {
    counts: BTreeMap<Rejection, usize>,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: Rejection) {
        *self.counts.entry(rejection).or_insert(0) += 1;
    }

    pub fn get(&self, rejection: Rejection) -> usize {
        self.counts.get(&rejection).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn merge(&mut self, other: &RejectionCounts) {
        for (&rejection, &count) in &other.counts {
            *self.counts.entry(rejection).or_insert(0) += count;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rejection, usize)> + '_ {
        self.counts.iter().map(|(&r, &c)| (r, c))
    }
}

/// Indicator values at the signal bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub pct_below_high: f64,
    pub pct_from_sma: f64,
    pub sma_slope: f64,
    pub rsi: f64,
    pub adx: f64,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub atr: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub relative_strength: Option<f64>,
    pub regime_value: Option<f64>,
    pub regime_drop_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalCandidate {
    pub ticker: String,
    pub signal_index: usize,
    pub signal_date: NaiveDate,
    pub snapshot: IndicatorSnapshot,
}

#[derive(Debug, Clone, Default)]
pub struct SignalScan {
    pub candidates: Vec<SignalCandidate>,
    pub rejections: RejectionCounts,
}

/// Checks every entry gate at bar `index`.
pub fn evaluate_bar(
    series: &PriceSeries,
    frame: &IndicatorFrame,
    index: usize,
    config: &ScreenConfig,
    regime: Option<&RegimeSeries>,
) -> Result<IndicatorSnapshot, Rejection> {
    let rules = &config.entry;
    let bar = series.bars.get(index).ok_or(Rejection::IndicatorUndefined)?;
    let price = bar.close;
    if !price.is_finite() {
        return Err(Rejection::IndicatorUndefined);
    }

    let sma = defined(&frame.sma, index)?;
    let high = defined(&frame.rolling_high, index)?;
    let adx = defined(&frame.adx, index)?;
    let rsi = defined(&frame.rsi, index)?;
    let slope = defined(&frame.sma_slope, index)?;
    if sma <= 0.0 || high <= 0.0 {
        return Err(Rejection::IndicatorUndefined);
    }

    let pct_below_high = (high - price) / high * 100.0;
    if pct_below_high < rules.min_below_high_pct || pct_below_high > rules.max_below_high_pct {
        return Err(Rejection::DistanceFromHigh);
    }

    let pct_from_sma = (price - sma).abs() / sma * 100.0;
    if pct_from_sma > rules.max_from_sma_pct {
        return Err(Rejection::DistanceFromSma);
    }
    if price < sma * (1.0 - rules.sma_floor_slack) {
        return Err(Rejection::BelowSmaFloor);
    }

    if slope < rules.sma_slope_floor {
        return Err(Rejection::SmaSlope);
    }

    if !rsi_triggered(&frame.rsi, index, rules) {
        return Err(Rejection::NoRsiTrigger);
    }

    if adx < rules.adx_min {
        return Err(Rejection::WeakTrend);
    }

    let volume_ratio = match rules.volume_surge_mult {
        Some(mult) => {
            let avg = defined(&frame.volume_avg, index)?;
            if avg == 0.0 {
                return Err(Rejection::LowVolume);
            }
            let ratio = bar.volume / avg;
            if !ratio.is_finite() {
                return Err(Rejection::IndicatorUndefined);
            }
            if ratio < mult {
                return Err(Rejection::LowVolume);
            }
            Some(ratio)
        }
        None => None,
    };

    let relative_strength = match (rules.relative_strength_floor, &frame.relative_strength) {
        (Some(floor), Some(rs_series)) => {
            let rs = defined(rs_series, index)?;
            if rs < floor {
                return Err(Rejection::RelativeStrength);
            }
            Some(rs)
        }
        (None, Some(rs_series)) => rs_series.get(index).filter(|v| v.is_finite()),
        (_, None) => None,
    };

    let (regime_value, regime_drop_pct) = match &config.regime {
        Some(filter) => check_regime(filter, regime, bar.date)?,
        None => (regime.and_then(|r| r.value_on(bar.date)), None),
    };

    Ok(IndicatorSnapshot {
        price,
        pct_below_high,
        pct_from_sma,
        sma_slope: slope,
        rsi,
        adx,
        plus_di: frame.plus_di.get(index),
        minus_di: frame.minus_di.get(index),
        atr: frame.atr.get(index),
        volume_ratio,
        relative_strength,
        regime_value,
        regime_drop_pct,
    })
}

/// Scans a ticker left to right, suppressing candidates closer than
/// `min_gap_days` bars to the previous one.
pub fn scan_signals(
    series: &PriceSeries,
    frame: &IndicatorFrame,
    config: &ScreenConfig,
    regime: Option<&RegimeSeries>,
) -> SignalScan {
    let mut scan = SignalScan::default();
    let mut last_signal: Option<usize> = None;
    let gap = config.entry.min_gap_days;

    for index in config.warmup_bars().min(series.len())..series.len() {
        if last_signal.is_some_and(|last| index < last + gap) {
            scan.rejections.record(Rejection::Debounced);
            continue;
        }
        match evaluate_bar(series, frame, index, config, regime) {
            Ok(snapshot) => {
                scan.candidates.push(SignalCandidate {
                    ticker: series.ticker.clone(),
                    signal_index: index,
                    signal_date: series.bars[index].date,
                    snapshot,
                });
                last_signal = Some(index);
            }
            Err(rejection) => scan.rejections.record(rejection),
        }
    }

    scan
}

/// A value that is missing or not finite leaves the bar undecidable.
fn defined(series: &IndicatorSeries, index: usize) -> Result<f64, Rejection> {
    series
        .get(index)
        .filter(|v| v.is_finite())
        .ok_or(Rejection::IndicatorUndefined)
}

/// True when, for some j in 1..=lookback, RSI crossed above the signal level
/// between bars i-j and i-j+1, or RSI at i-j was at or below oversold.
fn rsi_triggered(rsi: &IndicatorSeries, index: usize, rules: &EntryRules) -> bool {
    (1..=rules.rsi_lookback)
        .filter(|&j| j <= index)
        .any(|j| match rsi.get(index - j) {
            Some(prev) => {
                let crossed = prev <= rules.rsi_signal
                    && rsi.get(index - j + 1).is_some_and(|curr| curr > rules.rsi_signal);
                crossed || prev <= rules.rsi_oversold
            }
            None => false,
        })
}

fn check_regime(
    filter: &RegimeFilter,
    regime: Option<&RegimeSeries>,
    date: NaiveDate,
) -> Result<(Option<f64>, Option<f64>), Rejection> {
    let regime = regime.ok_or(Rejection::RegimeMissing)?;
    let value = regime
        .value_on(date)
        .filter(|v| v.is_finite())
        .ok_or(Rejection::RegimeMissing)?;
    if value < filter.min || value > filter.max {
        return Err(Rejection::RegimeOutOfRange);
    }
    let drop = match &filter.stabilization {
        Some(stab) => {
            let drop = regime
                .drop_from_peak(date, stab.lookback)
                .ok_or(Rejection::RegimeNotStabilized)?;
            if drop < stab.min_drop_pct {
                return Err(Rejection::RegimeNotStabilized);
            }
            Some(drop)
        }
        None => None,
    };
    Ok((Some(value), drop))
}
