//! Rolling-window indicators: trailing high and average volume.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{rolling_max, rolling_mean};
use crate::domain::ohlcv::PriceBar;

/// Trailing maximum of `high` over `window` bars (a 52-week high at 252).
pub fn calculate_rolling_high(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    IndicatorSeries::new(IndicatorType::RollingHigh(window), rolling_max(&highs, window))
}

pub fn calculate_volume_avg(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    IndicatorSeries::new(IndicatorType::VolumeAvg(window), rolling_mean(&volumes, window))
}
