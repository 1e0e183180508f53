//! SMA (Simple Moving Average) and its percentage slope.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries::new(IndicatorType::Sma(period), rolling_mean(&closes, period))
}

/// slope(t) = (sma(t) - sma(t - lookback)) / sma(t - lookback) * 100
pub fn calculate_sma_slope(sma: &IndicatorSeries, lookback: usize) -> IndicatorSeries {
    let period = match sma.indicator_type {
        IndicatorType::Sma(p) => p,
        _ => 0,
    };

    let values = (0..sma.len())
        .map(|i| {
            if lookback == 0 || i < lookback {
                return None;
            }
            match (sma.get(i - lookback), sma.get(i)) {
                (Some(base), Some(now)) if base != 0.0 => Some((now - base) / base * 100.0),
                _ => None,
            }
        })
        .collect();

    IndicatorSeries::new(IndicatorType::SmaSlope { period, lookback }, values)
}
