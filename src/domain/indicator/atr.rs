//! ATR (Average True Range), Wilder-smoothed true range.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{true_range_series, wilder_smooth};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let tr: Vec<Option<f64>> = true_range_series(bars).into_iter().map(Some).collect();
    IndicatorSeries::new(IndicatorType::Atr(period), wilder_smooth(&tr, period))
}
