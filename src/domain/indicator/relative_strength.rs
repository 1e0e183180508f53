//! Relative strength against a benchmark.
//!
//! RS(t) = stock return over `lookback` bars - benchmark return over the same
//! bars, both as fractions. The benchmark is forward-filled onto the stock's
//! calendar before differencing.

use crate::domain::code_data::PriceSeries;
use crate::domain::error::SniperError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::pct_change;

pub fn calculate_relative_strength(
    stock: &PriceSeries,
    benchmark: &PriceSeries,
    lookback: usize,
) -> Result<IndicatorSeries, SniperError> {
    let aligned = benchmark.forward_filled_closes(&stock.dates());
    relative_strength_aligned(&stock.closes(), &aligned, lookback)
}

/// Relative strength over two series already on the same calendar.
pub fn relative_strength_aligned(
    stock_closes: &[f64],
    benchmark_closes: &[Option<f64>],
    lookback: usize,
) -> Result<IndicatorSeries, SniperError> {
    if stock_closes.len() != benchmark_closes.len() {
        return Err(SniperError::contract(format!(
            "relative strength inputs differ in length: stock {} vs benchmark {}",
            stock_closes.len(),
            benchmark_closes.len()
        )));
    }

    let stock: Vec<Option<f64>> = stock_closes.iter().copied().map(Some).collect();
    let stock_ret = pct_change(&stock, lookback);
    let bench_ret = pct_change(benchmark_closes, lookback);

    let values = stock_ret
        .iter()
        .zip(bench_ret.iter())
        .map(|(s, b)| match (s, b) {
            (Some(s), Some(b)) => Some(s - b),
            _ => None,
        })
        .collect();

    Ok(IndicatorSeries::new(
        IndicatorType::RelativeStrength(lookback),
        values,
    ))
}
