//! All indicators for one ticker, aligned with its bars.

use crate::domain::code_data::PriceSeries;
use crate::domain::config::IndicatorSettings;
use crate::domain::error::SniperError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::adx::calculate_adx;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::relative_strength::calculate_relative_strength;
use crate::domain::indicator::rolling::{calculate_rolling_high, calculate_volume_avg};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::{calculate_sma, calculate_sma_slope};

#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub rsi: IndicatorSeries,
    pub adx: IndicatorSeries,
    pub plus_di: IndicatorSeries,
    pub minus_di: IndicatorSeries,
    pub atr: IndicatorSeries,
    pub sma: IndicatorSeries,
    pub sma_slope: IndicatorSeries,
    pub rolling_high: IndicatorSeries,
    pub volume_avg: IndicatorSeries,
    /// Present only when a benchmark series was supplied.
    pub relative_strength: Option<IndicatorSeries>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }
}

pub fn compute_frame(
    series: &PriceSeries,
    settings: &IndicatorSettings,
    benchmark: Option<&PriceSeries>,
) -> Result<IndicatorFrame, SniperError> {
    let bars = &series.bars;
    let adx = calculate_adx(bars, settings.adx_period);
    let sma = calculate_sma(bars, settings.sma_period);
    let sma_slope = calculate_sma_slope(&sma, settings.sma_slope_days);
    let relative_strength = benchmark
        .map(|bench| {
            calculate_relative_strength(series, bench, settings.relative_strength_lookback)
        })
        .transpose()?;

    Ok(IndicatorFrame {
        rsi: calculate_rsi(bars, settings.rsi_period),
        adx: adx.adx,
        plus_di: adx.plus_di,
        minus_di: adx.minus_di,
        atr: calculate_atr(bars, settings.atr_period),
        sma,
        sma_slope,
        rolling_high: calculate_rolling_high(bars, settings.high_window),
        volume_avg: calculate_volume_avg(bars, settings.volume_avg_days),
        relative_strength,
    })
}
