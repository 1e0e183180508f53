//! Technical indicator implementations.
//!
//! Every indicator produces an [`IndicatorSeries`] aligned index-for-index
//! with the input bars. Values before warm-up are `None`; there is no
//! zero or NaN placeholder anywhere in a series.

pub mod adx;
pub mod atr;
pub mod frame;
pub mod relative_strength;
pub mod rolling;
pub mod rsi;
pub mod sma;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    PlusDi(usize),
    MinusDi(usize),
    Sma(usize),
    SmaSlope { period: usize, lookback: usize },
    RollingHigh(usize),
    VolumeAvg(usize),
    RelativeStrength(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, values: Vec<Option<f64>>) -> Self {
        Self {
            indicator_type,
            values,
        }
    }

    pub fn undefined(indicator_type: IndicatorType, len: usize) -> Self {
        Self::new(indicator_type, vec![None; len])
    }

    /// Value at `index`, `None` when undefined or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::PlusDi(period) => write!(f, "+DI({})", period),
            IndicatorType::MinusDi(period) => write!(f, "-DI({})", period),
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::SmaSlope { period, lookback } => {
                write!(f, "SMA_SLOPE({},{})", period, lookback)
            }
            IndicatorType::RollingHigh(window) => write!(f, "HIGH({})", window),
            IndicatorType::VolumeAvg(window) => write!(f, "VOLUME_AVG({})", window),
            IndicatorType::RelativeStrength(lookback) => write!(f, "RS({})", lookback),
        }
    }
}
