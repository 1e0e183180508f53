//! Market regime index (volatility index closes) keyed by date.

use crate::domain::code_data::PriceSeries;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RegimeSeries {
    pub symbol: String,
    points: Vec<RegimePoint>,
    index: HashMap<NaiveDate, usize>,
}

impl RegimeSeries {
    pub fn new(symbol: impl Into<String>, mut points: Vec<RegimePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();
        Self {
            symbol: symbol.into(),
            points,
            index,
        }
    }

    /// Uses the closes of a price series as regime values.
    pub fn from_prices(series: &PriceSeries) -> Self {
        let points = series
            .bars
            .iter()
            .map(|b| RegimePoint {
                date: b.date,
                value: b.close,
            })
            .collect();
        Self::new(series.ticker.clone(), points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.index.get(&date).map(|&i| self.points[i].value)
    }

    /// Percent the value on `date` sits below the highest value of the
    /// trailing `lookback` observations ending on `date`.
    pub fn drop_from_peak(&self, date: NaiveDate, lookback: usize) -> Option<f64> {
        let idx = *self.index.get(&date)?;
        if lookback == 0 || idx + 1 < lookback {
            return None;
        }
        let window = &self.points[idx + 1 - lookback..=idx];
        let peak = window
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);
        if peak <= 0.0 {
            return None;
        }
        Some((peak - self.points[idx].value) / peak * 100.0)
    }
}
