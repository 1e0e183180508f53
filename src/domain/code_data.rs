//! Per-ticker price series and calendar alignment.

use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Builds a series with bars in ascending date order.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            ticker: ticker.into(),
            bars,
            date_index,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn get_bar_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Closes of this series carried onto `dates`: each date takes the last
    /// close on or before it, `None` before the first bar.
    pub fn forward_filled_closes(&self, dates: &[NaiveDate]) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(dates.len());
        let mut cursor = 0usize;
        let mut last: Option<f64> = None;
        for &date in dates {
            while cursor < self.bars.len() && self.bars[cursor].date <= date {
                last = Some(self.bars[cursor].close);
                cursor += 1;
            }
            out.push(last);
        }
        out
    }
}
