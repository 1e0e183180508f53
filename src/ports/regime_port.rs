//! Market regime (volatility index) access port.

use crate::domain::error::SniperError;
use crate::domain::regime::RegimeSeries;
use chrono::NaiveDate;

pub trait RegimePort {
    fn fetch_regime(&self, start: NaiveDate, end: NaiveDate) -> Result<RegimeSeries, SniperError>;
}
