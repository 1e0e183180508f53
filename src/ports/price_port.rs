//! Daily price data access port.

use crate::domain::code_data::PriceSeries;
use crate::domain::error::SniperError;
use chrono::NaiveDate;

pub trait PriceDataPort {
    /// Daily bars for `ticker` in `[start, end]`, ascending by date.
    fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, SniperError>;

    fn list_tickers(&self) -> Result<Vec<String>, SniperError>;
}
