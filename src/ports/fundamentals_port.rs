//! Company fundamentals access port.

use crate::domain::error::SniperError;
use crate::domain::fundamentals::FundamentalsSnapshot;

pub trait FundamentalsPort {
    /// `Ok(None)` when the source has no record for `ticker`.
    fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<FundamentalsSnapshot>, SniperError>;
}
