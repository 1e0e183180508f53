//! Maps a signal bar to the bar and price the trade fills at.

use crate::domain::code_data::PriceSeries;
use crate::domain::config::EntryTiming;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryFill {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
}

/// Returns `None` when the fill bar does not exist (signal on the last bar
/// with a next-bar policy) or carries no usable price.
pub fn resolve_entry(
    series: &PriceSeries,
    signal_index: usize,
    timing: EntryTiming,
) -> Option<EntryFill> {
    let index = match timing {
        EntryTiming::SameBar => signal_index,
        EntryTiming::NextOpen | EntryTiming::NextClose => signal_index.checked_add(1)?,
    };
    let bar = series.bars.get(index)?;
    let price = match timing {
        EntryTiming::NextOpen => bar.open,
        EntryTiming::SameBar | EntryTiming::NextClose => bar.close,
    };
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    Some(EntryFill {
        index,
        date: bar.date,
        price,
    })
}
