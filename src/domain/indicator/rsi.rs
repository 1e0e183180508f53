//! RSI (Relative Strength Index).
//!
//! Average gain and loss use Wilder smoothing (alpha = 1/n) over close-to-close
//! changes. The first change is at bar 1, so the first defined RSI is at bar n.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 50

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::wilder_smooth;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Rsi(period);
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::undefined(indicator_type, bars.len());
    }

    let mut gains = Vec::with_capacity(bars.len());
    let mut losses = Vec::with_capacity(bars.len());
    gains.push(None);
    losses.push(None);
    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gain = wilder_smooth(&gains, period);
    let avg_loss = wilder_smooth(&losses, period);

    let values = avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(l)) if *l == 0.0 => Some(50.0),
            (Some(g), Some(l)) => Some(100.0 - 100.0 / (1.0 + g / l)),
            _ => None,
        })
        .collect();

    IndicatorSeries::new(indicator_type, values)
}
