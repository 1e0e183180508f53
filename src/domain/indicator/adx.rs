//! ADX (Average Directional Index) with +DI and -DI.
//!
//! 1. +DM / -DM from consecutive bars (0 on the first bar)
//! 2. Wilder-smooth +DM, -DM and true range
//! 3. +DI = 100 * smoothed(+DM) / ATR, 0 when ATR is 0
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI), 0 when the sum is 0
//! 5. ADX = Wilder-smoothed DX
//!
//! DI is defined from bar n-1, ADX from bar 2n-2.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{true_range_series, wilder_smooth};
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub adx: IndicatorSeries,
    pub plus_di: IndicatorSeries,
    pub minus_di: IndicatorSeries,
}

pub fn calculate_adx(bars: &[PriceBar], period: usize) -> AdxSeries {
    let n = bars.len();
    let mut plus_dm = Vec::with_capacity(n);
    let mut minus_dm = Vec::with_capacity(n);

    for i in 0..n {
        if i == 0 {
            plus_dm.push(Some(0.0));
            minus_dm.push(Some(0.0));
            continue;
        }
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        plus_dm.push(Some(if up > down && up > 0.0 { up } else { 0.0 }));
        minus_dm.push(Some(if down > up && down > 0.0 { down } else { 0.0 }));
    }

    let tr: Vec<Option<f64>> = true_range_series(bars).into_iter().map(Some).collect();
    let atr = wilder_smooth(&tr, period);
    let plus_smooth = wilder_smooth(&plus_dm, period);
    let minus_smooth = wilder_smooth(&minus_dm, period);

    let directional = |dm: &Option<f64>, atr: &Option<f64>| match (dm, atr) {
        (Some(_), Some(a)) if *a == 0.0 => Some(0.0),
        (Some(d), Some(a)) => Some(100.0 * d / a),
        _ => None,
    };

    let plus_di: Vec<Option<f64>> = plus_smooth
        .iter()
        .zip(atr.iter())
        .map(|(dm, a)| directional(dm, a))
        .collect();
    let minus_di: Vec<Option<f64>> = minus_smooth
        .iter()
        .zip(atr.iter())
        .map(|(dm, a)| directional(dm, a))
        .collect();

    let dx: Vec<Option<f64>> = plus_di
        .iter()
        .zip(minus_di.iter())
        .map(|(p, m)| match (p, m) {
            (Some(p), Some(m)) => {
                let sum = p + m;
                if sum == 0.0 {
                    Some(0.0)
                } else {
                    Some(100.0 * (p - m).abs() / sum)
                }
            }
            _ => None,
        })
        .collect();

    AdxSeries {
        adx: IndicatorSeries::new(IndicatorType::Adx(period), wilder_smooth(&dx, period)),
        plus_di: IndicatorSeries::new(IndicatorType::PlusDi(period), plus_di),
        minus_di: IndicatorSeries::new(IndicatorType::MinusDi(period), minus_di),
    }
}
