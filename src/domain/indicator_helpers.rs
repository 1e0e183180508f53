//! Shared helper functions for indicator calculations.

use crate::domain::ohlcv::PriceBar;
use std::collections::VecDeque;

/// Wilder-style recursive average with `alpha = 1 / length`.
///
/// Seeds with the first defined observation and emits a value once `length`
/// observations have been seen. Leading `None` inputs are skipped; a gap after
/// warm-up carries the previous average forward.
pub fn wilder_smooth(values: &[Option<f64>], length: usize) -> Vec<Option<f64>> {
    if length == 0 {
        return vec![None; values.len()];
    }

    let alpha = 1.0 / length as f64;
    let mut avg: Option<f64> = None;
    let mut observed = 0usize;
    let mut out = Vec::with_capacity(values.len());

    for value in values {
        if let Some(x) = *value {
            avg = Some(match avg {
                None => x,
                Some(prev) => prev + alpha * (x - prev),
            });
            observed += 1;
        }
        out.push(if observed >= length { avg } else { None });
    }

    out
}

/// True range per bar; the first bar has no previous close and uses high - low.
pub fn true_range_series(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

/// Trailing maximum over `window` values, defined once the window is full.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    // Indices with strictly decreasing values; front is the window max.
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window);
    let mut out = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        while deque.back().is_some_and(|&j| values[j] <= value) {
            deque.pop_back();
        }
        deque.push_back(i);
        if deque.front().is_some_and(|&j| j + window <= i) {
            deque.pop_front();
        }

        if i + 1 >= window {
            out.push(deque.front().map(|&j| values[j]));
        } else {
            out.push(None);
        }
    }

    out
}

/// Trailing arithmetic mean over `window` values, defined once the window is full.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut sum = 0.0;
    let mut out = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out.push(Some(sum / window as f64));
        } else {
            out.push(None);
        }
    }

    out
}

/// Percent change over `lookback` bars, `None` where either end is missing
/// or the base is zero.
pub fn pct_change(values: &[Option<f64>], lookback: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if lookback == 0 || i < lookback {
                return None;
            }
            match (values[i - lookback], values[i]) {
                (Some(base), Some(now)) if base != 0.0 => Some((now - base) / base),
                _ => None,
            }
        })
        .collect()
}
