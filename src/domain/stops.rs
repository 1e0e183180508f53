//! Stop, target and trailing distances resolved once at entry.
//!
//! All distances are percentages of the entry price. `fixed` uses the
//! configured values as they are. The derived modes clamp the stop and the
//! trail to `[min_stop_pct, max_stop_pct]` and set the target to
//! `stop * reward_risk_ratio`.

use crate::domain::config::{ExitRules, StopMode};

/// ATR stand-in, as a fraction of entry price, when ATR is undefined.
pub const ATR_FALLBACK_FRACTION: f64 = 0.02;

const MIN_SWING_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitLevels {
    pub stop_pct: f64,
    pub target_pct: f64,
    pub trail_distance_pct: f64,
    pub trail_activation_pct: f64,
}

/// Lowest structural support before `index`.
///
/// Looks at `lows[index - lookback .. index]`. A swing low is strictly below
/// the two bars on each side; the most recent one wins. Without a swing low
/// the window minimum is used, and with fewer than five bars the low at
/// `index` itself.
pub fn find_swing_low(lows: &[f64], index: usize, lookback: usize) -> f64 {
    let start = index.saturating_sub(lookback);
    let end = index.min(lows.len());
    let window = &lows[start.min(end)..end];

    if window.len() < MIN_SWING_WINDOW {
        return lows.get(index).copied().unwrap_or(f64::NAN);
    }

    let swing = (2..window.len() - 2).rev().find(|&k| {
        let v = window[k];
        v < window[k - 1] && v < window[k - 2] && v < window[k + 1] && v < window[k + 2]
    });

    match swing {
        Some(k) => window[k],
        None => window.iter().copied().fold(f64::INFINITY, f64::min),
    }
}

/// Resolves exit distances for a trade filled at `entry_price` on bar
/// `entry_index`. `atr` is the ATR known when the signal fired.
pub fn derive_exit_levels(
    rules: &ExitRules,
    entry_price: f64,
    entry_index: usize,
    atr: Option<f64>,
    lows: &[f64],
) -> ExitLevels {
    let atr = atr.unwrap_or(entry_price * ATR_FALLBACK_FRACTION);

    let (stop_pct, trail_pct) = match rules.stop_mode {
        StopMode::Fixed => {
            return with_activation(
                rules,
                rules.stop_loss_pct,
                rules.take_profit_pct,
                rules.trail_distance_pct,
            );
        }
        StopMode::Atr => (
            atr * rules.atr_stop_mult / entry_price * 100.0,
            atr * rules.atr_trail_mult / entry_price * 100.0,
        ),
        StopMode::Pivot => {
            let swing = find_swing_low(lows, entry_index, rules.pivot_lookback);
            let stop_price = swing * (1.0 - rules.pivot_buffer_pct / 100.0);
            let stop_pct = (entry_price - stop_price) / entry_price * 100.0;
            (stop_pct, stop_pct * rules.pivot_trail_fraction)
        }
        StopMode::Hybrid => {
            let swing = find_swing_low(lows, entry_index, rules.pivot_lookback);
            let stop_price = swing - atr * rules.hybrid_atr_buffer;
            (
                (entry_price - stop_price) / entry_price * 100.0,
                atr * rules.atr_trail_mult / entry_price * 100.0,
            )
        }
    };

    let stop_pct = clamp_pct(stop_pct, rules.min_stop_pct, rules.max_stop_pct);
    let trail_pct = clamp_pct(trail_pct, rules.min_stop_pct, rules.max_stop_pct);
    with_activation(rules, stop_pct, stop_pct * rules.reward_risk_ratio, trail_pct)
}

fn with_activation(rules: &ExitRules, stop_pct: f64, target_pct: f64, trail_pct: f64) -> ExitLevels {
    ExitLevels {
        stop_pct,
        target_pct,
        trail_distance_pct: trail_pct,
        trail_activation_pct: rules.trail_activation_pct.unwrap_or(stop_pct),
    }
}

/// NaN (from a missing low) clamps to the floor.
fn clamp_pct(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}
