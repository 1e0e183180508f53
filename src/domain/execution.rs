//! Day-stepped exit simulation for a single long trade.
//!
//! Each bar after entry:
//! 1. the running highest high is updated
//! 2. trailing activates once the high reaches the activation price
//! 3. an active trailing stop ratchets up to `highest * (1 - trail%)`
//! 4. the low is checked against the current stop, then the high against
//!    the target
//!
//! Stop precedes target, so a bar touching both exits at the stop. A trade
//! still open after `max_hold_days` bars exits at that bar's close.

use crate::domain::config::ExitRules;
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::ExitReason;
use crate::domain::stops::ExitLevels;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct ExitSimulator {
    entry_price: f64,
    stop_price: f64,
    target_price: f64,
    activation_price: f64,
    trail_fraction: f64,
    trailing_enabled: bool,
    highest_high: f64,
    lowest_low: f64,
    trailing_active: bool,
    trailing_stop: f64,
}

impl ExitSimulator {
    pub fn new(entry_price: f64, levels: &ExitLevels, trailing_enabled: bool) -> Self {
        let stop_price = entry_price * (1.0 - levels.stop_pct / 100.0);
        Self {
            entry_price,
            stop_price,
            target_price: entry_price * (1.0 + levels.target_pct / 100.0),
            activation_price: entry_price * (1.0 + levels.trail_activation_pct / 100.0),
            trail_fraction: 1.0 - levels.trail_distance_pct / 100.0,
            trailing_enabled,
            highest_high: entry_price,
            lowest_low: entry_price,
            trailing_active: false,
            trailing_stop: stop_price,
        }
    }

    pub fn is_trailing(&self) -> bool {
        self.trailing_active
    }

    pub fn trailing_stop(&self) -> f64 {
        self.trailing_stop
    }

    pub fn current_stop(&self) -> f64 {
        if self.trailing_active {
            self.trailing_stop
        } else {
            self.stop_price
        }
    }

    pub fn target_price(&self) -> f64 {
        self.target_price
    }

    /// Advances one bar; returns the fill price and reason if the trade exits.
    pub fn step(&mut self, bar: &PriceBar) -> Option<(f64, ExitReason)> {
        self.highest_high = self.highest_high.max(bar.high);
        self.lowest_low = self.lowest_low.min(bar.low);

        if self.trailing_enabled && !self.trailing_active && bar.high >= self.activation_price {
            self.trailing_active = true;
        }
        if self.trailing_active {
            self.trailing_stop = self
                .trailing_stop
                .max(self.highest_high * self.trail_fraction);
        }

        let stop = self.current_stop();
        if bar.low <= stop {
            let reason = if self.trailing_active {
                ExitReason::TrailStopped
            } else {
                ExitReason::Stopped
            };
            return Some((stop, reason));
        }
        if bar.high >= self.target_price {
            return Some((self.target_price, ExitReason::TargetHit));
        }
        None
    }

    fn excursions(&self) -> (f64, f64) {
        (
            (self.lowest_low - self.entry_price) / self.entry_price * 100.0,
            (self.highest_high - self.entry_price) / self.entry_price * 100.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitOutcome {
    pub exit_index: usize,
    /// `None` for [`ExitReason::DataExhausted`].
    pub exit_date: Option<NaiveDate>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub return_pct: f64,
    pub hold_days: usize,
    pub trailing_activated: bool,
    pub max_adverse_pct: f64,
    pub max_favorable_pct: f64,
}

/// Simulates a trade entered at `entry_price` on bar `entry_index`.
pub fn simulate_exit(
    bars: &[PriceBar],
    entry_index: usize,
    entry_price: f64,
    levels: &ExitLevels,
    rules: &ExitRules,
) -> ExitOutcome {
    let mut sim = ExitSimulator::new(entry_price, levels, rules.trailing_enabled);
    let pct = |price: f64| (price - entry_price) / entry_price * 100.0;

    for day in 1..=rules.max_hold_days {
        let index = entry_index + day;
        let Some(bar) = bars.get(index) else {
            return data_exhausted(&sim, bars, entry_index, entry_price);
        };

        if let Some((price, reason)) = sim.step(bar) {
            let return_pct = match reason {
                ExitReason::TargetHit => levels.target_pct,
                _ => pct(price),
            };
            let (adverse, favorable) = sim.excursions();
            return ExitOutcome {
                exit_index: index,
                exit_date: Some(bar.date),
                exit_price: price,
                exit_reason: reason,
                return_pct,
                hold_days: day,
                trailing_activated: sim.is_trailing(),
                max_adverse_pct: adverse,
                max_favorable_pct: favorable,
            };
        }
    }

    let index = entry_index + rules.max_hold_days;
    let Some(bar) = bars.get(index) else {
        return data_exhausted(&sim, bars, entry_index, entry_price);
    };
    let (adverse, favorable) = sim.excursions();
    ExitOutcome {
        exit_index: index,
        exit_date: Some(bar.date),
        exit_price: bar.close,
        exit_reason: ExitReason::TimeExpired,
        return_pct: pct(bar.close),
        hold_days: rules.max_hold_days,
        trailing_activated: sim.is_trailing(),
        max_adverse_pct: adverse,
        max_favorable_pct: favorable,
    }
}

fn data_exhausted(
    sim: &ExitSimulator,
    bars: &[PriceBar],
    entry_index: usize,
    entry_price: f64,
) -> ExitOutcome {
    let last_index = bars.len().saturating_sub(1).max(entry_index);
    let last_close = bars.get(last_index).map(|b| b.close).unwrap_or(entry_price);
    let (adverse, favorable) = sim.excursions();
    ExitOutcome {
        exit_index: last_index,
        exit_date: None,
        exit_price: last_close,
        exit_reason: ExitReason::DataExhausted,
        return_pct: (last_close - entry_price) / entry_price * 100.0,
        hold_days: last_index - entry_index,
        trailing_activated: sim.is_trailing(),
        max_adverse_pct: adverse,
        max_favorable_pct: favorable,
    }
}
