//! Simulated trades and risk-based position sizing.

use crate::domain::config::SizingRules;
use crate::domain::error::SniperError;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExitReason {
    Stopped,
    TrailStopped,
    TargetHit,
    TimeExpired,
    /// Ran out of bars while open; priced at the last close, unrealized.
    DataExhausted,
}

impl ExitReason {
    pub const ALL: [ExitReason; 5] = [
        ExitReason::Stopped,
        ExitReason::TrailStopped,
        ExitReason::TargetHit,
        ExitReason::TimeExpired,
        ExitReason::DataExhausted,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExitReason::Stopped => "STOPPED",
            ExitReason::TrailStopped => "TRAIL_STOPPED",
            ExitReason::TargetHit => "TARGET_HIT",
            ExitReason::TimeExpired => "TIME_EXPIRED",
            ExitReason::DataExhausted => "DATA_EXHAUSTED",
        }
    }

    pub fn is_realized(&self) -> bool {
        !matches!(self, ExitReason::DataExhausted)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub ticker: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub stop_pct: f64,
    pub target_pct: f64,
    pub trail_distance_pct: f64,
    /// `None` while the position is still open at the end of the data.
    pub exit_date: Option<NaiveDate>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub return_pct: f64,
    pub hold_days: usize,
    pub trailing_activated: bool,
    /// Lowest low against entry, in percent (zero or negative).
    pub max_adverse_pct: f64,
    /// Highest high against entry, in percent (zero or positive).
    pub max_favorable_pct: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizing {
    pub risk_dollars: f64,
    pub position_value: f64,
    pub shares: u64,
    pub pnl: f64,
}

/// Sizes a position so that hitting the stop loses `risk_per_trade_pct` of
/// the account, capped at `max_position_pct` of the account.
pub fn size_position(
    rules: &SizingRules,
    entry_price: f64,
    stop_pct: f64,
    return_pct: f64,
) -> Result<PositionSizing, SniperError> {
    require_positive(rules.account_size, "account size")?;
    require_positive(rules.risk_per_trade_pct, "risk per trade")?;
    require_positive(rules.max_position_pct, "max position percent")?;
    require_positive(stop_pct, "stop distance")?;
    require_positive(entry_price, "entry price")?;

    let risk_dollars = rules.account_size * rules.risk_per_trade_pct / 100.0;
    let by_risk = risk_dollars / (stop_pct / 100.0);
    let cap = rules.account_size * rules.max_position_pct / 100.0;
    let position_value = by_risk.min(cap);

    Ok(PositionSizing {
        risk_dollars,
        position_value,
        shares: (position_value / entry_price).floor() as u64,
        pnl: position_value * return_pct / 100.0,
    })
}

fn require_positive(value: f64, what: &str) -> Result<(), SniperError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SniperError::contract(format!(
            "{what} must be positive, got {value}"
        )))
    }
}
