//! Aggregate statistics over simulated trades.
//!
//! Rates are percentages. Returns are per-trade percent returns; a trade is
//! a winner when its return is strictly positive, everything else counts as
//! a loser.

use crate::domain::position::ExitReason;
use crate::domain::screen::SignalRecord;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub winners: usize,
    pub losers: usize,
    pub win_rate: f64,
    pub avg_return: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub avg_hold_days: f64,
    pub median_hold_days: f64,
    pub win_loss_ratio: f64,
    pub expectancy: f64,
    pub profit_factor: f64,
    pub sharpe_like: f64,
    pub trailing_activated: usize,
    pub exit_breakdown: BTreeMap<ExitReason, usize>,
}

impl TradeStats {
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SignalRecord>,
    {
        let records: Vec<&SignalRecord> = records.into_iter().collect();
        if records.is_empty() {
            return Self::default();
        }

        let n = records.len() as f64;
        let returns: Vec<f64> = records.iter().map(|r| r.trade.return_pct).collect();
        let wins: Vec<f64> = returns.iter().copied().filter(|&r| r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|&r| r <= 0.0).collect();

        let avg_return = returns.iter().sum::<f64>() / n;
        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);
        let win_rate = wins.len() as f64 / n * 100.0;

        let win_loss_ratio = if !losses.is_empty() && avg_loss != 0.0 {
            (avg_win / avg_loss).abs()
        } else {
            f64::INFINITY
        };

        let loss_sum: f64 = losses.iter().sum();
        let profit_factor = if !losses.is_empty() && loss_sum != 0.0 {
            wins.iter().sum::<f64>() / loss_sum.abs()
        } else {
            f64::INFINITY
        };

        let std = sample_std(&returns, avg_return);
        let sharpe_like = if std > 0.0 { avg_return / std } else { 0.0 };

        let total_pnl: f64 = records.iter().map(|r| r.sizing.pnl).sum();
        let mut holds: Vec<f64> = records.iter().map(|r| r.trade.hold_days as f64).collect();
        let avg_hold_days = holds.iter().sum::<f64>() / n;
        holds.sort_by(f64::total_cmp);

        let mut exit_breakdown = BTreeMap::new();
        for record in &records {
            *exit_breakdown.entry(record.trade.exit_reason).or_insert(0) += 1;
        }

        Self {
            total_trades: records.len(),
            winners: wins.len(),
            losers: losses.len(),
            win_rate,
            avg_return,
            avg_win,
            avg_loss,
            best_trade: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            worst_trade: returns.iter().copied().fold(f64::INFINITY, f64::min),
            total_pnl,
            avg_pnl: total_pnl / n,
            avg_hold_days,
            median_hold_days: median(&holds),
            win_loss_ratio,
            expectancy: win_rate / 100.0 * avg_win + (100.0 - win_rate) / 100.0 * avg_loss,
            profit_factor,
            sharpe_like,
            trailing_activated: records.iter().filter(|r| r.trade.trailing_activated).count(),
            exit_breakdown,
        }
    }

    pub fn exits(&self, reason: ExitReason) -> usize {
        self.exit_breakdown.get(&reason).copied().unwrap_or(0)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Median of an already sorted slice.
fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}
