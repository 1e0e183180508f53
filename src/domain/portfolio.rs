//! Capacity-constrained admission of simulated trades.
//!
//! Admission is a chronological first-come-first-served pass, not an optimal
//! interval schedule: a later, better trade never displaces an earlier one.
//! Holding intervals are half-open, `entry <= t < exit`; a trade still open
//! at the end of the data holds its slot indefinitely.

use crate::domain::metrics::TradeStats;
use crate::domain::screen::SignalRecord;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeOverlap {
    /// Position of the trade in the analyzed slice.
    pub record_index: usize,
    /// Other trades holding a position on this trade's entry date.
    pub concurrent_at_entry: usize,
    /// Most other trades held on any single day of this trade's life.
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioAdmissionReport {
    pub max_positions: usize,
    /// Admitted trades in admission (entry date) order.
    pub taken: Vec<SignalRecord>,
    pub skipped: Vec<SignalRecord>,
    pub overlaps: Vec<TradeOverlap>,
    /// Percentage of trades turned away.
    pub skip_rate: f64,
    pub taken_stats: TradeStats,
    pub skipped_stats: TradeStats,
    pub peak_active: usize,
}

fn holds_on(record: &SignalRecord, day: NaiveDate) -> bool {
    let trade = &record.trade;
    trade.entry_date <= day && trade.exit_date.is_none_or(|exit| day < exit)
}

/// Overlap diagnostics for every record, in input order.
///
/// The number of open trades only rises on entry dates, so the maximum over
/// the days of a trade is found by checking its entry date and every other
/// entry date inside its life.
pub fn analyze_overlaps(records: &[SignalRecord]) -> Vec<TradeOverlap> {
    let horizon = records
        .iter()
        .flat_map(|r| [Some(r.trade.entry_date), r.trade.exit_date])
        .flatten()
        .max();

    let others_on = |own: usize, day: NaiveDate| {
        records
            .iter()
            .enumerate()
            .filter(|&(k, other)| k != own && holds_on(other, day))
            .count()
    };

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let entry = record.trade.entry_date;
            let last_day = record.trade.exit_date.or(horizon).unwrap_or(entry);
            let concurrent_at_entry = others_on(i, entry);
            let max_concurrent = records
                .iter()
                .map(|other| other.trade.entry_date)
                .filter(|&day| day > entry && day <= last_day)
                .map(|day| others_on(i, day))
                .fold(concurrent_at_entry, usize::max);
            TradeOverlap {
                record_index: i,
                concurrent_at_entry,
                max_concurrent,
            }
        })
        .collect()
}

/// Walks trades by entry date, keeping at most `max_positions` open.
///
/// Trades sharing an entry date keep their input order.
pub fn admit_trades(records: &[SignalRecord], max_positions: usize) -> PortfolioAdmissionReport {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| records[i].trade.entry_date);

    let mut active: BinaryHeap<Reverse<(NaiveDate, usize)>> = BinaryHeap::new();
    let mut taken = Vec::new();
    let mut skipped = Vec::new();
    let mut peak_active = 0;

    for i in order {
        let trade = &records[i].trade;
        while let Some(Reverse((exit, _))) = active.peek() {
            if *exit > trade.entry_date {
                break;
            }
            active.pop();
        }

        if active.len() < max_positions {
            active.push(Reverse((trade.exit_date.unwrap_or(NaiveDate::MAX), i)));
            peak_active = peak_active.max(active.len());
            taken.push(records[i].clone());
        } else {
            skipped.push(records[i].clone());
        }
    }

    let skip_rate = if records.is_empty() {
        0.0
    } else {
        skipped.len() as f64 / records.len() as f64 * 100.0
    };

    PortfolioAdmissionReport {
        max_positions,
        taken_stats: TradeStats::compute(&taken),
        skipped_stats: TradeStats::compute(&skipped),
        overlaps: analyze_overlaps(records),
        taken,
        skipped,
        skip_rate,
        peak_active,
    }
}
