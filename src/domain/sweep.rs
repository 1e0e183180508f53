//! Parameter sweeps: one screen per configuration over a shared universe.
//!
//! Statistics cover realized trades only. Trades still open when the data
//! ran out are counted in `open_trades` and left out of every figure.

use crate::domain::config::{EntryTiming, RegimeFilter, ScreenConfig, StopMode};
use crate::domain::metrics::TradeStats;
use crate::domain::screen::{RunStats, SignalRecord};
use chrono::Datelike;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One labelled configuration to screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepCase {
    pub label: String,
    pub config: ScreenConfig,
}

impl SweepCase {
    pub fn new(label: impl Into<String>, config: ScreenConfig) -> Self {
        Self {
            label: label.into(),
            config,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub label: String,
    /// The configuration as screened, after filters without inputs were dropped.
    pub config: ScreenConfig,
    pub stats: TradeStats,
    pub open_trades: usize,
    /// Mean stop distance of realized trades, percent.
    pub avg_stop_pct: f64,
    /// Realized PnL keyed by signal year.
    pub yearly_pnl: BTreeMap<i32, f64>,
    pub run: RunStats,
}

impl SweepResult {
    pub fn from_records(
        label: String,
        config: ScreenConfig,
        records: &[SignalRecord],
        run: RunStats,
    ) -> Self {
        let realized: Vec<&SignalRecord> = records
            .iter()
            .filter(|r| r.trade.exit_reason.is_realized())
            .collect();

        let avg_stop_pct = if realized.is_empty() {
            0.0
        } else {
            realized.iter().map(|r| r.trade.stop_pct).sum::<f64>() / realized.len() as f64
        };

        let mut yearly_pnl = BTreeMap::new();
        for record in &realized {
            *yearly_pnl
                .entry(record.candidate.signal_date.year())
                .or_insert(0.0) += record.sizing.pnl;
        }

        Self {
            label,
            config,
            stats: TradeStats::compute(realized.iter().copied()),
            open_trades: records.len() - realized.len(),
            avg_stop_pct,
            yearly_pnl,
            run,
        }
    }

    /// Summed PnL over the given years; years without trades add nothing.
    pub fn pnl_in_years(&self, years: &[i32]) -> f64 {
        years
            .iter()
            .filter_map(|year| self.yearly_pnl.get(year))
            .sum()
    }

    pub fn worst_year_pnl(&self) -> Option<f64> {
        self.yearly_pnl.values().copied().min_by(f64::total_cmp)
    }

    /// Total PnL over the magnitude of the worst year. Falls back to the
    /// total when the worst year broke exactly even.
    pub fn pnl_to_worst_year(&self) -> f64 {
        match self.worst_year_pnl() {
            Some(worst) if worst != 0.0 => self.stats.total_pnl / worst.abs(),
            _ => self.stats.total_pnl,
        }
    }
}

/// Ranking key for sweep results, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOrder {
    TotalPnl,
    WinRate,
    AvgReturn,
    PnlToWorstYear,
}

impl SweepOrder {
    fn key(&self, result: &SweepResult) -> f64 {
        match self {
            SweepOrder::TotalPnl => result.stats.total_pnl,
            SweepOrder::WinRate => result.stats.win_rate,
            SweepOrder::AvgReturn => result.stats.avg_return,
            SweepOrder::PnlToWorstYear => result.pnl_to_worst_year(),
        }
    }
}

impl FromStr for SweepOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pnl" | "total_pnl" => Ok(SweepOrder::TotalPnl),
            "win_rate" => Ok(SweepOrder::WinRate),
            "avg_return" => Ok(SweepOrder::AvgReturn),
            "worst_year" | "pnl_to_worst_year" => Ok(SweepOrder::PnlToWorstYear),
            other => Err(format!(
                "unknown sweep order '{other}' (expected pnl, win_rate, avg_return or worst_year)"
            )),
        }
    }
}

impl fmt::Display for SweepOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SweepOrder::TotalPnl => "pnl",
            SweepOrder::WinRate => "win_rate",
            SweepOrder::AvgReturn => "avg_return",
            SweepOrder::PnlToWorstYear => "worst_year",
        };
        f.write_str(name)
    }
}

/// Sorts best first. Ties keep case order.
pub fn rank(results: &mut [SweepResult], order: SweepOrder) {
    results.sort_by(|a, b| order.key(b).total_cmp(&order.key(a)));
}

/// Every stop mode under every entry timing, other settings from `base`.
pub fn stop_timing_grid(base: &ScreenConfig) -> Vec<SweepCase> {
    StopMode::ALL
        .into_iter()
        .flat_map(|mode| {
            EntryTiming::ALL.into_iter().map(move |timing| {
                let mut config = base.clone();
                config.exit.stop_mode = mode;
                config.entry.entry_timing = timing;
                SweepCase::new(format!("{mode} / {timing}"), config)
            })
        })
        .collect()
}

/// One case per regime band. Stabilization settings carry over from `base`.
pub fn regime_grid(base: &ScreenConfig, ranges: &[(f64, f64)]) -> Vec<SweepCase> {
    let stabilization = base.regime.as_ref().and_then(|r| r.stabilization.clone());
    ranges
        .iter()
        .map(|&(min, max)| {
            let mut config = base.clone();
            config.regime = Some(RegimeFilter {
                min,
                max,
                stabilization: stabilization.clone(),
            });
            SweepCase::new(format!("regime {min}-{max}"), config)
        })
        .collect()
}

/// Wide, moderate, conservative, tight, sweet-spot, higher-floor and
/// recovery-only bands.
pub fn default_regime_ranges() -> Vec<(f64, f64)> {
    vec![
        (20.0, 50.0),
        (20.0, 40.0),
        (20.0, 35.0),
        (20.0, 30.0),
        (22.0, 38.0),
        (25.0, 40.0),
        (18.0, 28.0),
    ]
}

/// Parses `min-max` bands separated by commas, e.g. `20-35,22-38`.
pub fn parse_regime_ranges(raw: &str) -> Result<Vec<(f64, f64)>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (min, max) = part
                .split_once('-')
                .ok_or_else(|| format!("'{part}' is not a min-max band"))?;
            let min: f64 = min
                .trim()
                .parse()
                .map_err(|e| format!("'{part}': bad minimum: {e}"))?;
            let max: f64 = max
                .trim()
                .parse()
                .map_err(|e| format!("'{part}': bad maximum: {e}"))?;
            if min > max {
                return Err(format!("'{part}': minimum above maximum"));
            }
            Ok((min, max))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::Profile;
    use crate::domain::position::ExitReason;
    use crate::domain::screen::tests::make_record;
    use approx::assert_relative_eq;

    fn records() -> Vec<SignalRecord> {
        vec![
            make_record("A", "2020-03-02", "2020-03-20", 12.0, ExitReason::TargetHit),
            make_record("B", "2020-06-01", "2020-06-15", -8.0, ExitReason::Stopped),
            make_record("C", "2022-05-02", "2022-05-30", -5.0, ExitReason::TimeExpired),
            make_record("D", "2023-01-03", "2023-02-01", 20.0, ExitReason::DataExhausted),
        ]
    }

    #[test]
    fn open_trades_stay_out_of_the_figures() {
        let result = SweepResult::from_records(
            "base".into(),
            Profile::Balanced.config(),
            &records(),
            RunStats::default(),
        );
        assert_eq!(result.stats.total_trades, 3);
        assert_eq!(result.open_trades, 1);
        // 10,000 positions: +1,200 -800 -500
        assert_relative_eq!(result.stats.total_pnl, -100.0, epsilon = 1e-9);
        assert_relative_eq!(result.avg_stop_pct, 10.0, epsilon = 1e-9);
        assert!(!result.yearly_pnl.contains_key(&2023));
    }

    #[test]
    fn yearly_pnl_and_worst_year() {
        let result = SweepResult::from_records(
            "base".into(),
            Profile::Balanced.config(),
            &records(),
            RunStats::default(),
        );
        assert_relative_eq!(result.yearly_pnl[&2020], 400.0, epsilon = 1e-9);
        assert_relative_eq!(result.yearly_pnl[&2022], -500.0, epsilon = 1e-9);
        assert_relative_eq!(result.pnl_in_years(&[2020, 2022, 2021]), -100.0, epsilon = 1e-9);
        assert_eq!(result.worst_year_pnl(), Some(-500.0));
        assert_relative_eq!(result.pnl_to_worst_year(), -0.2, epsilon = 1e-9);
    }

    #[test]
    fn empty_case_reports_zeroes() {
        let result = SweepResult::from_records(
            "none".into(),
            Profile::Balanced.config(),
            &[],
            RunStats::default(),
        );
        assert_eq!(result.stats, TradeStats::default());
        assert_eq!(result.avg_stop_pct, 0.0);
        assert_eq!(result.worst_year_pnl(), None);
        assert_eq!(result.pnl_to_worst_year(), 0.0);
    }

    #[test]
    fn rank_orders_best_first_and_keeps_ties_stable() {
        let config = Profile::Balanced.config();
        let make = |label: &str, pnl: f64, win_rate: f64| {
            let mut result =
                SweepResult::from_records(label.into(), config.clone(), &[], RunStats::default());
            result.stats.total_pnl = pnl;
            result.stats.win_rate = win_rate;
            result
        };
        let mut results = vec![make("a", 100.0, 60.0), make("b", 300.0, 40.0), make("c", 100.0, 70.0)];

        rank(&mut results, SweepOrder::TotalPnl);
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["b", "a", "c"]);

        rank(&mut results, SweepOrder::WinRate);
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["c", "a", "b"]);
    }

    #[test]
    fn stop_timing_grid_covers_every_pair() {
        let base = Profile::Balanced.config();
        let cases = stop_timing_grid(&base);
        assert_eq!(cases.len(), 12);
        assert_eq!(cases[0].label, "fixed / same_bar");
        assert_eq!(cases[11].config.exit.stop_mode, StopMode::Hybrid);
        assert_eq!(cases[11].config.entry.entry_timing, EntryTiming::NextClose);
        assert!(cases.iter().all(|c| c.config.exit.max_hold_days == base.exit.max_hold_days));
    }

    #[test]
    fn regime_grid_replaces_only_the_band() {
        let base = Profile::Balanced.config();
        let cases = regime_grid(&base, &default_regime_ranges());
        assert_eq!(cases.len(), 7);
        let last = cases[6].config.regime.as_ref().unwrap();
        assert_eq!((last.min, last.max), (18.0, 28.0));
        assert_eq!(last.stabilization, base.regime.as_ref().unwrap().stabilization);
        assert_eq!(cases[0].label, "regime 20-50");
    }

    #[test]
    fn regime_ranges_parse() {
        assert_eq!(
            parse_regime_ranges("20-35, 22.5-38").unwrap(),
            vec![(20.0, 35.0), (22.5, 38.0)]
        );
        assert!(parse_regime_ranges("35-20").is_err());
        assert!(parse_regime_ranges("wide").is_err());
    }

    #[test]
    fn sweep_order_parses() {
        assert_eq!("pnl".parse::<SweepOrder>().unwrap(), SweepOrder::TotalPnl);
        assert_eq!("worst_year".parse::<SweepOrder>().unwrap(), SweepOrder::PnlToWorstYear);
        assert!("luck".parse::<SweepOrder>().is_err());
    }
}
