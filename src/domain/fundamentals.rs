//! Ticker-level fundamentals quality screen.
//!
//! Three scorers are available, one per screening style:
//!
//! - `Points`: each satisfied criterion adds two points. P/E (forward, else
//!   trailing) in (0, max_pe], ROE at least min_roe_pct, debt/equity at most
//!   max_debt_equity, positive free cash flow.
//! - `Tiered`: strong and acceptable readings score differently across P/E,
//!   PEG, price/book, ROE, debt/equity, free cash flow and earnings growth.
//!   Negative free cash flow costs two points when `require_positive_fcf`.
//! - `ChecksPassed`: counts pass/fail checks on P/E (trailing, else forward),
//!   PEG, debt/equity and profit margin. Only fields on record are checked,
//!   and a ticker with nothing on record passes.
//!
//! Debt/equity values above 10 are read as percentages in every scorer.
//! A ticker passes when the score reaches `min_score` and, when configured,
//! its market cap is at least `min_market_cap`.

use std::fmt;
use std::str::FromStr;

const STRONG_ROE_PCT: f64 = 15.0;
const LOW_DEBT_EQUITY: f64 = 0.5;
const GREAT_PEG: f64 = 1.0;
const LOW_PRICE_TO_BOOK: f64 = 2.0;
const STRONG_EARNINGS_GROWTH: f64 = 0.20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundamentalsSnapshot {
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Fraction, 0.15 = 15%.
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub free_cashflow: Option<f64>,
    /// Fraction.
    pub profit_margin: Option<f64>,
    /// Fraction, year over year.
    pub earnings_growth: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundamentalsScoring {
    Points,
    Tiered,
    ChecksPassed,
}

impl FundamentalsScoring {
    pub fn name(&self) -> &'static str {
        match self {
            FundamentalsScoring::Points => "points",
            FundamentalsScoring::Tiered => "tiered",
            FundamentalsScoring::ChecksPassed => "checks_passed",
        }
    }
}

impl fmt::Display for FundamentalsScoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FundamentalsScoring {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "points" => Ok(FundamentalsScoring::Points),
            "tiered" => Ok(FundamentalsScoring::Tiered),
            "checks_passed" | "checks" => Ok(FundamentalsScoring::ChecksPassed),
            other => Err(format!(
                "unknown scoring '{other}' (expected points, tiered or checks_passed)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalsFilter {
    pub scoring: FundamentalsScoring,
    pub min_market_cap: Option<f64>,
    pub max_pe: f64,
    /// P/E at or below this earns the top tier.
    pub prefer_pe_below: f64,
    pub max_peg: f64,
    pub max_price_to_book: f64,
    pub min_roe_pct: f64,
    pub max_debt_equity: f64,
    /// Fraction; margins at or below fail the check.
    pub min_profit_margin: f64,
    pub require_positive_fcf: bool,
    pub min_score: i32,
}

impl Default for FundamentalsFilter {
    fn default() -> Self {
        Self::points()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundamentalsVerdict {
    Pass { score: i32 },
    TooSmall,
    LowScore { score: i32 },
}

impl FundamentalsVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, FundamentalsVerdict::Pass { .. })
    }
}

impl FundamentalsFilter {
    /// Two points per criterion, passing at 4.
    pub fn points() -> Self {
        Self {
            scoring: FundamentalsScoring::Points,
            min_market_cap: None,
            max_pe: 30.0,
            prefer_pe_below: 20.0,
            max_peg: 2.0,
            max_price_to_book: 5.0,
            min_roe_pct: 8.0,
            max_debt_equity: 2.0,
            min_profit_margin: -0.3,
            require_positive_fcf: true,
            min_score: 4,
        }
    }

    /// Graded score over seven readings, passing at 5, large caps only.
    pub fn tiered() -> Self {
        Self {
            scoring: FundamentalsScoring::Tiered,
            min_market_cap: Some(1e9),
            min_score: 5,
            ..Self::points()
        }
    }

    /// Lenient pass/fail checks for growth names, one check needed.
    pub fn checks_passed() -> Self {
        Self {
            scoring: FundamentalsScoring::ChecksPassed,
            min_market_cap: Some(1e9),
            max_pe: 60.0,
            max_peg: 3.0,
            max_debt_equity: 3.0,
            min_profit_margin: -0.3,
            min_score: 1,
            ..Self::points()
        }
    }

    pub fn for_scoring(scoring: FundamentalsScoring) -> Self {
        match scoring {
            FundamentalsScoring::Points => Self::points(),
            FundamentalsScoring::Tiered => Self::tiered(),
            FundamentalsScoring::ChecksPassed => Self::checks_passed(),
        }
    }

    pub fn score(&self, snapshot: &FundamentalsSnapshot) -> i32 {
        match self.scoring {
            FundamentalsScoring::Points => self.points_score(snapshot),
            FundamentalsScoring::Tiered => self.tiered_score(snapshot),
            FundamentalsScoring::ChecksPassed => self.checks(snapshot).0,
        }
    }

    pub fn evaluate(&self, snapshot: &FundamentalsSnapshot) -> FundamentalsVerdict {
        if let Some(min_cap) = self.min_market_cap {
            if snapshot.market_cap.unwrap_or(0.0) < min_cap {
                return FundamentalsVerdict::TooSmall;
            }
        }
        let (score, passed) = match self.scoring {
            FundamentalsScoring::ChecksPassed => {
                let (passed, total) = self.checks(snapshot);
                (passed, total == 0 || passed >= self.min_score)
            }
            _ => {
                let score = self.score(snapshot);
                (score, score >= self.min_score)
            }
        };
        if passed {
            FundamentalsVerdict::Pass { score }
        } else {
            FundamentalsVerdict::LowScore { score }
        }
    }

    fn points_score(&self, snapshot: &FundamentalsSnapshot) -> i32 {
        let mut score = 0;

        let pe = snapshot.forward_pe.or(snapshot.trailing_pe);
        if pe.is_some_and(|pe| pe > 0.0 && pe <= self.max_pe) {
            score += 2;
        }
        if snapshot
            .return_on_equity
            .is_some_and(|roe| roe * 100.0 >= self.min_roe_pct)
        {
            score += 2;
        }
        if debt_ratio(snapshot).is_some_and(|de| de <= self.max_debt_equity) {
            score += 2;
        }
        if snapshot.free_cashflow.is_some_and(|fcf| fcf > 0.0) {
            score += 2;
        }

        score
    }

    fn tiered_score(&self, snapshot: &FundamentalsSnapshot) -> i32 {
        let mut score = 0;

        if let Some(pe) = positive(snapshot.forward_pe.or(snapshot.trailing_pe)) {
            score += tier(pe <= self.prefer_pe_below, pe <= self.max_pe, 3);
        }
        if let Some(peg) = positive(snapshot.peg) {
            score += tier(peg < GREAT_PEG, peg <= self.max_peg, 3);
        }
        if let Some(pb) = positive(snapshot.price_to_book) {
            score += tier(pb < LOW_PRICE_TO_BOOK, pb <= self.max_price_to_book, 2);
        }
        if let Some(roe) = snapshot.return_on_equity.filter(|&roe| roe != 0.0) {
            let roe_pct = roe * 100.0;
            score += tier(roe_pct >= STRONG_ROE_PCT, roe_pct >= self.min_roe_pct, 3);
        }
        if let Some(de) = debt_ratio(snapshot).filter(|&de| de != 0.0) {
            score += tier(de < LOW_DEBT_EQUITY, de <= self.max_debt_equity, 2);
        }
        match snapshot.free_cashflow {
            Some(fcf) if fcf > 0.0 => score += 2,
            Some(fcf) if fcf < 0.0 && self.require_positive_fcf => score -= 2,
            _ => {}
        }
        if let Some(growth) = positive(snapshot.earnings_growth) {
            score += if growth > STRONG_EARNINGS_GROWTH { 2 } else { 1 };
        }

        score
    }

    /// (checks passed, checks run).
    fn checks(&self, snapshot: &FundamentalsSnapshot) -> (i32, i32) {
        let pe = snapshot.trailing_pe.or(snapshot.forward_pe);
        let checks = [
            pe.map(|pe| pe > 0.0 && pe < self.max_pe),
            snapshot.peg.map(|peg| peg > 0.0 && peg < self.max_peg),
            debt_ratio(snapshot).map(|de| de < self.max_debt_equity),
            snapshot.profit_margin.map(|pm| pm > self.min_profit_margin),
        ];
        checks
            .iter()
            .flatten()
            .fold((0, 0), |(passed, total), &ok| (passed + i32::from(ok), total + 1))
    }
}

fn debt_ratio(snapshot: &FundamentalsSnapshot) -> Option<f64> {
    snapshot
        .debt_to_equity
        .map(|de| if de > 10.0 { de / 100.0 } else { de })
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|&v| v > 0.0)
}

fn tier(strong: bool, acceptable: bool, top: i32) -> i32 {
    if strong {
        top
    } else if acceptable {
        1
    } else {
        0
    }
}
