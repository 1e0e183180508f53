//! Screen configuration and named profiles.
//!
//! A [`ScreenConfig`] is built once per run and passed by reference into
//! every stage. The engine never consults defaults of its own; a profile
//! supplies the starting values and INI overrides are layered on top by the
//! CLI.

use crate::domain::fundamentals::FundamentalsFilter;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopMode {
    Fixed,
    Atr,
    Pivot,
    Hybrid,
}

impl StopMode {
    pub const ALL: [StopMode; 4] = [StopMode::Fixed, StopMode::Atr, StopMode::Pivot, StopMode::Hybrid];
}

impl FromStr for StopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(StopMode::Fixed),
            "atr" => Ok(StopMode::Atr),
            "pivot" => Ok(StopMode::Pivot),
            "hybrid" => Ok(StopMode::Hybrid),
            other => Err(format!(
                "unknown stop mode '{other}' (expected fixed, atr, pivot or hybrid)"
            )),
        }
    }
}

impl fmt::Display for StopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopMode::Fixed => "fixed",
            StopMode::Atr => "atr",
            StopMode::Pivot => "pivot",
            StopMode::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Which bar and price a signal at bar `i` fills on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryTiming {
    /// close[i]
    SameBar,
    /// open[i+1]
    NextOpen,
    /// close[i+1]
    NextClose,
}

impl EntryTiming {
    pub const ALL: [EntryTiming; 3] = [
        EntryTiming::SameBar,
        EntryTiming::NextOpen,
        EntryTiming::NextClose,
    ];
}

impl FromStr for EntryTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "same_bar" | "same_day" => Ok(EntryTiming::SameBar),
            "next_open" => Ok(EntryTiming::NextOpen),
            "next_close" => Ok(EntryTiming::NextClose),
            other => Err(format!(
                "unknown entry timing '{other}' (expected same_bar, next_open or next_close)"
            )),
        }
    }
}

impl fmt::Display for EntryTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryTiming::SameBar => "same_bar",
            EntryTiming::NextOpen => "next_open",
            EntryTiming::NextClose => "next_close",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub adx_period: usize,
    pub atr_period: usize,
    pub sma_period: usize,
    pub high_window: usize,
    pub sma_slope_days: usize,
    pub volume_avg_days: usize,
    pub relative_strength_lookback: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            adx_period: 14,
            atr_period: 14,
            sma_period: 200,
            high_window: 252,
            sma_slope_days: 20,
            volume_avg_days: 50,
            relative_strength_lookback: 63,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryRules {
    pub rsi_oversold: f64,
    pub rsi_signal: f64,
    pub rsi_lookback: usize,
    pub adx_min: f64,
    pub min_below_high_pct: f64,
    pub max_below_high_pct: f64,
    pub max_from_sma_pct: f64,
    /// Fraction below the SMA price may sit (0.03 = 3%).
    pub sma_floor_slack: f64,
    pub sma_slope_floor: f64,
    pub volume_surge_mult: Option<f64>,
    /// Fractional floor on stock minus benchmark return (-0.10 = 10% behind).
    pub relative_strength_floor: Option<f64>,
    pub min_gap_days: usize,
    pub entry_timing: EntryTiming,
}

/// Requires the regime value to have fallen from its recent peak.
#[derive(Debug, Clone, PartialEq)]
pub struct Stabilization {
    pub lookback: usize,
    pub min_drop_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegimeFilter {
    pub min: f64,
    pub max: f64,
    pub stabilization: Option<Stabilization>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitRules {
    pub stop_mode: StopMode,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// `None` activates trailing at the resolved stop distance.
    pub trail_activation_pct: Option<f64>,
    pub trail_distance_pct: f64,
    pub trailing_enabled: bool,
    pub max_hold_days: usize,
    pub atr_stop_mult: f64,
    pub atr_trail_mult: f64,
    pub pivot_lookback: usize,
    pub pivot_buffer_pct: f64,
    pub pivot_trail_fraction: f64,
    pub hybrid_atr_buffer: f64,
    pub reward_risk_ratio: f64,
    pub min_stop_pct: f64,
    pub max_stop_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingRules {
    pub account_size: f64,
    pub risk_per_trade_pct: f64,
    pub max_position_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub indicators: IndicatorSettings,
    pub entry: EntryRules,
    pub regime: Option<RegimeFilter>,
    pub exit: ExitRules,
    pub sizing: SizingRules,
    pub fundamentals: Option<FundamentalsFilter>,
    pub max_positions: usize,
    pub min_bars: usize,
}

impl ScreenConfig {
    /// First bar index at which every indicator the entry gates read is defined.
    pub fn warmup_bars(&self) -> usize {
        let ind = &self.indicators;
        let mut warmup = ind
            .rsi_period
            .max((2 * ind.adx_period).saturating_sub(2))
            .max(ind.sma_period.saturating_sub(1) + ind.sma_slope_days)
            .max(ind.high_window.saturating_sub(1));
        if self.entry.volume_surge_mult.is_some() {
            warmup = warmup.max(ind.volume_avg_days.saturating_sub(1));
        }
        if self.entry.relative_strength_floor.is_some() {
            warmup = warmup.max(ind.relative_strength_lookback);
        }
        warmup
    }

    /// Fewest bars a ticker needs before it is scanned at all.
    pub fn minimum_bars(&self) -> usize {
        self.min_bars.max(self.warmup_bars() + 1)
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Profile::Sniper.config()
    }
}

/// Named parameter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Tight stops, relative-strength and volume confirmation, lenient
    /// fundamentals checks.
    Sniper,
    /// Looser pullback band, wider stops.
    Balanced,
    /// Strict gates for scanning large universes.
    FullMarket,
    /// Balanced gates plus a tiered fundamentals quality score.
    Showcase,
    /// Next-open fills, capped regime band and fundamentals screen.
    VsBenchmark,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::Sniper,
        Profile::Balanced,
        Profile::FullMarket,
        Profile::Showcase,
        Profile::VsBenchmark,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Sniper => "sniper",
            Profile::Balanced => "balanced",
            Profile::FullMarket => "full_market",
            Profile::Showcase => "showcase",
            Profile::VsBenchmark => "vs_benchmark",
        }
    }

    pub fn config(&self) -> ScreenConfig {
        match self {
            Profile::Sniper => ScreenConfig {
                indicators: IndicatorSettings::default(),
                entry: EntryRules {
                    adx_min: 20.0,
                    min_below_high_pct: 25.0,
                    max_below_high_pct: 50.0,
                    max_from_sma_pct: 12.0,
                    sma_floor_slack: 0.03,
                    sma_slope_floor: 0.0,
                    volume_surge_mult: Some(1.3),
                    relative_strength_floor: Some(-0.10),
                    min_gap_days: 30,
                    ..base_entry()
                },
                regime: Some(RegimeFilter {
                    min: 18.0,
                    max: 40.0,
                    stabilization: None,
                }),
                exit: ExitRules {
                    stop_loss_pct: 12.0,
                    take_profit_pct: 36.0,
                    trail_activation_pct: Some(12.0),
                    trail_distance_pct: 8.0,
                    max_hold_days: 90,
                    ..base_exit()
                },
                fundamentals: Some(FundamentalsFilter::checks_passed()),
                ..base_config()
            },
            Profile::Balanced => base_config(),
            Profile::FullMarket => ScreenConfig {
                entry: EntryRules {
                    adx_min: 20.0,
                    min_below_high_pct: 25.0,
                    max_below_high_pct: 50.0,
                    max_from_sma_pct: 12.0,
                    sma_floor_slack: 0.03,
                    sma_slope_floor: 0.0,
                    volume_surge_mult: Some(1.3),
                    min_gap_days: 30,
                    ..base_entry()
                },
                regime: Some(RegimeFilter {
                    min: 25.0,
                    max: 50.0,
                    stabilization: None,
                }),
                ..base_config()
            },
            Profile::Showcase => ScreenConfig {
                fundamentals: Some(FundamentalsFilter::tiered()),
                ..base_config()
            },
            Profile::VsBenchmark => ScreenConfig {
                entry: EntryRules {
                    entry_timing: EntryTiming::NextOpen,
                    ..base_entry()
                },
                regime: Some(RegimeFilter {
                    min: 20.0,
                    max: 35.0,
                    stabilization: None,
                }),
                fundamentals: Some(FundamentalsFilter {
                    min_market_cap: Some(1e9),
                    ..FundamentalsFilter::points()
                }),
                ..base_config()
            },
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Profile::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Profile::ALL.iter().map(|p| p.name()).collect();
                format!("unknown profile '{wanted}' (expected one of {})", names.join(", "))
            })
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn base_entry() -> EntryRules {
    EntryRules {
        rsi_oversold: 35.0,
        rsi_signal: 45.0,
        rsi_lookback: 5,
        adx_min: 18.0,
        min_below_high_pct: 20.0,
        max_below_high_pct: 55.0,
        max_from_sma_pct: 15.0,
        sma_floor_slack: 0.05,
        sma_slope_floor: -2.0,
        volume_surge_mult: Some(1.2),
        relative_strength_floor: None,
        min_gap_days: 20,
        entry_timing: EntryTiming::SameBar,
    }
}

fn base_exit() -> ExitRules {
    ExitRules {
        stop_mode: StopMode::Fixed,
        stop_loss_pct: 15.0,
        take_profit_pct: 50.0,
        trail_activation_pct: Some(15.0),
        trail_distance_pct: 10.0,
        trailing_enabled: true,
        max_hold_days: 120,
        atr_stop_mult: 2.5,
        atr_trail_mult: 2.0,
        pivot_lookback: 20,
        pivot_buffer_pct: 1.0,
        pivot_trail_fraction: 0.7,
        hybrid_atr_buffer: 0.5,
        reward_risk_ratio: 3.0,
        min_stop_pct: 5.0,
        max_stop_pct: 25.0,
    }
}

fn base_config() -> ScreenConfig {
    ScreenConfig {
        indicators: IndicatorSettings::default(),
        entry: base_entry(),
        regime: Some(RegimeFilter {
            min: 20.0,
            max: 50.0,
            stabilization: None,
        }),
        exit: base_exit(),
        sizing: SizingRules {
            account_size: 100_000.0,
            risk_per_trade_pct: 1.0,
            max_position_pct: 15.0,
        },
        fundamentals: None,
        max_positions: 5,
        min_bars: 500,
    }
}
