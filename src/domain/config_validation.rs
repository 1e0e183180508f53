//! Screen configuration validation.
//!
//! Runs before any ticker is screened so a bad value fails the whole run
//! instead of surfacing as per-trade contract violations.

use crate::domain::config::{EntryRules, ExitRules, IndicatorSettings, ScreenConfig, SizingRules};
use crate::domain::error::SniperError;

pub fn validate_screen_config(config: &ScreenConfig) -> Result<(), SniperError> {
    validate_indicators(&config.indicators)?;
    validate_entry(&config.entry)?;
    validate_regime(config)?;
    validate_exit(&config.exit)?;
    validate_sizing(&config.sizing)?;
    if config.max_positions == 0 {
        return Err(SniperError::invalid(
            "portfolio",
            "max_positions",
            "max_positions must be at least 1",
        ));
    }
    Ok(())
}

fn positive_period(section: &str, key: &str, value: usize) -> Result<(), SniperError> {
    if value == 0 {
        return Err(SniperError::invalid(section, key, format!("{key} must be at least 1")));
    }
    Ok(())
}

fn positive(section: &str, key: &str, value: f64) -> Result<(), SniperError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(SniperError::invalid(section, key, format!("{key} must be positive")));
    }
    Ok(())
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<(), SniperError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(SniperError::invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(())
}

fn in_range(section: &str, key: &str, value: f64, min: f64, max: f64) -> Result<(), SniperError> {
    if !(min..=max).contains(&value) {
        return Err(SniperError::invalid(
            section,
            key,
            format!("{key} must be between {min} and {max}"),
        ));
    }
    Ok(())
}

fn validate_indicators(ind: &IndicatorSettings) -> Result<(), SniperError> {
    positive_period("indicators", "rsi_period", ind.rsi_period)?;
    positive_period("indicators", "adx_period", ind.adx_period)?;
    positive_period("indicators", "atr_period", ind.atr_period)?;
    positive_period("indicators", "sma_period", ind.sma_period)?;
    positive_period("indicators", "high_window", ind.high_window)?;
    positive_period("indicators", "sma_slope_days", ind.sma_slope_days)?;
    positive_period("indicators", "volume_avg_days", ind.volume_avg_days)?;
    positive_period(
        "indicators",
        "relative_strength_lookback",
        ind.relative_strength_lookback,
    )
}

fn validate_entry(entry: &EntryRules) -> Result<(), SniperError> {
    in_range("entry", "rsi_oversold", entry.rsi_oversold, 0.0, 100.0)?;
    in_range("entry", "rsi_signal", entry.rsi_signal, 0.0, 100.0)?;
    positive_period("entry", "rsi_lookback", entry.rsi_lookback)?;
    in_range("entry", "adx_min", entry.adx_min, 0.0, 100.0)?;
    in_range("entry", "min_below_high_pct", entry.min_below_high_pct, 0.0, 100.0)?;
    in_range("entry", "max_below_high_pct", entry.max_below_high_pct, 0.0, 100.0)?;
    if entry.min_below_high_pct > entry.max_below_high_pct {
        return Err(SniperError::invalid(
            "entry",
            "min_below_high_pct",
            "min_below_high_pct must not exceed max_below_high_pct",
        ));
    }
    non_negative("entry", "max_from_sma_pct", entry.max_from_sma_pct)?;
    in_range("entry", "sma_floor_slack", entry.sma_floor_slack, 0.0, 1.0)?;
    if !entry.sma_slope_floor.is_finite() {
        return Err(SniperError::invalid(
            "entry",
            "sma_slope_floor",
            "sma_slope_floor must be a number",
        ));
    }
    if let Some(mult) = entry.volume_surge_mult {
        positive("entry", "volume_surge_mult", mult)?;
    }
    if let Some(floor) = entry.relative_strength_floor {
        if !floor.is_finite() {
            return Err(SniperError::invalid(
                "entry",
                "relative_strength_floor",
                "relative_strength_floor must be a number",
            ));
        }
    }
    Ok(())
}

fn validate_regime(config: &ScreenConfig) -> Result<(), SniperError> {
    let Some(filter) = &config.regime else {
        return Ok(());
    };
    non_negative("regime", "regime_min", filter.min)?;
    if filter.min > filter.max {
        return Err(SniperError::invalid(
            "regime",
            "regime_min",
            "regime_min must not exceed regime_max",
        ));
    }
    if let Some(stab) = &filter.stabilization {
        positive_period("regime", "stabilization_lookback", stab.lookback)?;
        non_negative("regime", "stabilization_min_drop_pct", stab.min_drop_pct)?;
    }
    Ok(())
}

fn validate_exit(exit: &ExitRules) -> Result<(), SniperError> {
    in_range("exit", "stop_loss_pct", exit.stop_loss_pct, f64::MIN_POSITIVE, 100.0)?;
    positive("exit", "take_profit_pct", exit.take_profit_pct)?;
    if let Some(activation) = exit.trail_activation_pct {
        non_negative("exit", "trail_activation_pct", activation)?;
    }
    in_range(
        "exit",
        "trail_distance_pct",
        exit.trail_distance_pct,
        f64::MIN_POSITIVE,
        100.0,
    )?;
    positive_period("exit", "max_hold_days", exit.max_hold_days)?;
    positive("exit", "atr_stop_mult", exit.atr_stop_mult)?;
    positive("exit", "atr_trail_mult", exit.atr_trail_mult)?;
    positive_period("exit", "pivot_lookback", exit.pivot_lookback)?;
    non_negative("exit", "pivot_buffer_pct", exit.pivot_buffer_pct)?;
    in_range(
        "exit",
        "pivot_trail_fraction",
        exit.pivot_trail_fraction,
        f64::MIN_POSITIVE,
        1.0,
    )?;
    non_negative("exit", "hybrid_atr_buffer", exit.hybrid_atr_buffer)?;
    positive("exit", "reward_risk_ratio", exit.reward_risk_ratio)?;
    in_range("exit", "min_stop_pct", exit.min_stop_pct, f64::MIN_POSITIVE, 100.0)?;
    in_range("exit", "max_stop_pct", exit.max_stop_pct, f64::MIN_POSITIVE, 100.0)?;
    if exit.min_stop_pct > exit.max_stop_pct {
        return Err(SniperError::invalid(
            "exit",
            "min_stop_pct",
            "min_stop_pct must not exceed max_stop_pct",
        ));
    }
    Ok(())
}

fn validate_sizing(sizing: &SizingRules) -> Result<(), SniperError> {
    positive("sizing", "account_size", sizing.account_size)?;
    in_range(
        "sizing",
        "risk_per_trade_pct",
        sizing.risk_per_trade_pct,
        f64::MIN_POSITIVE,
        100.0,
    )?;
    in_range(
        "sizing",
        "max_position_pct",
        sizing.max_position_pct,
        f64::MIN_POSITIVE,
        100.0,
    )
}
