//! CLI integration tests for the screen command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_screen_config, build_run_settings)
//! - Profile selection and per-key overrides
//! - Invalid values surfacing as config errors
//! - Full screen over CSV files on disk
//! - Stop and regime sweeps over the same files

mod common;

use common::*;
use sniper::adapters::file_config_adapter::FileConfigAdapter;
use sniper::cli::{self, ScreenOverrides, SweepGrid, SweepOverrides};
use sniper::domain::config::{EntryTiming, Profile, StopMode};
use sniper::domain::error::SniperError;
use sniper::domain::fundamentals::FundamentalsScoring;
use sniper::domain::sweep::SweepOrder;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_csv(dir: &Path, ticker: &str, bars: &[PriceBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}

const VALID_INI: &str = r#"
[run]
profile = balanced
data_dir = /var/prices
tickers = bhp, cba ,WBC
start_date = 2020-01-01
end_date = 2024-12-31
benchmark = spy
regime_symbol = vix

[entry]
adx_min = 22
volume_surge_mult = off
entry_timing = next_open

[exit]
stop_mode = atr
trailing_enabled = no
max_hold_days = 60

[regime]
regime_min = 15
regime_max = 35

[portfolio]
max_positions = 3
"#;

/// Wide-open gates and short windows so synthetic series produce signals.
const PERMISSIVE_KEYS: &str = r#"
[indicators]
rsi_period = 3
adx_period = 3
atr_period = 3
sma_period = 5
high_window = 10
sma_slope_days = 2
volume_avg_days = 3
relative_strength_lookback = 5
min_bars = 0

[entry]
rsi_oversold = 100
rsi_signal = 100
adx_min = 0
min_below_high_pct = 0
max_below_high_pct = 100
max_from_sma_pct = 1000
sma_floor_slack = 1
sma_slope_floor = -1000
volume_surge_mult = off
min_gap_days = 5

[exit]
max_hold_days = 10

[regime]
enabled = false
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_screen_config_applies_overrides_on_profile() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_screen_config(&adapter).unwrap();
        let balanced = Profile::Balanced.config();

        assert_eq!(config.entry.adx_min, 22.0);
        assert_eq!(config.entry.volume_surge_mult, None);
        assert_eq!(config.entry.entry_timing, EntryTiming::NextOpen);
        assert_eq!(config.entry.min_gap_days, balanced.entry.min_gap_days);
        assert_eq!(config.exit.stop_mode, StopMode::Atr);
        assert!(!config.exit.trailing_enabled);
        assert_eq!(config.exit.max_hold_days, 60);
        assert_eq!(config.exit.stop_loss_pct, balanced.exit.stop_loss_pct);
        assert_eq!(config.max_positions, 3);

        let regime = config.regime.unwrap();
        assert_eq!(regime.min, 15.0);
        assert_eq!(regime.max, 35.0);
    }

    #[test]
    fn missing_profile_defaults_to_sniper() {
        let adapter = FileConfigAdapter::from_string("[run]\n").unwrap();
        let config = cli::build_screen_config(&adapter).unwrap();
        assert_eq!(config, Profile::Sniper.config());
    }

    #[test]
    fn explicit_profile_beats_the_file() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_screen_config_for(&adapter, Some(Profile::Showcase)).unwrap();
        assert!(config.fundamentals.is_some());
        assert_eq!(config.entry.adx_min, 22.0);
    }

    #[test]
    fn regime_can_be_disabled() {
        let adapter =
            FileConfigAdapter::from_string("[run]\nprofile = sniper\n[regime]\nenabled = false\n")
                .unwrap();
        let config = cli::build_screen_config(&adapter).unwrap();
        assert!(config.regime.is_none());
    }

    #[test]
    fn stabilization_needs_a_lookback() {
        let adapter = FileConfigAdapter::from_string(
            "[run]\nprofile = balanced\n[regime]\nstabilization_min_drop_pct = 10\n",
        )
        .unwrap();
        let err = cli::build_screen_config(&adapter).unwrap_err();
        assert!(matches!(err, SniperError::ConfigMissing { .. }));
    }

    #[test]
    fn stabilization_is_configurable() {
        let adapter = FileConfigAdapter::from_string(
            "[regime]\nstabilization_lookback = 10\nstabilization_min_drop_pct = 15\n",
        )
        .unwrap();
        let config = cli::build_screen_config(&adapter).unwrap();
        let stab = config.regime.unwrap().stabilization.unwrap();
        assert_eq!(stab.lookback, 10);
        assert_eq!(stab.min_drop_pct, 15.0);
    }

    #[test]
    fn fundamentals_section_enables_the_filter() {
        let adapter = FileConfigAdapter::from_string(
            "[fundamentals]\nenabled = true\nmax_pe = 20\nmin_market_cap = off\n",
        )
        .unwrap();
        let config = cli::build_screen_config(&adapter).unwrap();
        let filter = config.fundamentals.unwrap();
        assert_eq!(filter.max_pe, 20.0);
        assert_eq!(filter.min_market_cap, None);
    }

    #[test]
    fn fundamentals_scoring_switches_the_scorer() {
        let adapter = FileConfigAdapter::from_string(
            "[run]
profile = balanced
[fundamentals]
enabled = true
scoring = tiered
require_positive_fcf = no
min_score = 7
",
        )
        .unwrap();
        let config = cli::build_screen_config(&adapter).unwrap();
        let filter = config.fundamentals.unwrap();
        assert_eq!(filter.scoring, FundamentalsScoring::Tiered);
        assert!(!filter.require_positive_fcf);
        assert_eq!(filter.min_score, 7);
        assert_eq!(filter.min_market_cap, Some(1e9));
    }
}

mod invalid_values {
    use super::*;

    fn invalid_key(ini: &str) -> String {
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        match cli::build_screen_config(&adapter) {
            Err(SniperError::ConfigInvalid { key, .. }) => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fundamentals_scoring_is_rejected() {
        assert_eq!(invalid_key("[fundamentals]\nscoring = median\n"), "scoring");
    }

    #[test]
    fn unparseable_number_is_rejected() {
        assert_eq!(invalid_key("[entry]\nadx_min = strong\n"), "adx_min");
    }

    #[test]
    fn unknown_stop_mode_is_rejected() {
        assert_eq!(invalid_key("[exit]\nstop_mode = chandelier\n"), "stop_mode");
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert_eq!(invalid_key("[run]\nprofile = yolo\n"), "profile");
    }

    #[test]
    fn non_boolean_flag_is_rejected() {
        assert_eq!(invalid_key("[exit]\ntrailing_enabled = maybe\n"), "trailing_enabled");
    }
}

mod run_settings {
    use super::*;

    #[test]
    fn reads_run_section() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let settings = cli::build_run_settings(&adapter).unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("/var/prices"));
        assert_eq!(
            settings.tickers,
            Some(vec!["BHP".to_string(), "CBA".to_string(), "WBC".to_string()])
        );
        assert_eq!(settings.start_date, date(2020, 1, 1));
        assert_eq!(settings.end_date, date(2024, 12, 31));
        assert_eq!(settings.benchmark.as_deref(), Some("SPY"));
        assert_eq!(settings.regime_symbol.as_deref(), Some("VIX"));
    }

    #[test]
    fn dates_are_required() {
        let adapter = FileConfigAdapter::from_string("[run]\nstart_date = 2020-01-01\n").unwrap();
        let err = cli::build_run_settings(&adapter).unwrap_err();
        assert!(matches!(err, SniperError::ConfigMissing { ref key, .. } if key == "end_date"));
    }

    #[test]
    fn malformed_date_is_invalid() {
        let adapter = FileConfigAdapter::from_string(
            "[run]\nstart_date = 01/01/2020\nend_date = 2024-12-31\n",
        )
        .unwrap();
        let err = cli::build_run_settings(&adapter).unwrap_err();
        assert!(matches!(err, SniperError::ConfigInvalid { .. }));
    }

    #[test]
    fn duplicate_tickers_are_rejected() {
        let adapter = FileConfigAdapter::from_string(
            "[run]\ntickers = BHP,bhp\nstart_date = 2020-01-01\nend_date = 2024-12-31\n",
        )
        .unwrap();
        assert!(cli::build_run_settings(&adapter).is_err());
    }

    #[test]
    fn missing_ticker_list_means_whole_directory() {
        let adapter = FileConfigAdapter::from_string(
            "[run]\nstart_date = 2020-01-01\nend_date = 2024-12-31\n",
        )
        .unwrap();
        let settings = cli::build_run_settings(&adapter).unwrap();
        assert_eq!(settings.tickers, None);
        assert_eq!(settings.data_dir, PathBuf::from("data"));
    }
}

mod screen_pipeline {
    use super::*;

    fn ini_for(dir: &Path, run_extra: &str) -> String {
        format!(
            "[run]\nprofile = balanced\ndata_dir = {}\nstart_date = 2024-01-01\nend_date = 2024-12-31\n{run_extra}\n{PERMISSIVE_KEYS}",
            dir.display()
        )
    }

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), "AAA", &generate_bars("2024-01-01", 80, 100.0, 3.0));
        write_csv(dir.path(), "BBB", &generate_bars("2024-01-01", 80, 40.0, 4.0));
        write_csv(dir.path(), "SPY", &generate_bars("2024-01-01", 80, 400.0, 1.0));
        dir
    }

    #[test]
    fn screens_every_file_except_the_benchmark() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "benchmark = SPY"));
        let adapter = cli::load_config(file.path()).unwrap();

        let report = cli::execute_screen(&adapter, &ScreenOverrides::default()).unwrap();

        assert_eq!(report.stats.tickers_requested, 2);
        assert_eq!(report.stats.tickers_scanned, 2);
        assert!(!report.records.is_empty());
        assert!(report.records.iter().all(|r| r.trade.ticker != "SPY"));
        assert!(report
            .records
            .iter()
            .all(|r| r.candidate.snapshot.relative_strength.is_some()));
    }

    #[test]
    fn overrides_narrow_the_universe_and_switch_profile() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), ""));
        let adapter = cli::load_config(file.path()).unwrap();

        let overrides = ScreenOverrides {
            profile: Some("showcase".to_string()),
            tickers: Some("aaa".to_string()),
            sequential: true,
            ..ScreenOverrides::default()
        };
        let report = cli::execute_screen(&adapter, &overrides).unwrap();

        // showcase screens fundamentals and there is no fundamentals.csv
        assert_eq!(report.stats.tickers_requested, 1);
        assert_eq!(report.stats.provider_failures, 1);
        assert!(report.records.is_empty());
    }

    #[test]
    fn data_dir_override_wins() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(Path::new("/nonexistent/prices"), ""));
        let adapter = cli::load_config(file.path()).unwrap();

        let overrides = ScreenOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            tickers: Some("AAA,BBB".to_string()),
            ..ScreenOverrides::default()
        };
        let report = cli::execute_screen(&adapter, &overrides).unwrap();
        assert_eq!(report.stats.tickers_scanned, 2);
    }

    #[test]
    fn regime_filter_without_symbol_is_a_config_error() {
        let dir = data_dir();
        let ini = ini_for(dir.path(), "").replace("enabled = false", "enabled = true");
        let file = write_temp_ini(&ini);
        let adapter = cli::load_config(file.path()).unwrap();

        let err = cli::execute_screen(&adapter, &ScreenOverrides::default()).unwrap_err();
        assert!(matches!(err, SniperError::ConfigMissing { ref key, .. } if key == "regime_symbol"));
    }

    #[test]
    fn invalid_config_stops_before_screening() {
        let dir = data_dir();
        let ini = format!("{}\n[portfolio]\nmax_positions = 0\n", ini_for(dir.path(), ""));
        let file = write_temp_ini(&ini);
        let adapter = cli::load_config(file.path()).unwrap();

        let err = cli::execute_screen(&adapter, &ScreenOverrides::default()).unwrap_err();
        assert!(matches!(err, SniperError::ConfigInvalid { .. }));
    }
}

mod sweep_pipeline {
    use super::*;

    fn ini_for(dir: &Path, run_extra: &str) -> String {
        format!(
            "[run]\nprofile = balanced\ndata_dir = {}\nstart_date = 2024-01-01\nend_date = 2024-12-31\ntickers = AAA,BBB\n{run_extra}\n{PERMISSIVE_KEYS}",
            dir.display()
        )
    }

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), "AAA", &generate_bars("2024-01-01", 80, 100.0, 3.0));
        write_csv(dir.path(), "BBB", &generate_bars("2024-01-01", 80, 40.0, 4.0));
        write_csv(dir.path(), "VIX", &generate_bars("2024-01-01", 80, 25.0, 10.0));
        dir
    }

    fn overrides(grid: SweepGrid, ranges: Option<&str>, order: SweepOrder) -> SweepOverrides {
        SweepOverrides {
            screen: ScreenOverrides {
                sequential: true,
                ..ScreenOverrides::default()
            },
            grid,
            ranges: ranges.map(str::to_string),
            order,
        }
    }

    #[test]
    fn stop_grid_ranks_every_combination() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), ""));
        let adapter = cli::load_config(file.path()).unwrap();

        let results =
            cli::execute_sweep(&adapter, &overrides(SweepGrid::Stops, None, SweepOrder::TotalPnl))
                .unwrap();

        assert_eq!(results.len(), 12);
        for pair in results.windows(2) {
            assert!(pair[0].stats.total_pnl >= pair[1].stats.total_pnl);
        }
        assert!(results.iter().all(|r| r.run.tickers_scanned == 2));
        let fixed_same_bar = results
            .iter()
            .find(|r| r.label == "fixed / same_bar")
            .unwrap();
        assert_eq!(fixed_same_bar.config.exit.stop_mode, StopMode::Fixed);
        assert_eq!(fixed_same_bar.config.entry.entry_timing, EntryTiming::SameBar);
    }

    #[test]
    fn regime_grid_filters_by_band() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "regime_symbol = VIX"));
        let adapter = cli::load_config(file.path()).unwrap();

        let results = cli::execute_sweep(
            &adapter,
            &overrides(SweepGrid::Regime, Some("0-1000,0-1"), SweepOrder::WinRate),
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        let open = results.iter().find(|r| r.label == "regime 0-1000").unwrap();
        let closed = results.iter().find(|r| r.label == "regime 0-1").unwrap();
        assert!(open.stats.total_trades + open.open_trades > 0);
        assert_eq!(closed.stats.total_trades + closed.open_trades, 0);
        assert!(closed.run.rejections.total() > 0);
    }

    #[test]
    fn regime_grid_needs_a_regime_symbol() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), ""));
        let adapter = cli::load_config(file.path()).unwrap();

        let err = cli::execute_sweep(
            &adapter,
            &overrides(SweepGrid::Regime, None, SweepOrder::TotalPnl),
        )
        .unwrap_err();
        assert!(matches!(err, SniperError::ConfigMissing { ref key, .. } if key == "regime_symbol"));
    }

    #[test]
    fn malformed_bands_are_a_config_error() {
        let dir = data_dir();
        let file = write_temp_ini(&ini_for(dir.path(), "regime_symbol = VIX"));
        let adapter = cli::load_config(file.path()).unwrap();

        let err = cli::execute_sweep(
            &adapter,
            &overrides(SweepGrid::Regime, Some("40-20"), SweepOrder::TotalPnl),
        )
        .unwrap_err();
        assert!(matches!(err, SniperError::ConfigInvalid { ref key, .. } if key == "ranges"));
    }
}
