//! CSV file data adapter.
//!
//! Layout of the data directory:
//! - `<TICKER>.csv` with `date,open,high,low,close,volume` rows
//! - `fundamentals.csv` (optional) with a `ticker` column and any of
//!   `market_cap,trailing_pe,forward_pe,peg,price_to_book,return_on_equity,`
//!   `debt_to_equity,free_cashflow,profit_margin,earnings_growth`;
//!   columns are matched by header, and empty or `nan` cells are missing
//!
//! The regime index is just another price file whose closes are read.

use crate::domain::code_data::PriceSeries;
use crate::domain::error::SniperError;
use crate::domain::fundamentals::FundamentalsSnapshot;
use crate::domain::ohlcv::PriceBar;
use crate::domain::regime::RegimeSeries;
use crate::ports::fundamentals_port::FundamentalsPort;
use crate::ports::price_port::PriceDataPort;
use crate::ports::regime_port::RegimePort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

const SOURCE: &str = "csv";

pub struct CsvAdapter {
    base_path: PathBuf,
    fundamentals: OnceLock<HashMap<String, FundamentalsSnapshot>>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            fundamentals: OnceLock::new(),
        }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn read(&self, path: &PathBuf) -> Result<String, SniperError> {
        fs::read_to_string(path).map_err(|e| {
            SniperError::provider(SOURCE, format!("failed to read {}: {}", path.display(), e))
        })
    }

    fn load_fundamentals(&self) -> Result<&HashMap<String, FundamentalsSnapshot>, SniperError> {
        if let Some(table) = self.fundamentals.get() {
            return Ok(table);
        }
        let content = self.read(&self.base_path.join(FUNDAMENTALS_FILE))?;
        let table = parse_fundamentals(&content)?;
        Ok(self.fundamentals.get_or_init(|| table))
    }
}

/// Price cells must be finite numbers; a `nan` or `inf` bar fails the load.
fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, SniperError> {
    let value: f64 = record
        .get(index)
        .ok_or_else(|| SniperError::provider(SOURCE, format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| SniperError::provider(SOURCE, format!("invalid {} value: {}", name, e)))?;
    if !value.is_finite() {
        return Err(SniperError::provider(
            SOURCE,
            format!("invalid {} value: {} is not finite", name, value),
        ));
    }
    Ok(value)
}

/// Empty and non-finite fundamentals cells both read as absent.
fn parse_optional(cell: Option<&str>, name: &str) -> Result<Option<f64>, SniperError> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(|v| Some(v).filter(|v| v.is_finite()))
            .map_err(|e| SniperError::provider(SOURCE, format!("invalid {} value: {}", name, e))),
    }
}

fn parse_fundamentals(content: &str) -> Result<HashMap<String, FundamentalsSnapshot>, SniperError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| SniperError::provider(SOURCE, format!("CSV parse error: {}", e)))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let ticker_col = column("ticker")
        .ok_or_else(|| SniperError::provider(SOURCE, "fundamentals file has no ticker column"))?;

    let mut table = HashMap::new();
    for result in rdr.records() {
        let record =
            result.map_err(|e| SniperError::provider(SOURCE, format!("CSV parse error: {}", e)))?;
        let cell = |name: &str| column(name).and_then(|i| record.get(i));
        let Some(ticker) = record.get(ticker_col).map(|t| t.trim().to_uppercase()) else {
            continue;
        };
        let snapshot = FundamentalsSnapshot {
            market_cap: parse_optional(cell("market_cap"), "market_cap")?,
            trailing_pe: parse_optional(cell("trailing_pe"), "trailing_pe")?,
            forward_pe: parse_optional(cell("forward_pe"), "forward_pe")?,
            peg: parse_optional(cell("peg"), "peg")?,
            price_to_book: parse_optional(cell("price_to_book"), "price_to_book")?,
            return_on_equity: parse_optional(cell("return_on_equity"), "return_on_equity")?,
            debt_to_equity: parse_optional(cell("debt_to_equity"), "debt_to_equity")?,
            free_cashflow: parse_optional(cell("free_cashflow"), "free_cashflow")?,
            profit_margin: parse_optional(cell("profit_margin"), "profit_margin")?,
            earnings_growth: parse_optional(cell("earnings_growth"), "earnings_growth")?,
        };
        table.insert(ticker, snapshot);
    }
    Ok(table)
}

impl PriceDataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, SniperError> {
        let content = self.read(&self.csv_path(ticker))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result
                .map_err(|e| SniperError::provider(SOURCE, format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| SniperError::provider(SOURCE, "missing date column"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                SniperError::provider(SOURCE, format!("invalid date format: {}", e))
            })?;

            if date < start || date > end {
                continue;
            }

            bars.push(PriceBar {
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        Ok(PriceSeries::new(ticker, bars))
    }

    fn list_tickers(&self) -> Result<Vec<String>, SniperError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            SniperError::provider(
                SOURCE,
                format!("failed to read directory {}: {}", self.base_path.display(), e),
            )
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SniperError::provider(SOURCE, format!("directory entry error: {}", e))
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str == FUNDAMENTALS_FILE {
                continue;
            }
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

impl FundamentalsPort for CsvAdapter {
    fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<FundamentalsSnapshot>, SniperError> {
        let table = self.load_fundamentals()?;
        Ok(table.get(&ticker.to_uppercase()).cloned())
    }
}

/// Reads the regime index from `<symbol>.csv` in the data directory.
pub struct CsvRegimeAdapter {
    prices: CsvAdapter,
    symbol: String,
}

impl CsvRegimeAdapter {
    pub fn new(base_path: PathBuf, symbol: impl Into<String>) -> Self {
        Self {
            prices: CsvAdapter::new(base_path),
            symbol: symbol.into(),
        }
    }
}

impl RegimePort for CsvRegimeAdapter {
    fn fetch_regime(&self, start: NaiveDate, end: NaiveDate) -> Result<RegimeSeries, SniperError> {
        let series = self.prices.fetch_prices(&self.symbol, start, end)?;
        Ok(RegimeSeries::from_prices(&series))
    }
}
