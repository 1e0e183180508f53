//! Core domain types and logic.

pub mod ohlcv;
pub mod code_data;
pub mod universe;
pub mod error;
pub mod config;
pub mod config_validation;
pub mod indicator;
pub mod indicator_helpers;
pub mod regime;
pub mod fundamentals;
pub mod signal;
pub mod entry;
pub mod stops;
pub mod execution;
pub mod position;
pub mod metrics;
pub mod screen;
pub mod sweep;
pub mod portfolio;
