//! Port traits the screener depends on.

pub mod config_port;
pub mod fundamentals_port;
pub mod price_port;
pub mod regime_port;
