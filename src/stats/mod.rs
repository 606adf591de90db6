//! Statistics
//!
//! Status queries are the only place a fetch that never completes becomes
//! visible: its source reports `Busy` with a growing `busy_for`.

pub mod metrics;

pub use metrics::{FundamentStats, SourceStats};
