//! Output module for reporting cache and pipeline results
//!
//! This module handles:
//! - Recording cache statistics
//! - Exporting pipeline results as JSON keyed by URL

mod export;
pub mod stats;

pub use export::{export_json, format_json};
pub use stats::{load_statistics, print_statistics, CacheStatistics};
