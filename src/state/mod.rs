//! State module for cached fetch outcomes
//!
//! # Components
//!
//! - `FetchOutcome`: how the last fetch of a page ended
//! - `FreshnessPolicy`: whether a cached outcome may be served again

mod fetch_outcome;
mod freshness;

// Re-export main types
pub use fetch_outcome::FetchOutcome;
pub use freshness::FreshnessPolicy;
