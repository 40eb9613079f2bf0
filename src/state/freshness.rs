//! Staleness rules for cached fetches

use crate::state::FetchOutcome;
use chrono::{DateTime, Duration, Utc};

/// Decides whether a cached fetch may be served without fetching again
///
/// Successful fetches stay fresh forever. Retryable failures are fresh until
/// `failure_ttl` has elapsed since the fetch; `None` keeps them forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub failure_ttl: Option<Duration>,
}

impl FreshnessPolicy {
    /// Policy that never expires anything
    pub fn permanent() -> Self {
        Self { failure_ttl: None }
    }

    /// Policy that retries failures after `hours` (0 means never)
    pub fn from_hours(hours: u64) -> Self {
        if hours == 0 {
            return Self::permanent();
        }
        let hours = i64::try_from(hours).unwrap_or(i64::MAX / 3_600_000);
        Self {
            failure_ttl: Some(Duration::hours(hours)),
        }
    }

    pub fn is_fresh(
        &self,
        outcome: FetchOutcome,
        fetched_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(fetched_at) = fetched_at else {
            return false;
        };

        if !outcome.is_retryable() {
            return outcome.is_terminal();
        }

        match self.failure_ttl {
            Some(ttl) => now.signed_duration_since(fetched_at) < ttl,
            None => true,
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::from_hours(24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfetched_is_stale() {
        let policy = FreshnessPolicy::default();
        assert!(!policy.is_fresh(FetchOutcome::Fetched, None, Utc::now()));
        assert!(!policy.is_fresh(FetchOutcome::Pending, None, Utc::now()));
    }

    #[test]
    fn test_success_never_expires() {
        let policy = FreshnessPolicy::from_hours(1);
        let long_ago = Utc::now() - Duration::days(365);
        assert!(policy.is_fresh(FetchOutcome::Fetched, Some(long_ago), Utc::now()));
    }

    #[test]
    fn test_failure_expires_after_ttl() {
        let policy = FreshnessPolicy::from_hours(6);
        let now = Utc::now();

        let recent = now - Duration::hours(1);
        assert!(policy.is_fresh(FetchOutcome::TransportFailure, Some(recent), now));

        let old = now - Duration::hours(7);
        assert!(!policy.is_fresh(FetchOutcome::TransportFailure, Some(old), now));
        assert!(!policy.is_fresh(FetchOutcome::HttpStatusFailure, Some(old), now));
    }

    #[test]
    fn test_empty_url_failure_never_expires() {
        let policy = FreshnessPolicy::from_hours(1);
        let old = Utc::now() - Duration::days(30);
        assert!(policy.is_fresh(FetchOutcome::EmptyUrl, Some(old), Utc::now()));
    }

    #[test]
    fn test_zero_hours_is_permanent() {
        let policy = FreshnessPolicy::from_hours(0);
        assert_eq!(policy, FreshnessPolicy::permanent());

        let old = Utc::now() - Duration::days(30);
        assert!(policy.is_fresh(FetchOutcome::TransportFailure, Some(old), Utc::now()));
    }
}
