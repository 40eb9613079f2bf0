/// Fetch outcome definitions for cached pages
///
/// Every cached page records how its last fetch ended. Failures are terminal
/// states too: they are cached so a dead host is not hammered.
use serde::Serialize;
use std::fmt;

/// Represents how the fetch of a page ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Placeholder: the page has not been fetched yet
    Pending,

    /// The server answered with a 2xx status and the body was read
    Fetched,

    /// No URL was given, nothing was requested
    EmptyUrl,

    /// Connection, DNS, TLS, timeout or malformed URL
    TransportFailure,

    /// The server answered with a non-2xx status
    HttpStatusFailure,
}

impl FetchOutcome {
    /// Returns true once a fetch attempt has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if the content was fetched successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    /// Returns true if this represents a failed fetch
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyUrl | Self::TransportFailure | Self::HttpStatusFailure
        )
    }

    /// Returns true if fetching again could give a different answer
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportFailure | Self::HttpStatusFailure)
    }

    /// Converts the outcome to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::EmptyUrl => "empty_url",
            Self::TransportFailure => "transport_failure",
            Self::HttpStatusFailure => "http_status_failure",
        }
    }

    /// Parses an outcome from its database string representation
    ///
    /// Returns None if the string doesn't match any known outcome.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "fetched" => Some(Self::Fetched),
            "empty_url" => Some(Self::EmptyUrl),
            "transport_failure" => Some(Self::TransportFailure),
            "http_status_failure" => Some(Self::HttpStatusFailure),
            _ => None,
        }
    }

    /// Returns all possible outcomes
    pub fn all() -> [Self; 5] {
        [
            Self::Pending,
            Self::Fetched,
            Self::EmptyUrl,
            Self::TransportFailure,
            Self::HttpStatusFailure,
        ]
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
