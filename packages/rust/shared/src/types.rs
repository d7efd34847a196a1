//! Core domain types shared by the source clients, the patcher and the pipeline.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// FetchResult
// ---------------------------------------------------------------------------

/// Why a source could not provide a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No token/API key was configured for this source.
    MissingCredentials,
    /// The service rejected the credentials (401/403).
    Unauthorized(u16),
    /// Any other non-success HTTP status.
    Status(u16),
    /// Connection, TLS or timeout failure.
    Network(String),
    /// The response body did not have the expected shape.
    Malformed(String),
    /// The service answered but had nothing to report.
    NoData,
}

impl UnavailableReason {
    /// Whether the user has to fix credentials for this source to work.
    pub fn needs_configuration(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::Unauthorized(_))
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "no credentials configured"),
            Self::Unauthorized(status) => write!(f, "credentials rejected (HTTP {status})"),
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed payload: {msg}"),
            Self::NoData => write!(f, "no data"),
        }
    }
}

/// Outcome of calling an external data source.
///
/// `Unavailable` is never a zero: consumers that want to preserve a
/// previously rendered value must skip, not substitute a default.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FetchResult<T> {
    Success(T),
    Unavailable(UnavailableReason),
}

impl<T> FetchResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_ref(&self) -> FetchResult<&T> {
        match self {
            Self::Success(v) => FetchResult::Success(v),
            Self::Unavailable(r) => FetchResult::Unavailable(r.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchResult<U> {
        match self {
            Self::Success(v) => FetchResult::Success(f(v)),
            Self::Unavailable(r) => FetchResult::Unavailable(r),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> FetchResult<U>) -> FetchResult<U> {
        match self {
            Self::Success(v) => f(v),
            Self::Unavailable(r) => FetchResult::Unavailable(r),
        }
    }

    /// Discard the reason.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&UnavailableReason> {
        match self {
            Self::Success(_) => None,
            Self::Unavailable(r) => Some(r),
        }
    }
}

// ---------------------------------------------------------------------------
// Source payloads
// ---------------------------------------------------------------------------

/// A quote for the quote card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub content: String,
    pub author: String,
}

impl Quote {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
        }
    }
}

/// Account-level GitHub numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GithubStats {
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub total_stars: u64,
    pub total_forks: u64,
    /// False when repository pagination stopped early on an error.
    pub complete: bool,
}

/// One cell of the contribution calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
}

impl ContributionDay {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self { date, count }
    }
}

/// Time spent on one language or editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedDuration {
    pub name: String,
    pub total_seconds: f64,
}

/// WakaTime activity aggregated over the summary window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WakaSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Number of days the API returned.
    pub days: usize,
    pub total_seconds: f64,
    /// Sorted by time, descending.
    pub languages: Vec<NamedDuration>,
    /// Sorted by time, descending.
    pub editors: Vec<NamedDuration>,
}
