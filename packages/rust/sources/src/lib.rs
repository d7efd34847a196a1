//! Source clients for the external services a profile README pulls from.
//!
//! Every client is built from explicit settings (username, base URL,
//! credentials, timeout) and exposes [`Source::fetch`], which resolves to a
//! [`FetchResult`]. Network failures, non-success statuses and malformed
//! payloads become [`FetchResult::Unavailable`]; nothing escapes a client as
//! an error or a panic. One request per call site, no retries.

mod contributions;
mod github;
mod http;
mod quote;
mod snake;
mod streak_svg;
mod wakatime;

use std::time::Duration;

use readmepulse_shared::{FetchResult, ReadmeError, Result};
use reqwest::Client;

pub use contributions::ContributionsClient;
pub use github::GithubStatsClient;
pub use quote::{FALLBACK_QUOTES, MAX_QUOTE_CHARS, QuoteClient, fallback_quote};
pub use snake::SnakeClient;
pub use streak_svg::{StreakSvgClient, extract_streak};
pub use wakatime::WakaTimeClient;

/// User-Agent string for all outbound requests. GitHub rejects requests without one.
const USER_AGENT: &str = concat!("readmepulse/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// An external data source.
///
/// Implementations must be independent of one another: the pipeline may call
/// them in any order.
pub trait Source {
    /// The value produced on success.
    type Output;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Perform one request (or one bounded sequence of requests).
    fn fetch(&self) -> impl Future<Output = FetchResult<Self::Output>> + Send;
}

/// Build a reqwest client with the shared settings and the given timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
        .build()
        .map_err(|e| ReadmeError::Network(format!("failed to build HTTP client: {e}")))
}

/// Trim a trailing slash so `{base}/path` joins cleanly.
pub(crate) fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_base_strips_trailing_slashes() {
        assert_eq!(trim_base("https://api.github.com/"), "https://api.github.com");
        assert_eq!(trim_base("http://127.0.0.1:8080"), "http://127.0.0.1:8080");
    }

    #[test]
    fn user_agent_names_the_tool() {
        assert!(USER_AGENT.starts_with("readmepulse/"));
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }
}
