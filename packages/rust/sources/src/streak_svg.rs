//! Scrapes the current streak out of third-party streak-stats SVGs.
//!
//! The renderers change their markup now and then, so extraction walks an
//! ordered list of known layouts and takes the first match.

use std::sync::LazyLock;

use readmepulse_shared::{FetchResult, UnavailableReason};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::Source;
use crate::http::send_text;

/// Known layouts, most specific first.
static STREAK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"<text[^>]*data-testid="current-streak-count"[^>]*>\s*([\d,]+)\s*</text>"#,
        r#"<text[^>]*id="curr-streak-num"[^>]*>\s*([\d,]+)\s*</text>"#,
        r"animation:\s*currstreak[^>]*>\s*([\d,]+)\s*</text>",
        r"<text[^>]*>\s*Current Streak\s*</text>\s*<text[^>]*>\s*([\d,]+)\s*</text>",
        r"current-streak[^>]*>\s*([\d,]+)\s*<",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?is){p}")).expect("valid regex"))
    .collect()
});

/// Extract the streak from SVG text. First matching layout wins.
pub fn extract_streak(svg: &str) -> Option<u32> {
    STREAK_PATTERNS.iter().enumerate().find_map(|(i, re)| {
        let caps = re.captures(svg)?;
        let digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
        let value = digits.parse().ok()?;
        debug!(pattern = i, value, "streak pattern matched");
        Some(value)
    })
}

/// Fallback streak source: rendered SVGs, tried in order.
pub struct StreakSvgClient {
    client: Client,
    urls: Vec<String>,
}

impl StreakSvgClient {
    /// `url_templates` may contain `{user}`.
    pub fn new(client: Client, url_templates: &[String], username: &str) -> Self {
        Self {
            client,
            urls: url_templates
                .iter()
                .map(|t| t.replace("{user}", username))
                .collect(),
        }
    }
}

impl Source for StreakSvgClient {
    type Output = u32;

    fn name(&self) -> &'static str {
        "streak-svg"
    }

    #[instrument(skip_all, fields(renderers = self.urls.len()))]
    async fn fetch(&self) -> FetchResult<u32> {
        let mut last = UnavailableReason::NoData;

        for url in &self.urls {
            match send_text(self.client.get(url)).await {
                FetchResult::Success(svg) => match extract_streak(&svg) {
                    Some(streak) => {
                        info!(%url, streak, "streak scraped from SVG");
                        return FetchResult::Success(streak);
                    }
                    None => {
                        warn!(%url, bytes = svg.len(), "no known streak layout in SVG");
                        last = UnavailableReason::Malformed("no streak pattern matched".into());
                    }
                },
                FetchResult::Unavailable(reason) => {
                    warn!(%url, %reason, "streak renderer unavailable");
                    last = reason;
                }
            }
        }

        FetchResult::Unavailable(last)
    }
}
