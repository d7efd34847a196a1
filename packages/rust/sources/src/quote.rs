//! Quote API client and the in-process fallback list.

use rand::seq::SliceRandom;
use readmepulse_shared::{FetchResult, Quote, UnavailableReason};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::Source;
use crate::http::send_json;

/// Quotes this long (in chars) or longer do not fit the card and are rejected.
pub const MAX_QUOTE_CHARS: usize = 200;

/// Used when the quote API is unavailable.
pub const FALLBACK_QUOTES: &[(&str, &str)] = &[
    ("The best way to predict the future is to invent it.", "Alan Kay"),
    ("Code is like humor. When you have to explain it, it's bad.", "Cory House"),
    ("First, solve the problem. Then, write the code.", "John Johnson"),
    (
        "Any fool can write code that a computer can understand. Good programmers write code that humans can understand.",
        "Martin Fowler",
    ),
    (
        "The only way to learn a new programming language is by writing programs in it.",
        "Dennis Ritchie",
    ),
    ("Talk is cheap. Show me the code.", "Linus Torvalds"),
    (
        "Programs must be written for people to read, and only incidentally for machines to execute.",
        "Harold Abelson",
    ),
    ("Simplicity is the ultimate sophistication.", "Leonardo da Vinci"),
    ("It's not a bug, it's an undocumented feature.", "Anonymous"),
    ("The computer was born to solve problems that did not exist before.", "Bill Gates"),
    ("Innovation distinguishes between a leader and a follower.", "Steve Jobs"),
    ("The only way to do great work is to love what you do.", "Steve Jobs"),
];

/// Pick a fallback quote uniformly at random.
pub fn fallback_quote() -> Quote {
    let (content, author) = FALLBACK_QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_QUOTES[0]);
    Quote::new(content, author)
}

#[derive(Debug, Deserialize)]
struct QuotePayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: Option<String>,
}

/// Client for a quotable-style `GET` endpoint returning `{content, author}`.
pub struct QuoteClient {
    client: Client,
    url: String,
}

impl QuoteClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Source for QuoteClient {
    type Output = Quote;

    fn name(&self) -> &'static str {
        "quote"
    }

    #[instrument(skip_all, fields(url = %self.url))]
    async fn fetch(&self) -> FetchResult<Quote> {
        let result = send_json::<QuotePayload>(self.client.get(&self.url))
            .await
            .and_then(validate_quote);

        match &result {
            FetchResult::Success(quote) => {
                info!(author = %quote.author, "fetched quote from API");
            }
            FetchResult::Unavailable(reason) => warn!(%reason, "quote API unavailable"),
        }
        result
    }
}

fn validate_quote(payload: QuotePayload) -> FetchResult<Quote> {
    let content = payload.content.trim();
    if content.is_empty() {
        return FetchResult::Unavailable(UnavailableReason::Malformed("empty quote".into()));
    }
    let chars = content.chars().count();
    if chars >= MAX_QUOTE_CHARS {
        return FetchResult::Unavailable(UnavailableReason::Malformed(format!(
            "quote too long ({chars} chars)"
        )));
    }

    let author = payload
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    FetchResult::Success(Quote::new(content, author))
}
