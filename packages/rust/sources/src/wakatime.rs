//! WakaTime summaries client.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use readmepulse_shared::{FetchResult, NamedDuration, UnavailableReason, WakaSummary};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::http::send_json;
use crate::{Source, trim_base};

#[derive(Debug, Deserialize)]
struct SummariesPayload {
    #[serde(default)]
    data: Vec<DayPayload>,
}

#[derive(Debug, Deserialize)]
struct DayPayload {
    grand_total: GrandTotal,
    #[serde(default)]
    languages: Vec<ItemPayload>,
    #[serde(default)]
    editors: Vec<ItemPayload>,
}

#[derive(Debug, Deserialize)]
struct GrandTotal {
    #[serde(default)]
    total_seconds: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ItemPayload {
    name: String,
    #[serde(default)]
    total_seconds: f64,
}

/// Client for `GET /users/current/summaries` over a window ending today.
pub struct WakaTimeClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    start: NaiveDate,
    end: NaiveDate,
    top_n: usize,
}

impl WakaTimeClient {
    pub fn new(
        client: Client,
        api_base: &str,
        api_key: Option<String>,
        today: NaiveDate,
        window_days: u32,
        top_n: usize,
    ) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(window_days)))
            .unwrap_or(today);
        Self {
            client,
            api_base: trim_base(api_base),
            api_key,
            start,
            end: today,
            top_n,
        }
    }
}

impl Source for WakaTimeClient {
    type Output = WakaSummary;

    fn name(&self) -> &'static str {
        "wakatime"
    }

    #[instrument(skip_all, fields(start = %self.start, end = %self.end))]
    async fn fetch(&self) -> FetchResult<WakaSummary> {
        let Some(key) = self.api_key.as_deref() else {
            warn!("WakaTime API key not set");
            return FetchResult::Unavailable(UnavailableReason::MissingCredentials);
        };

        let url = format!("{}/users/current/summaries", self.api_base);
        let request = self.client.get(url).bearer_auth(key).query(&[
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]);

        let result = send_json::<SummariesPayload>(request)
            .await
            .and_then(|payload| aggregate(payload.data, self.top_n, self.start, self.end));

        match &result {
            FetchResult::Success(summary) => info!(
                days = summary.days,
                total_seconds = summary.total_seconds,
                languages = summary.languages.len(),
                "WakaTime summary fetched"
            ),
            FetchResult::Unavailable(reason) if reason.needs_configuration() => {
                warn!(%reason, "WakaTime rejected the API key, check WAKATIME_API_KEY")
            }
            FetchResult::Unavailable(reason) => warn!(%reason, "WakaTime unavailable"),
        }
        result
    }
}

/// Sum the window, keeping each day's top-N languages and editors.
fn aggregate(
    days: Vec<DayPayload>,
    top_n: usize,
    start: NaiveDate,
    end: NaiveDate,
) -> FetchResult<WakaSummary> {
    if days.is_empty() {
        return FetchResult::Unavailable(UnavailableReason::NoData);
    }

    let day_count = days.len();
    let mut total_seconds = 0.0;
    let mut languages: HashMap<String, f64> = HashMap::new();
    let mut editors: HashMap<String, f64> = HashMap::new();

    for day in days {
        total_seconds += day.grand_total.total_seconds;
        accumulate_top(&mut languages, day.languages, top_n);
        accumulate_top(&mut editors, day.editors, top_n);
    }

    if total_seconds <= 0.0 {
        return FetchResult::Unavailable(UnavailableReason::NoData);
    }

    FetchResult::Success(WakaSummary {
        start,
        end,
        days: day_count,
        total_seconds,
        languages: ranked(languages, top_n),
        editors: ranked(editors, top_n),
    })
}

fn accumulate_top(acc: &mut HashMap<String, f64>, mut items: Vec<ItemPayload>, top_n: usize) {
    items.sort_by(|a, b| b.total_seconds.total_cmp(&a.total_seconds));
    for item in items.into_iter().take(top_n) {
        *acc.entry(item.name).or_insert(0.0) += item.total_seconds;
    }
}

/// Descending by time, ties broken by name so output is stable.
fn ranked(acc: HashMap<String, f64>, top_n: usize) -> Vec<NamedDuration> {
    let mut items: Vec<NamedDuration> = acc
        .into_iter()
        .map(|(name, total_seconds)| NamedDuration {
            name,
            total_seconds,
        })
        .collect();
    items.sort_by(|a, b| {
        b.total_seconds
            .total_cmp(&a.total_seconds)
            .then_with(|| a.name.cmp(&b.name))
    });
    items.truncate(top_n);
    items
}
