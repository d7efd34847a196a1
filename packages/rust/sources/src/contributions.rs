//! GitHub GraphQL client for the contribution calendar.

use chrono::{Days, NaiveDate};
use readmepulse_shared::{ContributionDay, FetchResult, UnavailableReason};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::http::send_json;
use crate::{Source, trim_base};

/// Length of the calendar window, ending today.
const WINDOW_DAYS: u64 = 365;

const CALENDAR_QUERY: &str = r#"
query($username: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $username) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            contributionCount
            date
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: CollectionNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionNode {
    contribution_calendar: CalendarNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarNode {
    #[serde(default)]
    total_contributions: u64,
    #[serde(default)]
    weeks: Vec<WeekNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekNode {
    #[serde(default)]
    contribution_days: Vec<DayNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayNode {
    contribution_count: u32,
    date: NaiveDate,
}

/// Fetches the trailing-year contribution calendar, most recent day first.
pub struct ContributionsClient {
    client: Client,
    graphql_url: String,
    username: String,
    token: Option<String>,
    today: NaiveDate,
}

impl ContributionsClient {
    pub fn new(
        client: Client,
        api_base: &str,
        username: impl Into<String>,
        token: Option<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            client,
            graphql_url: format!("{}/graphql", trim_base(api_base)),
            username: username.into(),
            token,
            today,
        }
    }

    fn variables(&self) -> serde_json::Value {
        let from = self
            .today
            .checked_sub_days(Days::new(WINDOW_DAYS))
            .unwrap_or(self.today);
        json!({
            "username": self.username,
            "from": format!("{from}T00:00:00Z"),
            "to": format!("{}T23:59:59Z", self.today),
        })
    }
}

impl Source for ContributionsClient {
    type Output = Vec<ContributionDay>;

    fn name(&self) -> &'static str {
        "contribution-calendar"
    }

    #[instrument(skip_all, fields(user = %self.username))]
    async fn fetch(&self) -> FetchResult<Vec<ContributionDay>> {
        let Some(token) = self.token.as_deref() else {
            warn!("GitHub token not set, calendar unavailable");
            return FetchResult::Unavailable(UnavailableReason::MissingCredentials);
        };

        let request = self
            .client
            .post(&self.graphql_url)
            .bearer_auth(token)
            .json(&json!({ "query": CALENDAR_QUERY, "variables": self.variables() }));

        let result = send_json::<GraphQlResponse>(request)
            .await
            .and_then(calendar_days);

        match &result {
            FetchResult::Success(days) => info!(days = days.len(), "contribution calendar fetched"),
            FetchResult::Unavailable(reason) => warn!(%reason, "contribution calendar unavailable"),
        }
        result
    }
}

/// Flatten the weeks and sort most recent first.
fn calendar_days(response: GraphQlResponse) -> FetchResult<Vec<ContributionDay>> {
    if let Some(first) = response.errors.first() {
        return FetchResult::Unavailable(UnavailableReason::Malformed(format!(
            "GraphQL error: {}",
            first.message
        )));
    }

    let Some(user) = response.data.and_then(|d| d.user) else {
        return FetchResult::Unavailable(UnavailableReason::Malformed(
            "response has no user".into(),
        ));
    };

    let calendar = user.contributions_collection.contribution_calendar;
    tracing::debug!(total = calendar.total_contributions, "calendar total");

    let mut days: Vec<ContributionDay> = calendar
        .weeks
        .into_iter()
        .flat_map(|w| w.contribution_days)
        .map(|d| ContributionDay::new(d.date, d.contribution_count))
        .collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));

    FetchResult::Success(days)
}
