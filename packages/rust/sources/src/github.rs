//! GitHub REST client: follower counts and star/fork totals.

use readmepulse_shared::{FetchResult, GithubStats, UnavailableReason};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::http::send_json;
use crate::{Source, trim_base};

/// Page size for the repository listing.
const PER_PAGE: usize = 100;

/// Hard stop for pagination in case a server keeps returning full pages.
const MAX_PAGES: u32 = 50;

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(default)]
    followers: u64,
    #[serde(default)]
    following: u64,
    #[serde(default)]
    public_repos: u64,
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RepoTotals {
    stars: u64,
    forks: u64,
    complete: bool,
}

/// Client for `GET /users/{username}` and the paginated repository listing.
pub struct GithubStatsClient {
    client: Client,
    api_base: String,
    username: String,
    token: Option<String>,
    max_pages: u32,
}

impl GithubStatsClient {
    pub fn new(
        client: Client,
        api_base: &str,
        username: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base: trim_base(api_base),
            username: username.into(),
            token,
            max_pages: MAX_PAGES,
        }
    }

    /// Override the pagination limit.
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn get(&self, url: &str, token: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json")
    }

    /// Sum stars and forks across every page. A failing page ends the walk
    /// but keeps what earlier pages contributed.
    async fn repo_totals(&self, token: &str) -> RepoTotals {
        let url = format!("{}/users/{}/repos", self.api_base, self.username);
        let mut totals = RepoTotals {
            complete: true,
            ..RepoTotals::default()
        };

        let mut reached_end = false;
        for page in 1..=self.max_pages {
            let request = self.get(&url, token).query(&[
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
            ]);

            let repos = match send_json::<Vec<RepoPayload>>(request).await {
                FetchResult::Success(repos) => repos,
                FetchResult::Unavailable(reason) => {
                    warn!(page, %reason, "repository page failed, keeping partial totals");
                    totals.complete = false;
                    break;
                }
            };

            debug!(page, count = repos.len(), "repository page fetched");
            for repo in &repos {
                totals.stars += repo.stargazers_count;
                totals.forks += repo.forks_count;
            }

            if repos.len() < PER_PAGE {
                reached_end = true;
                break;
            }
        }

        if totals.complete && !reached_end {
            warn!(
                max_pages = self.max_pages,
                "page limit reached with full pages, totals may be partial"
            );
            totals.complete = false;
        }

        totals
    }
}

impl Source for GithubStatsClient {
    type Output = GithubStats;

    fn name(&self) -> &'static str {
        "github-stats"
    }

    #[instrument(skip_all, fields(user = %self.username))]
    async fn fetch(&self) -> FetchResult<GithubStats> {
        let Some(token) = self.token.as_deref() else {
            warn!("GitHub token not set, skipping stats");
            return FetchResult::Unavailable(UnavailableReason::MissingCredentials);
        };

        let url = format!("{}/users/{}", self.api_base, self.username);
        let user = match send_json::<UserPayload>(self.get(&url, token)).await {
            FetchResult::Success(user) => user,
            FetchResult::Unavailable(reason) => {
                warn!(%reason, "GitHub user lookup failed");
                return FetchResult::Unavailable(reason);
            }
        };

        let totals = self.repo_totals(token).await;
        let stats = GithubStats {
            followers: user.followers,
            following: user.following,
            public_repos: user.public_repos,
            total_stars: totals.stars,
            total_forks: totals.forks,
            complete: totals.complete,
        };

        info!(
            repos = stats.public_repos,
            followers = stats.followers,
            stars = stats.total_stars,
            forks = stats.total_forks,
            "GitHub stats fetched"
        );
        FetchResult::Success(stats)
    }
}
