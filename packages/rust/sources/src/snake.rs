//! Downloads the pre-rendered contribution-grid snake SVGs.

use readmepulse_shared::{FetchResult, UnavailableReason};
use reqwest::Client;
use tracing::{info, warn};

use crate::http::send_text;

/// Fetches each configured snake file from the renderer's output branch.
pub struct SnakeClient {
    client: Client,
    url_template: String,
    username: String,
}

impl SnakeClient {
    /// `url_template` may contain `{user}` and `{file}`.
    pub fn new(client: Client, url_template: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            username: username.into(),
        }
    }

    fn url_for(&self, file: &str) -> String {
        self.url_template
            .replace("{user}", &self.username)
            .replace("{file}", file)
    }

    /// Fetch one file. Anything that is not an SVG document is rejected.
    pub async fn fetch_file(&self, file: &str) -> FetchResult<String> {
        let url = self.url_for(file);
        let result = send_text(self.client.get(&url)).await.and_then(|body| {
            if body.contains("<svg") {
                FetchResult::Success(body)
            } else {
                FetchResult::Unavailable(UnavailableReason::Malformed("not an SVG".into()))
            }
        });

        match &result {
            FetchResult::Success(svg) => info!(%url, bytes = svg.len(), "snake SVG fetched"),
            FetchResult::Unavailable(reason) => warn!(%url, %reason, "snake SVG unavailable"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn substitutes_user_and_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/octocat/snake.svg"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<svg>snake</svg>"))
            .mount(&server)
            .await;

        let http = crate::build_client(Duration::from_secs(5)).unwrap();
        let client = SnakeClient::new(http, format!("{}/{{user}}/{{file}}", server.uri()), "octocat");
        assert_eq!(
            client.fetch_file("snake.svg").await,
            FetchResult::Success("<svg>snake</svg>".into())
        );
    }

    #[tokio::test]
    async fn html_error_page_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>404</html>"))
            .mount(&server)
            .await;

        let http = crate::build_client(Duration::from_secs(5)).unwrap();
        let client = SnakeClient::new(http, format!("{}/{{file}}", server.uri()), "octocat");
        assert!(!client.fetch_file("snake.svg").await.is_success());
    }
}
