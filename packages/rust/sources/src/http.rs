//! Response classification shared by the clients.

use readmepulse_shared::{FetchResult, UnavailableReason};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Map a status to the reason it makes a source unavailable, if it does.
pub(crate) fn classify_status(status: StatusCode) -> Option<UnavailableReason> {
    if status.is_success() {
        None
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Some(UnavailableReason::Unauthorized(status.as_u16()))
    } else {
        Some(UnavailableReason::Status(status.as_u16()))
    }
}

/// Send a request and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> FetchResult<T> {
    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => return FetchResult::Unavailable(UnavailableReason::Network(e.to_string())),
    };

    if let Some(reason) = classify_status(response.status()) {
        debug!(url = %response.url(), %reason, "request rejected");
        return FetchResult::Unavailable(reason);
    }

    match response.json::<T>().await {
        Ok(body) => FetchResult::Success(body),
        Err(e) if e.is_decode() => FetchResult::Unavailable(UnavailableReason::Malformed(e.to_string())),
        Err(e) => FetchResult::Unavailable(UnavailableReason::Network(e.to_string())),
    }
}

/// Send a request and return the body as text.
pub(crate) async fn send_text(request: RequestBuilder) -> FetchResult<String> {
    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => return FetchResult::Unavailable(UnavailableReason::Network(e.to_string())),
    };

    if let Some(reason) = classify_status(response.status()) {
        debug!(url = %response.url(), %reason, "request rejected");
        return FetchResult::Unavailable(reason);
    }

    match response.text().await {
        Ok(body) => FetchResult::Success(body),
        Err(e) => FetchResult::Unavailable(UnavailableReason::Network(e.to_string())),
    }
}
