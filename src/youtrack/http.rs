use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Method, Response, StatusCode};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Body YouTrack returns for a successful login.
const LOGIN_OK: &str = "<login>ok</login>";

const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(super) fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .user_agent(format!("tracklink/{}", DEFAULT_VERSION))
        .build()
        .expect("Failed to build HTTP client")
}

fn check_status(response: &Response, url: &Url) -> TrackerResult<()> {
    match response.status() {
        status if status.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED => Err(TrackerError::Unauthorized {
            url: url.to_string(),
        }),
        status => Err(TrackerError::Status {
            status,
            url: url.to_string(),
        }),
    }
}

/// Collapse every `Set-Cookie` header into a single `Cookie` header value.
fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Send one request with the session cookie attached and return the body.
pub(super) async fn send(
    client: &Client,
    method: Method,
    url: &Url,
    cookie: Option<&str>,
) -> TrackerResult<String> {
    let request_id = Uuid::new_v4().to_string();
    debug!("{} {} (request {})", method, url, request_id);

    let mut request = client
        .request(method.clone(), url.clone())
        .header("x-request-id", &request_id);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    if method == Method::POST {
        request = request.body("");
    }

    let response = request.send().await?;
    debug!("Response {} (request {})", response.status(), request_id);
    check_status(&response, url)?;

    Ok(response.text().await?)
}

/// Perform the login exchange. `Ok(None)` means the tracker refused it.
///
/// The URL carries the password, so only `display_url` is ever logged.
pub(super) async fn login(
    client: &Client,
    url: &Url,
    display_url: &str,
) -> TrackerResult<Option<String>> {
    debug!("POST {}", display_url);

    let response = client.post(url.clone()).body("").send().await?;
    let status = response.status();
    let cookie = session_cookie(&response);
    let body = response.text().await?;

    if status.is_success() && body.trim() == LOGIN_OK {
        return Ok(Some(cookie));
    }

    debug!("Login refused with HTTP {}: {}", status, body.trim());
    Ok(None)
}
