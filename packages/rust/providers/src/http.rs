//! HTTP plumbing shared by the provider clients.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use url::Url;

use feedforge_shared::{FeedForgeError, Result};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("FeedForge/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed back into an error message.
const MAX_ERROR_BODY: usize = 200;

/// Build a bearer-authenticated JSON client.
pub(crate) fn build_client(api_key: &str, timeout_secs: u64) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|e| FeedForgeError::initialization(format!("invalid API key header: {e}")))?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| FeedForgeError::initialization(format!("failed to build HTTP client: {e}")))
}

/// Resolve `<base_url>/<path>`, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)
        .map_err(|e| FeedForgeError::initialization(format!("invalid base URL '{base_url}': {e}")))?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| FeedForgeError::initialization(format!("invalid endpoint '{path}': {e}")))
}

/// Send a JSON POST and decode a JSON response, mapping failures onto the
/// generic provider error kinds.
pub(crate) async fn post_json<B, T>(client: &Client, url: &Url, body: &B) -> Result<T>
where
    B: serde::Serialize + ?Sized,
    T: serde::de::DeserializeOwned,
{
    let response = client
        .post(url.as_str())
        .json(body)
        .send()
        .await
        .map_err(|e| FeedForgeError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
        return Err(FeedForgeError::Provider(format!(
            "{url}: HTTP {status}: {snippet}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| FeedForgeError::Provider(format!("{url}: failed to decode response: {e}")))
}
