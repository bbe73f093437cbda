use std::time::Duration;

use constructmate_core::{AppError, AppResult, BearerToken};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;


/// HTTP client bound to the upstream construction-management API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    /// Creates a client from an existing reqwest client.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: Url) -> Self {
        Self {
            http_client,
            base_url: with_trailing_slash(base_url),
        }
    }

    /// Creates a client whose requests fail after `timeout`.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build upstream HTTP client: {error}"))
            })?;

        Ok(Self::new(http_client, base_url))
    }

    /// Returns the normalised base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path against the base URL and appends query pairs.
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| {
                AppError::Internal(format!("invalid upstream endpoint '{path}': {error}"))
            })?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }

        Ok(url)
    }

    /// Issues a GET request and decodes the JSON body.
    pub async fn get_json(
        &self,
        token: &BearerToken,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<Value> {
        let url = self.endpoint(path, query)?;
        let request = self.http_client.get(url).bearer_auth(token.expose());
        let body = self.execute(request, path).await?;
        decode_body(path, &body)
    }

    /// Sends a JSON body and decodes the JSON response, if any.
    pub async fn send_json<B>(
        &self,
        token: Option<&BearerToken>,
        method: Method,
        path: &str,
        body: &B,
    ) -> AppResult<Value>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(path, &[])?;
        let mut request = self.http_client.request(method, url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }

        let body = self.execute(request, path).await?;
        Ok(decode_body(path, &body).unwrap_or(Value::Null))
    }

    async fn execute(&self, request: reqwest::RequestBuilder, path: &str) -> AppResult<String> {
        let response = request.send().await.map_err(|error| {
            warn!(path, error = %error, "upstream request failed");
            AppError::Unavailable(format!("upstream request to '{path}' failed: {error}"))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());

        if status.is_success() {
            debug!(path, status = status.as_u16(), "upstream request completed");
            return Ok(body);
        }

        Err(status_error(status, path, &body))
    }
}

/// Maps a non-success upstream status to an application error.
pub(crate) fn status_error(status: StatusCode, path: &str, body: &str) -> AppError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED => {
            AppError::Unauthorized(format!("upstream rejected credential for '{path}'"))
        }
        StatusCode::FORBIDDEN => AppError::Forbidden(format!("upstream denied '{path}': {detail}")),
        StatusCode::NOT_FOUND => AppError::NotFound(format!("upstream '{path}' not found: {detail}")),
        StatusCode::CONFLICT => AppError::Conflict(format!("upstream '{path}' conflict: {detail}")),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::Validation(format!("upstream rejected '{path}': {detail}"))
        }
        status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            AppError::Unavailable(format!("upstream '{path}' unavailable: {detail}"))
        }
        _ => AppError::Internal(format!("unexpected upstream status for '{path}': {detail}")),
    }
}

fn decode_body(path: &str, body: &str) -> AppResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(body).map_err(|error| {
        AppError::Unavailable(format!("upstream '{path}' returned invalid JSON: {error}"))
    })
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
