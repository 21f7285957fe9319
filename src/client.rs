use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUEST_RETRIES, CLIENT_REQUESTS,
    CLIENT_RETRY_BACKOFF,
};
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "api_key"];

/// Client for the Gemini API.
#[derive(Clone)]
pub struct Gemini {
    api_key: Option<String>,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the `GEMINI_API_KEY`
    /// (or `api_key`) environment variable.  A missing key is not an error
    /// here; the first request reports it.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.or_else(api_key_from_env);
        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = build_http_client(timeout)?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        })
    }

    /// Replace the credential.  `None` leaves the client without one.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Set how many times a transient failure is retried before giving up.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.  Later retries double it.
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_http_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Returns true if a credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the configured retry limit.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The `generateContent` endpoint for `model`.
    pub fn generate_content_url(&self, model: &Model) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("models/{model}:generateContent"))?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::authentication(format!(
                "API key not provided and none of {} is set",
                API_KEY_ENV_VARS.join(", ")
            )));
        };
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let status = detail.as_ref().and_then(|d| d.status.clone());
        let message = detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| error_body.clone());

        error_from_status(status_code, status, message, retry_after)
    }

    /// Send one `generateContent` request, retrying transient failures.
    ///
    /// When the retries run out on a transient failure, the error is reported
    /// as [`Error::ServiceUnavailable`].
    pub async fn generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.generate_content_url(model)?;
        let headers = self.default_headers()?;

        let mut attempt = 0;
        loop {
            match self.generate_content_once(&url, &headers, request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt, self.backoff_base, err.retry_after());
                    CLIENT_REQUEST_RETRIES.click();
                    CLIENT_RETRY_BACKOFF.add(delay.as_secs_f64());
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying generateContent"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => return Err(give_up(err, attempt + 1)),
                Err(err) => return Err(err),
            }
        }
    }

    async fn generate_content_once(
        &self,
        url: &Url,
        headers: &HeaderMap,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        debug!(%url, turns = request.contents.len(), "sending generateContent");

        let result = self.post(url, headers, request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            debug!(error = %err, "generateContent failed");
        }
        result
    }

    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(url.clone())
            .headers(headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Response timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else {
                    Error::serialization(
                        format!("Failed to parse response: {}", e),
                        Some(Box::new(e)),
                    )
                }
            })
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .finish()
    }
}

/// Load a `.env` file from the working directory or one of its parents.
///
/// Variables already present in the environment are left alone.  Returns
/// the path of the file that was loaded.
pub fn load_env_file() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(err) if err.not_found() => None,
        Err(err) => {
            warn!(error = %err, "ignoring unreadable environment file");
            None
        }
    }
}

/// Load variables from the `.env`-style file at `path`.
///
/// Variables already present in the environment are left alone.
pub fn load_env_file_from(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    dotenvy::from_path(path).map_err(|err| match err {
        dotenvy::Error::Io(err) => {
            Error::io(format!("failed to read {}", path.display()), err)
        }
        other => Error::validation(
            format!("malformed environment file {}: {other}", path.display()),
            None,
        ),
    })
}

fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|key| !key.trim().is_empty())
}

fn build_http_client(timeout: Duration) -> Result<ReqwestClient> {
    ReqwestClient::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })
}

/// Parse a base URL, making sure relative joins land beneath it.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Map an HTTP failure status onto an error kind.
fn error_from_status(
    status_code: u16,
    status: Option<String>,
    message: String,
    retry_after: Option<u64>,
) -> Error {
    match status_code {
        // Google reports a bad key as INVALID_ARGUMENT rather than 401.
        400 if message.contains("API key") => Error::authentication(message),
        400 => Error::bad_request(message),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status, message),
    }
}

/// Delay before retry number `attempt + 1`.
///
/// Exponential from `base`, capped at `MAX_BACKOFF`.  A server-provided
/// `Retry-After` is honored up to `MAX_RETRY_AFTER`.
fn backoff_delay(attempt: u32, base: Duration, retry_after: Option<u64>) -> Duration {
    let exponential = base.saturating_mul(1u32 << attempt.min(16)).min(MAX_BACKOFF);
    match retry_after {
        Some(secs) => Duration::from_secs(secs).min(MAX_RETRY_AFTER).max(exponential),
        None => exponential,
    }
}

fn give_up(err: Error, attempts: u32) -> Error {
    if err.is_service_unavailable() {
        return err;
    }
    let retry_after = err.retry_after();
    Error::service_unavailable(
        format!("giving up after {attempts} attempt(s): {err}"),
        retry_after,
    )
}
