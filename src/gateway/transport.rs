//! The single outbound hop. Every call carries the ambient session cookie, is
//! bounded by the configured timeout, and is classified into `ApiResponse` (2xx)
//! or `AppError`. No retries happen here; the gateway decides what to replay.

use super::request::{ApiRequest, ApiResponse, Method};
use crate::{config::ClientConfig, errors::AppError, errors::FailureBody};
use reqwest::Client;
use std::future::Future;
use tracing::{debug, Instrument, info_span};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error body characters kept for display.
const MAX_ERROR_CHARS: usize = 2_000;

/// Sends one request and classifies the outcome.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: &ApiRequest)
        -> impl Future<Output = Result<ApiResponse, AppError>> + Send;
}

/// reqwest-backed transport with a cookie store, so the session established by
/// login is presented on every later call regardless of destination.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AppError> {
        let url = self.config.url_for(&request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let span = info_span!("gateway.send", http.method = %request.method, url = %url);
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_request_error)?;
        debug!(status, "response received");

        if (200..300).contains(&status) {
            Ok(ApiResponse { status, body })
        } else {
            Err(AppError::Http {
                status,
                body: failure_body(&body),
            })
        }
    }
}

fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_decode() || err.is_body() {
        AppError::Parse(format!("Failed to read response: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Classifies the whole body first so JSON fields survive; only plain text is
/// capped for display.
fn failure_body(raw: &str) -> FailureBody {
    match FailureBody::from_raw(raw) {
        FailureBody::Text(text) => FailureBody::Text(truncate(&text)),
        classified => classified,
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_CHARS {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    } else {
        trimmed.to_string()
    }
}
