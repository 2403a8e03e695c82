//! Client configuration: the API base URL, the session endpoint paths, and the
//! request timeout. Values are public; credentials never live here.

use crate::errors::AppError;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const ME_PATH: &str = "/auth/me";
pub const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub login_path: String,
    pub refresh_path: String,
    pub me_path: String,
    pub logout_path: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            login_path: LOGIN_PATH.to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            me_path: ME_PATH.to_string(),
            logout_path: LOGOUT_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Builds a config for `api_base_url`, keeping the default endpoint paths.
    ///
    /// # Errors
    /// Returns `AppError::Config` when the URL is empty, unparsable, or not http(s).
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            api_base_url: normalize_base_url(api_base_url)?,
            timeout,
            ..Self::default()
        })
    }

    /// Joins the base URL and an API path.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        build_url_with_base(&self.api_base_url, path)
    }
}

/// Trims the base URL, drops trailing slashes, and checks the scheme.
///
/// # Errors
/// Returns `AppError::Config` for empty, unparsable, or non-http(s) URLs.
pub fn normalize_base_url(value: &str) -> Result<String, AppError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::Config("API base URL is empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|err| AppError::Config(format!("Invalid API base URL {trimmed}: {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        scheme => Err(AppError::Config(format!(
            "Unsupported API base URL scheme: {scheme}"
        ))),
    }
}

fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
