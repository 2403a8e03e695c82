use crate::errors::AppError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(AppError::Config(format!("Unsupported HTTP method: {other}"))),
        }
    }
}

/// A call description the gateway can send and, after recovery, send again.
///
/// The body is held as an already-encoded JSON value so replaying the request
/// never re-runs caller serialization.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    /// Returns `AppError::Serialization` when `body` cannot be encoded.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, AppError> {
        let value = serde_json::to_value(body)
            .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Path without query string or trailing slashes.
    #[must_use]
    pub fn route(&self) -> &str {
        let path = self.path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            "/"
        } else {
            trimmed
        }
    }

    /// True when this request targets one of `endpoints`, either exactly or as
    /// the trailing segments of a prefixed path (`/api/auth/login`).
    #[must_use]
    pub fn targets_any(&self, endpoints: &[&str]) -> bool {
        let route = self.route();
        endpoints.iter().any(|endpoint| {
            let endpoint = endpoint.trim_end_matches('/');
            if endpoint.is_empty() {
                return false;
            }
            route == endpoint
                || route
                    .strip_suffix(endpoint)
                    .is_some_and(|prefix| prefix.ends_with('/') || endpoint.starts_with('/'))
        })
    }
}

/// Successful response, body kept raw until the caller picks a type.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Decodes the body, treating an empty body as JSON `null`.
    ///
    /// # Errors
    /// Returns `AppError::Parse` when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let raw = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(raw)
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiRequest, ApiResponse, Method};

    #[test]
    fn route_strips_query_and_trailing_slash() {
        assert_eq!(ApiRequest::get("/groups/?page=2").route(), "/groups");
        assert_eq!(ApiRequest::get("/").route(), "/");
        assert_eq!(ApiRequest::get("/auth/me#x").route(), "/auth/me");
    }

    #[test]
    fn targets_any_matches_exact_and_prefixed_paths() {
        let endpoints = ["/auth/login", "/auth/refresh"];
        assert!(ApiRequest::post("/auth/login").targets_any(&endpoints));
        assert!(ApiRequest::post("/auth/refresh/").targets_any(&endpoints));
        assert!(ApiRequest::post("/api/auth/login").targets_any(&endpoints));
        assert!(!ApiRequest::get("/auth/login-history").targets_any(&endpoints));
        assert!(!ApiRequest::get("/auth/me").targets_any(&endpoints));
        assert!(!ApiRequest::get("/groups").targets_any(&[""]));
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("delete".parse::<Method>().ok(), Some(Method::Delete));
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn empty_response_decodes_as_unit() {
        let response = ApiResponse {
            status: 204,
            body: String::new(),
        };
        assert!(response.json::<()>().is_ok());
        assert_eq!(response.json::<Option<u32>>().ok(), Some(None));
    }
}
