//! Typed client for the school API. Every call goes through the gateway, so
//! expired sessions are recovered transparently; this layer adds payload
//! types, identity caching, and navigation checks on top.

pub mod types;

use crate::{
    config::ClientConfig,
    errors::AppError,
    gateway::{flight::SingleFlight, ApiRequest, ApiResponse, Gateway, HttpTransport, Transport},
    identity::{Identity, IdentityCache, IdentityState},
    routes::{self, Decision},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use types::{EntityId, Group, GroupInput, LoginPayload, Student, StudentInput, Teacher, TeacherInput};

pub struct SchoolClient<T = HttpTransport> {
    gateway: Arc<Gateway<T>>,
    identity: Arc<IdentityCache>,
    lookups: SingleFlight<Result<IdentityState, AppError>>,
    config: ClientConfig,
}

impl SchoolClient<HttpTransport> {
    /// Builds a client with a cookie-aware HTTP transport.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn connect(config: ClientConfig) -> Result<Self, AppError> {
        let transport = HttpTransport::new(config.clone())?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> SchoolClient<T> {
    #[must_use]
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let identity = Arc::new(IdentityCache::new());
        Self {
            gateway: Arc::new(Gateway::new(transport, &config, Arc::clone(&identity))),
            identity,
            lookups: SingleFlight::new(),
            config,
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway<T> {
        &self.gateway
    }

    #[must_use]
    pub fn identity_state(&self) -> IdentityState {
        self.identity.state()
    }

    /// Raw call for any endpoint. Topics, tests, and grades have no typed
    /// wrapper because the backend does not publish fixed paths for them.
    ///
    /// # Errors
    /// Returns the gateway's classified failure.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, AppError> {
        self.gateway.execute(request).await
    }

    async fn fetch<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R, AppError> {
        self.gateway.execute(request).await?.json()
    }

    async fn send(&self, request: &ApiRequest) -> Result<(), AppError> {
        self.gateway.execute(request).await.map(|_| ())
    }

    /// Establishes a session; the cached identity is refetched afterwards.
    ///
    /// # Errors
    /// Returns the backend failure; login failures are never retried.
    #[instrument(skip(self, payload), fields(login = %payload.login))]
    pub async fn login(&self, payload: &LoginPayload) -> Result<(), AppError> {
        let request = ApiRequest::post(&self.config.login_path).json(payload)?;
        self.send(&request).await?;
        self.identity.invalidate();
        debug!("logged in");
        Ok(())
    }

    /// Ends the session. The identity is treated as absent even if the backend
    /// call fails, since the session can no longer be trusted either way.
    ///
    /// # Errors
    /// Returns the backend failure.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AppError> {
        let outcome = self.send(&ApiRequest::post(&self.config.logout_path)).await;
        self.identity.mark_absent();
        outcome
    }

    /// Fetches the current identity, bypassing the cache.
    ///
    /// # Errors
    /// Returns the gateway failure; a 401 means no identity.
    pub async fn me(&self) -> Result<Identity, AppError> {
        self.fetch(&ApiRequest::get(&self.config.me_path)).await
    }

    /// Returns the cached identity state, fetching it when unresolved.
    /// Concurrent resolutions of the same cache generation share one fetch.
    ///
    /// # Errors
    /// Returns failures other than 401, which leave the state unresolved.
    #[instrument(skip(self))]
    pub async fn resolve_identity(&self) -> Result<IdentityState, AppError> {
        let (state, generation) = self.identity.snapshot();
        if state != IdentityState::Unresolved {
            return Ok(state);
        }

        let gateway = Arc::clone(&self.gateway);
        let identity = Arc::clone(&self.identity);
        let request = ApiRequest::get(&self.config.me_path);
        let ticket = self.lookups.join_or_start(generation, move |_| async move {
            let resolved = match gateway.execute(&request).await.and_then(|r| r.json::<Identity>()) {
                Ok(fetched) => IdentityState::Present(fetched),
                Err(err) if err.is_unauthorized() => IdentityState::Absent,
                Err(err) => return Err(err),
            };

            if identity.store(generation, resolved.clone()) {
                Ok(resolved)
            } else {
                Ok(identity.state())
            }
        });

        ticket.await.unwrap_or_else(|| {
            Err(AppError::Network("Identity lookup was interrupted".to_string()))
        })
    }

    /// Resolves the identity and evaluates the route gate for `path`.
    ///
    /// If the identity cannot be fetched for a reason other than 401, this
    /// evaluation treats it as absent without caching that outcome.
    pub async fn navigate(&self, path: &str) -> Decision {
        let state = match self.resolve_identity().await {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "identity unavailable, evaluating as anonymous");
                IdentityState::Absent
            }
        };
        routes::evaluate(&state, path)
    }

    /// # Errors
    /// Returns the gateway failure or a decode error.
    pub async fn teachers(&self) -> Result<Vec<Teacher>, AppError> {
        self.fetch(&ApiRequest::get("/users/teachers")).await
    }

    /// # Errors
    /// Returns the gateway failure.
    pub async fn create_teacher(&self, input: &TeacherInput) -> Result<(), AppError> {
        self.send(&ApiRequest::post("/users/teachers").json(input)?).await
    }

    /// # Errors
    /// Returns the gateway failure.
    pub async fn delete_teacher(&self, id: &EntityId) -> Result<(), AppError> {
        self.send(&ApiRequest::delete(format!("/users/teachers/{id}"))).await
    }

    /// # Errors
    /// Returns the gateway failure.
    pub async fn create_student(&self, input: &StudentInput) -> Result<(), AppError> {
        self.send(&ApiRequest::post("/users/students").json(input)?).await
    }

    /// # Errors
    /// Returns the gateway failure.
    pub async fn delete_student(&self, id: &EntityId) -> Result<(), AppError> {
        self.send(&ApiRequest::delete(format!("/users/students/{id}"))).await
    }

    /// # Errors
    /// Returns the gateway failure or a decode error.
    pub async fn groups(&self) -> Result<Vec<Group>, AppError> {
        self.fetch(&ApiRequest::get("/groups")).await
    }

    /// # Errors
    /// Returns the gateway failure or a decode error.
    pub async fn group_students(&self, group_id: &EntityId) -> Result<Vec<Student>, AppError> {
        self.fetch(&ApiRequest::get(format!("/groups/{group_id}/students")))
            .await
    }

    /// # Errors
    /// Returns the gateway failure.
    pub async fn create_group(&self, input: &GroupInput) -> Result<(), AppError> {
        self.send(&ApiRequest::post("/groups").json(input)?).await
    }
}
