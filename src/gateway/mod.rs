//! Authenticated request gateway. Every API call goes through
//! [`Gateway::execute`]: a 401 on an ordinary endpoint triggers one coalesced
//! session refresh and, if that succeeds, exactly one replay of the original
//! request. All other outcomes pass through untouched.

pub mod flight;
pub mod recovery;
pub mod request;
pub mod transport;

pub use recovery::SessionRecovery;
pub use request::{ApiRequest, ApiResponse, Method};
pub use transport::{HttpTransport, Transport};

use crate::{config::ClientConfig, errors::AppError, identity::IdentityCache};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct Gateway<T> {
    transport: Arc<T>,
    recovery: SessionRecovery<T>,
    identity: Arc<IdentityCache>,
    session_endpoints: [String; 2],
}

impl<T: Transport> Gateway<T> {
    #[must_use]
    pub fn new(transport: T, config: &ClientConfig, identity: Arc<IdentityCache>) -> Self {
        let transport = Arc::new(transport);
        Self {
            recovery: SessionRecovery::new(Arc::clone(&transport), &config.refresh_path),
            transport,
            identity,
            session_endpoints: [config.login_path.clone(), config.refresh_path.clone()],
        }
    }

    /// Sends `request`, recovering the session once on a 401.
    ///
    /// # Errors
    /// Returns the first attempt's failure unless it was a recoverable 401;
    /// after a failed refresh the original 401 is returned, after a successful
    /// refresh whatever the replay yields.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, AppError> {
        let original = match self.transport.send(request).await {
            Err(err) if err.is_unauthorized() => err,
            outcome => return outcome,
        };

        if self.is_session_endpoint(request) {
            debug!("401 from a session endpoint, not recovering");
            return Err(original);
        }

        if !self.recovery.recover().await {
            warn!("session could not be recovered");
            self.identity.mark_absent();
            return Err(original);
        }

        debug!("session recovered, replaying request");
        self.transport.send(request).await
    }

    fn is_session_endpoint(&self, request: &ApiRequest) -> bool {
        let endpoints = self.session_endpoints.each_ref().map(String::as_str);
        request.targets_any(&endpoints)
    }

    #[must_use]
    pub fn recovery(&self) -> &SessionRecovery<T> {
        &self.recovery
    }

    #[must_use]
    pub fn identity(&self) -> &Arc<IdentityCache> {
        &self.identity
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
