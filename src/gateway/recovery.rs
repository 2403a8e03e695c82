//! Session refresh shared by every caller of one failure wave. The first
//! caller that finds no refresh in flight starts one; every caller arriving
//! before it completes awaits that same ticket and observes the same outcome.
//! The refresh runs as its own task and clears its slot when the call returns,
//! so an abandoned wave cannot block the next one.

use super::{
    flight::SingleFlight,
    request::ApiRequest,
    transport::Transport,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tracing::{info, instrument, warn};

/// Every wave shares the same flight key.
const WAVE: u64 = 0;

pub struct SessionRecovery<T> {
    transport: Arc<T>,
    refresh: ApiRequest,
    flight: SingleFlight<bool>,
    attempts: Arc<AtomicUsize>,
}

impl<T: Transport> SessionRecovery<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, refresh_path: &str) -> Self {
        Self {
            transport,
            refresh: ApiRequest::post(refresh_path),
            flight: SingleFlight::new(),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Renews the session, or joins the renewal already in flight.
    /// Returns whether the session was renewed.
    #[instrument(skip(self))]
    pub async fn recover(&self) -> bool {
        let ticket = self.flight.join_or_start(WAVE, |generation| self.renew(generation));
        ticket.await.unwrap_or(false)
    }

    /// Number of refresh calls issued so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// True while a refresh ticket is outstanding.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.flight.in_flight()
    }

    fn renew(&self, generation: u64) -> impl std::future::Future<Output = bool> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let request = self.refresh.clone();
        let attempts = Arc::clone(&self.attempts);

        async move {
            attempts.fetch_add(1, Ordering::SeqCst);

            match transport.send(&request).await {
                Ok(_) => {
                    info!(generation, "session renewed");
                    true
                }
                Err(err) => {
                    warn!(generation, error = %err, "session refresh failed");
                    false
                }
            }
        }
    }
}
