//! Single-flight refresh-token exchange.
//!
//! Several in-flight requests can observe a 401 at the same time. All of
//! them funnel through [`TokenRefresher::refresh`], which keeps at most one
//! network exchange alive: the first caller installs a shared future, later
//! callers await the same future, and every waiter observes the same
//! settled result. The slot is emptied once the exchange settles so a later
//! expiry starts a fresh exchange.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::telemetry::{SessionClearReason, TelemetryEvent, TelemetrySink};

use super::store::SessionStore;
use super::token::{AccessToken, RefreshToken};

type SharedRefresh = Shared<BoxFuture<'static, Result<AccessToken, ApiError>>>;

/// Transport performing the bare refresh-token exchange.
///
/// Implementations must not route through the request gateway: the exchange
/// is the recovery path for gateway failures and must not recurse into it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchanges a refresh token for a replacement access token.
    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<AccessToken, ApiError>;
}

/// Coordinates refresh-token exchanges with the single-flight guarantee.
pub struct TokenRefresher {
    store: SessionStore,
    transport: Arc<dyn RefreshTransport>,
    telemetry: Arc<dyn TelemetrySink>,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl TokenRefresher {
    /// Creates a refresher bound to the given store and transport.
    #[must_use]
    pub const fn new(
        store: SessionStore,
        transport: Arc<dyn RefreshTransport>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            store,
            transport,
            telemetry,
            in_flight: Mutex::new(None),
        }
    }

    /// Obtains a replacement access token.
    ///
    /// Joins the in-flight exchange when one exists; otherwise starts one.
    /// On success the store's access token is replaced in place. On network
    /// failure the whole session is cleared before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingRefreshToken`] when no refresh token is
    /// stored (the caller is expected to clear the session), or the
    /// exchange's own error after the session has been cleared.
    pub async fn refresh(&self) -> Result<AccessToken, ApiError> {
        let Some(refresh_token) = self.store.refresh_token() else {
            return Err(ApiError::MissingRefreshToken);
        };

        let exchange = {
            let mut slot = self.in_flight.lock();
            if let Some(existing) = slot.as_ref() {
                debug!("joining in-flight token refresh");
                existing.clone()
            } else {
                let fresh = perform_exchange(
                    Arc::clone(&self.transport),
                    self.store.clone(),
                    Arc::clone(&self.telemetry),
                    refresh_token,
                )
                .boxed()
                .shared();
                *slot = Some(fresh.clone());
                fresh
            }
        };

        let result = exchange.clone().await;

        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&exchange)) {
            *slot = None;
        }
        drop(slot);

        result
    }
}

async fn perform_exchange(
    transport: Arc<dyn RefreshTransport>,
    store: SessionStore,
    telemetry: Arc<dyn TelemetrySink>,
    refresh_token: RefreshToken,
) -> Result<AccessToken, ApiError> {
    match transport.exchange(&refresh_token).await {
        Ok(access_token) => {
            store.update_access_token(access_token.clone())?;
            telemetry.record(TelemetryEvent::TokenRefreshed);
            debug!("access token refreshed");
            Ok(access_token)
        }
        Err(error) => {
            warn!(%error, "token refresh failed; clearing session");
            if let Err(clear_error) = store.clear(SessionClearReason::RefreshFailed) {
                warn!(%clear_error, "failed to clear session after refresh failure");
            }
            Err(error)
        }
    }
}
