//! Single source of truth for the current session.
//!
//! [`SessionStore`] owns the token pair and the authenticated-user record.
//! It is hydrated once from durable storage at startup, persists every
//! mutation synchronously, and publishes the new session to observers
//! through a watch channel. Mutations never trigger navigation; callers
//! decide what a cleared session means for them.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::warn;

use crate::api::error::ApiError;
use crate::telemetry::{SessionClearReason, TelemetryEvent, TelemetrySink};

use super::storage::{SessionStorage, StorageEntry, StorageError};
use super::token::{AccessToken, RefreshToken};

use crate::api::models::{Role, UserRecord};

/// Current token pair and authenticated-user record.
///
/// The user is present if and only if the session is considered
/// authenticated alongside a valid access token; tokens failing the
/// validity predicate are absent here, never stored as garbage values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Authenticated user, when a session is established.
    pub user: Option<UserRecord>,
    /// Bearer token for API calls.
    pub access_token: Option<AccessToken>,
    /// Token used to mint replacement access tokens.
    pub refresh_token: Option<RefreshToken>,
}

struct StoreInner {
    session: Mutex<Session>,
    storage: Arc<dyn SessionStorage>,
    telemetry: Arc<dyn TelemetrySink>,
    observers: watch::Sender<Session>,
}

/// Shared handle to the process-wide session state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Hydrates the store from durable storage.
    ///
    /// Token entries failing the validity predicate are treated as absent.
    /// A user record that fails to deserialise is discarded and its entry
    /// cleared; corruption never surfaces as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] when the backend itself fails.
    pub fn hydrate(
        storage: Arc<dyn SessionStorage>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self, ApiError> {
        let access_token = storage
            .read(StorageEntry::AccessToken)
            .map_err(map_storage_error)?
            .as_deref()
            .and_then(AccessToken::new);
        let refresh_token = storage
            .read(StorageEntry::RefreshToken)
            .map_err(map_storage_error)?
            .as_deref()
            .and_then(RefreshToken::new);
        let user = hydrate_user(storage.as_ref())?;

        let session = Session {
            user,
            access_token,
            refresh_token,
        };
        let (observers, _receiver) = watch::channel(session.clone());
        Ok(Self {
            inner: Arc::new(StoreInner {
                session: Mutex::new(session),
                storage,
                telemetry,
                observers,
            }),
        })
    }

    /// Returns a snapshot of the current session.
    #[must_use]
    pub fn get(&self) -> Session {
        self.inner.session.lock().clone()
    }

    /// Returns the stored access token, when a valid one is present.
    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.inner.session.lock().access_token.clone()
    }

    /// Returns the stored refresh token, when a valid one is present.
    #[must_use]
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.inner.session.lock().refresh_token.clone()
    }

    /// Returns the authenticated user, when one is present.
    #[must_use]
    pub fn current_user(&self) -> Option<UserRecord> {
        self.inner.session.lock().user.clone()
    }

    /// Whether the session is authenticated: a user record is present and
    /// the access token passed the validity predicate.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let session = self.inner.session.lock();
        session.user.is_some() && session.access_token.is_some()
    }

    /// Whether the authenticated user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner
            .session
            .lock()
            .user
            .as_ref()
            .is_some_and(|user| user.role == Role::Admin)
    }

    /// Subscribes to session changes. The receiver observes every `set`,
    /// `clear`, and token update as a complete session snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.observers.subscribe()
    }

    /// Replaces the whole session: user record plus token pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] when persisting fails; the in-memory
    /// session is left untouched in that case.
    pub fn set(
        &self,
        user: UserRecord,
        access_token: AccessToken,
        refresh_token: RefreshToken,
    ) -> Result<(), ApiError> {
        let serialised = serde_json::to_string(&user).map_err(|error| ApiError::Storage {
            message: format!("user record serialisation failed: {error}"),
        })?;
        let storage = self.inner.storage.as_ref();
        storage
            .write(StorageEntry::AccessToken, access_token.as_str())
            .map_err(map_storage_error)?;
        storage
            .write(StorageEntry::RefreshToken, refresh_token.as_str())
            .map_err(map_storage_error)?;
        storage
            .write(StorageEntry::User, &serialised)
            .map_err(map_storage_error)?;

        self.replace(Session {
            user: Some(user),
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        });
        Ok(())
    }

    /// Stores a token pair without a user record, leaving the session
    /// unauthenticated until the user is fetched.
    ///
    /// Used by the OAuth-callback flow, where tokens arrive before the user
    /// record can be requested with them.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] when persisting fails.
    pub fn set_tokens(
        &self,
        access_token: AccessToken,
        refresh_token: RefreshToken,
    ) -> Result<(), ApiError> {
        let storage = self.inner.storage.as_ref();
        storage
            .write(StorageEntry::AccessToken, access_token.as_str())
            .map_err(map_storage_error)?;
        storage
            .write(StorageEntry::RefreshToken, refresh_token.as_str())
            .map_err(map_storage_error)?;
        storage
            .remove(StorageEntry::User)
            .map_err(map_storage_error)?;

        self.replace(Session {
            user: None,
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        });
        Ok(())
    }

    /// Replaces only the access token, leaving the refresh token and user
    /// untouched. Reserved for the token refresher.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] when persisting fails.
    pub fn update_access_token(&self, access_token: AccessToken) -> Result<(), ApiError> {
        self.inner
            .storage
            .write(StorageEntry::AccessToken, access_token.as_str())
            .map_err(map_storage_error)?;

        let updated = {
            let mut session = self.inner.session.lock();
            session.access_token = Some(access_token);
            session.clone()
        };
        self.inner.observers.send_replace(updated);
        Ok(())
    }

    /// Clears the session: all three persisted entries are removed and the
    /// in-memory state is emptied.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] when the backend fails to remove an
    /// entry; the in-memory session is cleared regardless.
    pub fn clear(&self, reason: SessionClearReason) -> Result<(), ApiError> {
        self.replace(Session::default());
        self.inner
            .telemetry
            .record(TelemetryEvent::SessionCleared { reason });

        let storage = self.inner.storage.as_ref();
        let results = [
            storage.remove(StorageEntry::AccessToken),
            storage.remove(StorageEntry::RefreshToken),
            storage.remove(StorageEntry::User),
        ];
        for result in results {
            result.map_err(map_storage_error)?;
        }
        Ok(())
    }

    fn replace(&self, session: Session) {
        *self.inner.session.lock() = session.clone();
        self.inner.observers.send_replace(session);
    }
}

fn hydrate_user(storage: &dyn SessionStorage) -> Result<Option<UserRecord>, ApiError> {
    let Some(raw) = storage
        .read(StorageEntry::User)
        .map_err(map_storage_error)?
    else {
        return Ok(None);
    };

    match serde_json::from_str::<UserRecord>(&raw) {
        Ok(user) => Ok(Some(user)),
        Err(error) => {
            warn!(%error, "discarding corrupted persisted user record");
            storage
                .remove(StorageEntry::User)
                .map_err(map_storage_error)?;
            Ok(None)
        }
    }
}

fn map_storage_error(error: StorageError) -> ApiError {
    ApiError::Storage {
        message: error.to_string(),
    }
}
