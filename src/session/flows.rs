//! Login, OAuth-callback, and logout flows.
//!
//! These flows are the only call sites that replace the whole session.
//! Each stores a complete, consistent session snapshot; partial field
//! mutation never happens here.

use std::sync::Arc;

use tracing::debug;

use crate::api::error::ApiError;
use crate::api::gateway::AuthApi;
use crate::api::models::{LoginResponse, UserRecord};
use crate::telemetry::SessionClearReason;

use super::store::SessionStore;
use super::token::{AccessToken, RefreshToken};

/// Query parameters delivered to the OAuth callback route.
///
/// The service either redirects with the token pair directly, or with a
/// one-time `code` to exchange. An `error` parameter short-circuits both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthCallbackParams {
    /// Access token delivered by the redirect variant.
    pub access_token: Option<String>,
    /// Refresh token delivered by the redirect variant.
    pub refresh_token: Option<String>,
    /// One-time exchange code delivered by the code variant.
    pub code: Option<String>,
    /// Machine-readable error reason from the provider.
    pub error: Option<String>,
}

/// Session flows built on the auth API and the session store.
pub struct AuthSession {
    store: SessionStore,
    auth: Arc<dyn AuthApi>,
}

impl AuthSession {
    /// Creates the flow wrapper.
    #[must_use]
    pub const fn new(store: SessionStore, auth: Arc<dyn AuthApi>) -> Self {
        Self { store, auth }
    }

    /// Logs in with username and password and establishes the session.
    ///
    /// # Errors
    ///
    /// Returns the login call's error unchanged, or [`ApiError::Decode`]
    /// when the service hands back tokens failing the validity predicate.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserRecord, ApiError> {
        let response = self.auth.login(username, password).await?;
        self.establish(response)
    }

    /// Completes the OAuth callback and establishes the session.
    ///
    /// Prefers the token-redirect variant; falls back to exchanging a
    /// one-time code. Provider errors and absent parameters surface as
    /// [`ApiError::Unauthorized`] so callers route back to login with the
    /// reason attached.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for provider errors or missing
    /// parameters, otherwise the underlying call's error.
    pub async fn complete_oauth_callback(
        &self,
        params: OAuthCallbackParams,
    ) -> Result<UserRecord, ApiError> {
        if let Some(reason) = params.error {
            return Err(ApiError::Unauthorized { message: reason });
        }

        if let (Some(access), Some(refresh)) = (
            params.access_token.as_deref(),
            params.refresh_token.as_deref(),
        ) {
            let access_token = AccessToken::new(access).ok_or_else(invalid_callback_token)?;
            let refresh_token = RefreshToken::new(refresh).ok_or_else(invalid_callback_token)?;
            self.store.set_tokens(access_token, refresh_token)?;
            return self.revalidate().await;
        }

        let Some(code) = params.code else {
            return Err(ApiError::Unauthorized {
                message: "auth_failed".to_owned(),
            });
        };
        let response = self.auth.exchange_oauth_code(&code).await?;
        self.establish(response)
    }

    /// Re-fetches the authenticated user with the stored tokens and stores
    /// the complete session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when no token pair is stored,
    /// otherwise the `current_user` call's error.
    pub async fn revalidate(&self) -> Result<UserRecord, ApiError> {
        let session = self.store.get();
        let (Some(access_token), Some(refresh_token)) =
            (session.access_token, session.refresh_token)
        else {
            return Err(ApiError::Unauthorized {
                message: "no stored session".to_owned(),
            });
        };

        let user = self.auth.current_user().await?;
        self.store.set(user.clone(), access_token, refresh_token)?;
        debug!(username = %user.username, "session established");
        Ok(user)
    }

    /// Logs out: clears the session without touching the service.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] when the persisted entries cannot be
    /// removed.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.clear(SessionClearReason::LoggedOut)
    }

    fn establish(&self, response: LoginResponse) -> Result<UserRecord, ApiError> {
        let access_token =
            AccessToken::new(&response.access_token).ok_or_else(invalid_callback_token)?;
        let refresh_token =
            RefreshToken::new(&response.refresh_token).ok_or_else(invalid_callback_token)?;
        self.store
            .set(response.user.clone(), access_token, refresh_token)?;
        debug!(username = %response.user.username, "session established");
        Ok(response.user)
    }
}

fn invalid_callback_token() -> ApiError {
    ApiError::Decode {
        message: "service returned a token failing the validity predicate".to_owned(),
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests panic on failure")]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use crate::api::error::ApiError;
    use crate::api::gateway::{AuthApi, MockAuthApi};
    use crate::api::models::test_support::user_with_role;
    use crate::api::models::{LoginResponse, Role, UserRecord};
    use crate::session::storage::InMemorySessionStorage;
    use crate::session::store::SessionStore;
    use crate::telemetry::NoopTelemetrySink;

    use super::{AuthSession, OAuthCallbackParams};

    fn sample_user() -> UserRecord {
        user_with_role("octocat", Role::User)
    }

    fn login_response() -> LoginResponse {
        LoginResponse {
            user: sample_user(),
            access_token: "issued-access-token".to_owned(),
            refresh_token: "issued-refresh-token".to_owned(),
        }
    }

    fn empty_store() -> SessionStore {
        SessionStore::hydrate(
            Arc::new(InMemorySessionStorage::new()),
            Arc::new(NoopTelemetrySink),
        )
        .expect("hydrate should succeed")
    }

    fn flows_with(auth: MockAuthApi) -> (SessionStore, AuthSession) {
        let store = empty_store();
        let session = AuthSession::new(store.clone(), Arc::new(auth) as Arc<dyn AuthApi>);
        (store, session)
    }

    #[rstest]
    #[tokio::test]
    async fn login_establishes_the_session() {
        let mut auth = MockAuthApi::new();
        auth.expect_login()
            .withf(|username, password| username == "octocat" && password == "hunter2-hunter2")
            .times(1)
            .returning(|_, _| Ok(login_response()));
        let (store, flows) = flows_with(auth);

        let user = flows
            .login("octocat", "hunter2-hunter2")
            .await
            .expect("login should succeed");

        assert_eq!(user.username, "octocat");
        assert!(store.is_authenticated());
        assert_eq!(
            store.access_token().map(|token| token.as_str().to_owned()),
            Some("issued-access-token".to_owned())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn login_rejects_a_garbage_token_from_the_service() {
        let mut auth = MockAuthApi::new();
        auth.expect_login().returning(|_, _| {
            Ok(LoginResponse {
                access_token: "undefined".to_owned(),
                ..login_response()
            })
        });
        let (store, flows) = flows_with(auth);

        let result = flows.login("octocat", "hunter2-hunter2").await;

        assert!(matches!(result, Err(ApiError::Decode { .. })));
        assert!(!store.is_authenticated());
    }

    #[rstest]
    #[tokio::test]
    async fn callback_with_tokens_revalidates_the_user() {
        let mut auth = MockAuthApi::new();
        auth.expect_current_user()
            .times(1)
            .returning(|| Ok(sample_user()));
        auth.expect_exchange_oauth_code().times(0);
        let (store, flows) = flows_with(auth);

        let user = flows
            .complete_oauth_callback(OAuthCallbackParams {
                access_token: Some("redirect-access-token".to_owned()),
                refresh_token: Some("redirect-refresh-token".to_owned()),
                ..OAuthCallbackParams::default()
            })
            .await
            .expect("callback should succeed");

        assert_eq!(user.username, "octocat");
        assert!(store.is_authenticated());
    }

    #[rstest]
    #[tokio::test]
    async fn callback_with_a_code_exchanges_it() {
        let mut auth = MockAuthApi::new();
        auth.expect_exchange_oauth_code()
            .withf(|code| code == "one-time-code")
            .times(1)
            .returning(|_| Ok(login_response()));
        let (store, flows) = flows_with(auth);

        flows
            .complete_oauth_callback(OAuthCallbackParams {
                code: Some("one-time-code".to_owned()),
                ..OAuthCallbackParams::default()
            })
            .await
            .expect("callback should succeed");

        assert!(store.is_authenticated());
    }

    #[rstest]
    #[tokio::test]
    async fn callback_surfaces_the_provider_error() {
        let (store, flows) = flows_with(MockAuthApi::new());

        let result = flows
            .complete_oauth_callback(OAuthCallbackParams {
                error: Some("access_denied".to_owned()),
                ..OAuthCallbackParams::default()
            })
            .await;

        assert_eq!(
            result,
            Err(ApiError::Unauthorized {
                message: "access_denied".to_owned(),
            })
        );
        assert!(!store.is_authenticated());
    }

    #[rstest]
    #[tokio::test]
    async fn callback_without_parameters_is_an_auth_failure() {
        let (_store, flows) = flows_with(MockAuthApi::new());

        let result = flows.complete_oauth_callback(OAuthCallbackParams::default()).await;

        assert_eq!(
            result,
            Err(ApiError::Unauthorized {
                message: "auth_failed".to_owned(),
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn logout_clears_the_established_session() {
        let mut auth = MockAuthApi::new();
        auth.expect_login().returning(|_, _| Ok(login_response()));
        let (store, flows) = flows_with(auth);
        flows
            .login("octocat", "hunter2-hunter2")
            .await
            .expect("login should succeed");

        flows.logout().expect("logout should succeed");

        assert!(!store.is_authenticated());
        assert!(store.refresh_token().is_none());
    }
}
