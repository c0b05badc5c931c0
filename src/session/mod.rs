//! Session state, durable persistence, and token lifecycle.
//!
//! [`store::SessionStore`] is the single source of truth for the token pair
//! and the authenticated user. [`refresher::TokenRefresher`] recovers
//! expired access tokens with a single-flight exchange, and
//! [`flows::AuthSession`] implements the login/OAuth/logout flows that
//! replace the session wholesale.

pub mod flows;
pub mod refresher;
pub mod storage;
pub mod store;
pub mod token;

pub use flows::{AuthSession, OAuthCallbackParams};
pub use refresher::{RefreshTransport, TokenRefresher};
pub use storage::{FileSessionStorage, SessionStorage, StorageEntry, StorageError};
pub use store::{Session, SessionStore};
pub use token::{AccessToken, RefreshToken, looks_like_token};

#[cfg(any(test, feature = "test-support"))]
pub use storage::InMemorySessionStorage;
