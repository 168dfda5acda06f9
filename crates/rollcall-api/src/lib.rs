//! Backend client abstraction for Rollcall.
//!
//! The dashboard controller issues exactly two calls of its own: the login
//! exchange (delegated from the login form) and the best-effort logout
//! notification. Both go through the [`Backend`] trait so tests and
//! alternative transports can stand in for the real HTTP client.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpBackend`] via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::ApiError;
#[cfg(feature = "http")]
pub use http::HttpBackend;

use std::time::Duration;

use rollcall_protocol::{Credentials, LoginGrant};

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Where the backend lives and how credentials are presented to it.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint is joined onto.
    pub base_url: String,

    /// Scheme prefix placed before the token in the `Authorization`
    /// header (`"Token "` for token auth, `"Bearer "` for JWT). Screens
    /// reuse the same prefix for their own requests.
    pub auth_token_prefix: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            auth_token_prefix: "Token ".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ApiConfig {
    /// Create a config for the given base URL with default prefix and timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// The `Authorization` header value for `token`.
    pub fn authorization(&self, token: &str) -> String {
        format!("{}{}", self.auth_token_prefix, token)
    }

    /// Joins `path` onto the base URL with exactly one `/` between them.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// The backend calls the controller itself is responsible for.
///
/// `Send + Sync + 'static` lets the controller share the backend with a
/// detached task: the logout notification runs in the background after
/// the client-side teardown has already happened.
pub trait Backend: Send + Sync + 'static {
    /// Exchanges credentials for a session grant.
    ///
    /// # Returns
    /// - `Ok(LoginGrant)`: the credentials were accepted
    /// - `Err(ApiError::Unauthorized)`: they were not
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<LoginGrant, ApiError>> + Send;

    /// Tells the backend to invalidate `token`.
    ///
    /// Callers treat this as best effort; the result is only logged.
    fn logout(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;
}
