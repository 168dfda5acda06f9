//! HTTP backend built on `reqwest`.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use rollcall_protocol::{Credentials, LoginGrant};
use tracing::debug;

use crate::{ApiConfig, ApiError, Backend};

/// [`Backend`] implementation that talks JSON over HTTP.
///
/// Endpoints, relative to [`ApiConfig::base_url`]:
///
/// | call   | request                                             |
/// |--------|-----------------------------------------------------|
/// | login  | `POST login/` with `{"username", "password"}`      |
/// | logout | `POST logout/` with `Authorization: <prefix><token>` |
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: ApiConfig,
}

impl HttpBackend {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    /// [`ApiError::InvalidConfig`] for an empty base URL, or
    /// [`ApiError::Request`] if the TLS backend can't be initialized.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        if config.base_url.trim().is_empty() {
            return Err(ApiError::InvalidConfig("base_url is empty".into()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

impl Backend for HttpBackend {
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<LoginGrant, ApiError> {
        let url = self.config.endpoint("login/");
        debug!(%url, username = %credentials.username, "login request");

        let response = self.client.post(&url).json(credentials).send().await?;
        // Token-auth backends answer bad credentials with 400.
        let response = check_status(response).map_err(|e| match e {
            ApiError::Status(400) => ApiError::Unauthorized(400),
            other => other,
        })?;
        let grant = response.json::<LoginGrant>().await?;

        debug!(username = %grant.username, role = %grant.role, "login accepted");
        Ok(grant)
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let url = self.config.endpoint("logout/");
        debug!(%url, "logout request");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.config.authorization(token))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        // The body is ignored either way.
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status.as_u16() {
        401 => Err(ApiError::Unauthorized(401)),
        code => Err(ApiError::Status(code)),
    }
}
