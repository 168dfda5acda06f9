/// Errors that can occur when talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response: connection refused,
    /// DNS failure, timeout, or an unreadable body.
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend rejected the credentials or token.
    ///
    /// 401 from any endpoint, or 400 from the login endpoint.
    #[error("unauthorized (status {0})")]
    Unauthorized(u16),

    /// Any other non-2xx response.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The client could not be built from its configuration.
    #[error("invalid api configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// `true` for responses that mean "your credential is not accepted".
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
