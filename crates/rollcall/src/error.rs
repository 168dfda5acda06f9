//! Unified error type for Rollcall.

use rollcall_api::ApiError;
use rollcall_protocol::ProtocolError;
use rollcall_session::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// Session transitions never fail, so this only shows up at the edges:
/// building the HTTP client, a rejected login submission, or a store the
/// caller opens directly. `#[from]` lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum RollcallError {
    /// A backend call failed (login submission, client construction).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Reading or writing the session store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Encoding, decoding, or an unknown screen key.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
