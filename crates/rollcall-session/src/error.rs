//! Error types for the session layer.

use rollcall_protocol::ProtocolError;

/// Errors a [`SessionStore`](crate::SessionStore) can report.
///
/// The controller never propagates these: a failed read is treated as a
/// logged-out start, a failed write is logged and the in-memory session
/// stays authoritative.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but isn't a valid store document.
    #[error("store contents invalid: {0}")]
    Codec(#[from] ProtocolError),
}
