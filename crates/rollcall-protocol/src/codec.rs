//! Codec trait and implementations for persisting Rollcall data.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The file-backed session store doesn't care HOW the session is written,
//! it only needs something that implements [`Codec`].

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` lets a store that owns a codec move freely
/// between Tokio tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Persisted sessions stay human-readable, which makes a store file easy
/// to inspect or reset by hand.
///
/// ## Example
///
/// ```rust
/// use rollcall_protocol::{Codec, JsonCodec, Notification, Severity};
///
/// let codec = JsonCodec;
/// let note = Notification::new("Saved", Severity::Success);
///
/// let bytes = codec.encode(&note).unwrap();
/// let decoded: Notification = codec.decode(&bytes).unwrap();
/// assert_eq!(note, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
