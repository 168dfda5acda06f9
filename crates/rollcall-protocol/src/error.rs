//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// Each Rollcall crate defines its own error enum, so a `ProtocolError`
/// always points at encoding, decoding, or an unrecognized value, never at
/// storage or networking.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: a truncated or hand-edited store file.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A menu key that names none of the known screens.
    ///
    /// Only returned by strict parsing (`str::parse::<ScreenKey>()`).
    /// Navigation uses [`ScreenKey::from_menu`](crate::ScreenKey::from_menu),
    /// which falls back to the landing screen instead.
    #[error("unknown screen key: {0}")]
    UnknownScreen(String),
}
