//! Shared data model for Rollcall.
//!
//! This crate defines the values every other layer passes around:
//!
//! - **Session** ([`Session`], [`StorageKey`], [`LoginGrant`]): who is
//!   signed in and how that is persisted.
//! - **Notifications** ([`Notification`], [`Severity`]): the transient
//!   messages screens use to report outcomes.
//! - **Navigation** ([`ScreenKey`], [`LoginEpoch`]): which screen is
//!   active and which login form instance is current.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how persisted data is
//!   turned into bytes.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about storage backends, timers, or
//! HTTP. It only describes data.
//!
//! ```text
//! Api / Session / View (behavior) → Protocol (data)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Credentials, LoginEpoch, LoginGrant, Notification, ScreenKey, Session,
    Severity, StorageKey, DEFAULT_AVATAR,
};
