//! Session management for Rollcall.
//!
//! This crate owns the authentication lifecycle of the dashboard:
//!
//! 1. **Persistence**: the four session fields live in a durable
//!    [`SessionStore`] so a reload doesn't sign the user out.
//! 2. **Transitions**: [`SessionController`] executes login, logout, and
//!    the forced logout that follows an unauthorized response.
//! 3. **Recovery**: a persisted session that violates the token/role
//!    invariant is discarded in full on startup.
//!
//! # How it fits in the stack
//!
//! ```text
//! Shell (above)  ← asks the controller whether someone is signed in
//!     ↕
//! Session Layer (this crate)  ← single writer of session state
//!     ↕
//! Api / Notify / Protocol (below)  ← logout call, notifications, data model
//! ```

mod config;
mod controller;
mod error;
mod store;

pub use config::SessionConfig;
pub use controller::SessionController;
pub use error::StoreError;
pub use store::{FileStore, MemoryStore, SessionStore};
