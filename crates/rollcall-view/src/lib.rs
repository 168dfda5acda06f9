//! Screen dispatch for Rollcall.
//!
//! The dashboard shows exactly one management screen at a time. This
//! crate decides which one and what it gets to work with.
//!
//! # Key types
//!
//! - [`Screen`]: the trait every management screen implements
//! - [`ScreenContext`]: the collaborator bundle each screen receives
//!   (token, notifier, unauthorized handler, credential prefix)
//! - [`ViewDispatcher`]: total mapping from [`ScreenKey`] to a screen
//!   constructor
//! - [`PlaceholderScreen`]: what a key shows until a real screen is
//!   registered for it
//!
//! [`ScreenKey`]: rollcall_protocol::ScreenKey

mod context;
mod dispatcher;
mod screen;

pub use context::{ScreenContext, UnauthorizedHandle};
pub use dispatcher::ViewDispatcher;
pub use screen::{PlaceholderScreen, Screen, ScreenFactory};
