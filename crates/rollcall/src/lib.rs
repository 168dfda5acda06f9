//! # Rollcall
//!
//! Session and navigation shell for a school-attendance admin dashboard.
//!
//! Rollcall decides whether the login form or the dashboard is showing,
//! keeps the signed-in session across restarts, logs the user out when a
//! screen's request comes back unauthorized, and hands every management
//! screen the same collaborator bundle. The screens themselves are
//! registered by the application.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollcall::prelude::*;
//!
//! # async fn run() -> Result<(), RollcallError> {
//! let mut shell = ShellBuilder::new()
//!     .api_config(ApiConfig::with_base_url("http://127.0.0.1:8000/api"))
//!     .build_http(FileStore::new("session.json"))?;
//! shell.start();
//! shell.submit_login(Credentials::new("admin", "secret")).await?;
//! shell.handle(ShellEvent::Navigate(ScreenKey::Students));
//! # Ok(())
//! # }
//! ```

mod error;
mod logging;
mod login;
mod shell;

pub use error::RollcallError;
pub use logging::init_tracing;
pub use login::LoginForm;
pub use shell::{Frame, Shell, ShellBody, ShellBuilder, ShellEvent, ShellState, ShellView};

/// Convenience re-exports for applications embedding the shell.
pub mod prelude {
    pub use crate::{
        Frame, LoginForm, RollcallError, Shell, ShellBody, ShellBuilder, ShellEvent, ShellState,
        ShellView, init_tracing,
    };

    pub use rollcall_api::{ApiConfig, ApiError, Backend, HttpBackend};
    pub use rollcall_notify::{Notifier, NotifyConfig};
    pub use rollcall_protocol::{
        Credentials, LoginGrant, Notification, ScreenKey, Session, Severity,
    };
    pub use rollcall_session::{FileStore, MemoryStore, SessionConfig, SessionStore};
    pub use rollcall_view::{PlaceholderScreen, Screen, ScreenContext, UnauthorizedHandle};
}
