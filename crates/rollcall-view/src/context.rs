//! The collaborator bundle handed to every screen.

use std::fmt;
use std::sync::Arc;

use rollcall_notify::Notifier;
use rollcall_protocol::Severity;

/// HTTP status a screen treats as "the session is no longer valid".
const UNAUTHORIZED: u16 = 401;

/// Callback a screen invokes when one of its own requests comes back
/// unauthorized.
///
/// Cheap to clone. The shell wires it to its event channel, so calling
/// [`signal`](Self::signal) from a screen never touches session state
/// directly; the forced logout runs on the shell's event loop.
#[derive(Clone)]
pub struct UnauthorizedHandle {
    callback: Arc<dyn Fn() + Send + Sync>,
}

impl UnauthorizedHandle {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Reports that the backend rejected this screen's credential.
    pub fn signal(&self) {
        (self.callback)();
    }
}

impl fmt::Debug for UnauthorizedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UnauthorizedHandle")
    }
}

/// Everything a screen needs to talk to the backend and report back.
///
/// Every screen gets an identical bundle built from the current session.
/// The bundle is a read-only projection: a screen can read the token but
/// can't change the session except by signalling unauthorized.
#[derive(Clone, Debug)]
pub struct ScreenContext {
    token: String,
    notifier: Notifier,
    on_unauthorized: UnauthorizedHandle,
    auth_token_prefix: Arc<str>,
}

impl ScreenContext {
    pub fn new(
        token: impl Into<String>,
        notifier: Notifier,
        on_unauthorized: UnauthorizedHandle,
        auth_token_prefix: Arc<str>,
    ) -> Self {
        Self {
            token: token.into(),
            notifier,
            on_unauthorized,
            auth_token_prefix,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn on_unauthorized(&self) -> &UnauthorizedHandle {
        &self.on_unauthorized
    }

    /// Scheme prefix for the `Authorization` header, e.g. `"Token "`.
    pub fn auth_token_prefix(&self) -> &str {
        &self.auth_token_prefix
    }

    /// The `Authorization` header value for this screen's requests.
    pub fn authorization_header(&self) -> String {
        format!("{}{}", self.auth_token_prefix, self.token)
    }

    /// Publishes a notification.
    pub fn notify(&self, text: impl Into<String>, severity: Severity) {
        self.notifier.publish(text, severity);
    }

    /// Invokes the unauthorized handler.
    pub fn report_unauthorized(&self) {
        self.on_unauthorized.signal();
    }

    /// Checks a response status from one of the screen's own requests.
    ///
    /// On 401 the unauthorized handler is invoked and `false` is
    /// returned; the screen should drop the response. Any other status
    /// returns `true` and is the screen's to interpret.
    pub fn guard_status(&self, status: u16) -> bool {
        if status == UNAUTHORIZED {
            tracing::debug!(status, "screen request rejected as unauthorized");
            self.report_unauthorized();
            return false;
        }
        true
    }
}
