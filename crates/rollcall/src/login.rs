//! State of the login screen.

use rollcall_protocol::LoginEpoch;

/// One instance of the login form.
///
/// The shell creates a new form whenever the controller's login epoch
/// changes (every logout), so a failed attempt's username and error never
/// carry over into the next session's sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    epoch: LoginEpoch,
    username: String,
    error: Option<String>,
    submitting: bool,
}

impl LoginForm {
    pub fn new(epoch: LoginEpoch) -> Self {
        Self {
            epoch,
            username: String::new(),
            error: None,
            submitting: false,
        }
    }

    pub fn epoch(&self) -> LoginEpoch {
        self.epoch
    }

    /// Username of the last submission on this form.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Why the last submission failed, if it did.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub(crate) fn begin(&mut self, username: &str) {
        self.username = username.to_string();
        self.error = None;
        self.submitting = true;
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
        self.submitting = false;
    }

    pub(crate) fn finish(&mut self) {
        self.submitting = false;
    }
}
