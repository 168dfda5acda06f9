use rollcall_protocol::ScreenKey;

/// Configuration for session transitions.
///
/// Controls where the user lands after a transition and the wording of
/// the notifications the controller publishes itself.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Screen selected after every login and logout.
    pub landing: ScreenKey,

    /// Success notification published after login.
    pub welcome_message: String,

    /// Info notification published after logout.
    pub logged_out_message: String,

    /// Error notification published before a forced logout.
    pub expired_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            landing: ScreenKey::LANDING,
            welcome_message: "Welcome!".to_string(),
            logged_out_message: "Session closed.".to_string(),
            expired_message:
                "Your session has expired or is no longer valid. Please sign in again."
                    .to_string(),
        }
    }
}
