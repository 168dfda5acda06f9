//! The session controller: single writer of the dashboard's session state.
//!
//! Responsibilities:
//! - Rehydrating the session from the store once at startup
//! - Executing login and logout transitions
//! - Turning an unauthorized response from any screen into a forced logout
//! - Owning the menu selection and the login epoch
//!
//! # State machine
//!
//! ```text
//!                 login()
//!   [LoggedOut] ───────────→ [LoggedIn]
//!       ↑                         │
//!       └── logout() ─────────────┤
//!       └── handle_unauthorized() ┘
//! ```
//!
//! `restore()` enters either state directly from storage, discarding a
//! stored session that has a token without a role (or the reverse).
//!
//! # Concurrency note
//!
//! The controller is a plain struct with `&mut self` transitions. It is
//! owned by one task (the shell's event loop); screens reach it by posting
//! events, never by sharing it.

use std::sync::Arc;

use rollcall_api::Backend;
use rollcall_notify::Notifier;
use rollcall_protocol::{LoginEpoch, LoginGrant, ScreenKey, Session};
use tracing::{debug, info, warn};

use crate::{SessionConfig, SessionStore};

/// Owns the in-memory session and keeps the store in step with it.
pub struct SessionController<S, B> {
    session: Session,
    menu: ScreenKey,
    epoch: LoginEpoch,
    store: S,
    backend: Arc<B>,
    notifier: Notifier,
    config: SessionConfig,
}

impl<S: SessionStore, B: Backend> SessionController<S, B> {
    /// Creates a logged-out controller. Call [`restore`](Self::restore)
    /// once afterwards to pick up a persisted session.
    pub fn new(
        store: S,
        backend: Arc<B>,
        notifier: Notifier,
        config: SessionConfig,
    ) -> Self {
        Self {
            session: Session::default(),
            menu: config.landing,
            epoch: LoginEpoch::initial(),
            store,
            backend,
            notifier,
            config,
        }
    }

    /// Rehydrates the session from the store.
    ///
    /// If exactly one of token/role is stored, or the store can't be read,
    /// all four slots are cleared and the controller stays logged out.
    /// Never touches the network.
    pub fn restore(&mut self) -> &Session {
        let stored = match self.store.read_session() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "persisted session unreadable, discarding");
                self.discard_persisted();
                return &self.session;
            }
        };

        if !stored.is_consistent() {
            warn!(
                has_token = !stored.token.is_empty(),
                has_role = !stored.role.is_empty(),
                "persisted session is inconsistent, discarding"
            );
            self.discard_persisted();
            return &self.session;
        }

        self.session = stored;
        if self.session.is_logged_in() {
            info!(
                username = %self.session.username,
                role = %self.session.role,
                "session restored"
            );
        } else {
            debug!("no persisted session");
        }
        &self.session
    }

    /// Adopts a session the login collaborator has already validated.
    ///
    /// Sets and persists all four fields (placeholder avatar when none is
    /// given), returns to the landing screen, and publishes the welcome
    /// notification. Never fails: a store error is logged and the
    /// in-memory session stays authoritative.
    pub fn login(&mut self, grant: LoginGrant) {
        self.session = Session::from_grant(grant);

        if let Err(e) = self.store.write_session(&self.session) {
            warn!(error = %e, "could not persist session, it will not survive a restart");
        }

        self.menu = self.config.landing;
        info!(
            username = %self.session.username,
            role = %self.session.role,
            "logged in"
        );
        self.notifier.success(self.config.welcome_message.clone());
    }

    /// Signs out locally and tells the backend, best effort.
    ///
    /// When a token is present the backend logout call is spawned as a
    /// detached task; its outcome is only logged and the teardown below
    /// never waits for it. Safe to call when already logged out: the
    /// teardown and notification happen again, without a network call.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn logout(&mut self) {
        if self.session.is_logged_in() {
            self.spawn_backend_logout(self.session.token.clone());
        }

        self.session = Session::default();
        self.clear_persisted();
        self.menu = self.config.landing;
        self.epoch = self.epoch.next();

        info!(epoch = %self.epoch, "logged out");
        self.notifier.info(self.config.logged_out_message.clone());
    }

    /// Recovery path for a screen whose request was rejected as
    /// unauthorized: an error notification, then a full [`logout`](Self::logout).
    ///
    /// The logout notice replaces the error in the single visible slot at
    /// once, so the error is only seen by [`Notifier::published`] observers.
    pub fn handle_unauthorized(&mut self) {
        warn!(
            username = %self.session.username,
            "unauthorized response reported, forcing logout"
        );
        self.notifier.error(self.config.expired_message.clone());
        self.logout();
    }

    /// Sidebar navigation. Ignored while logged out.
    pub fn navigate(&mut self, key: ScreenKey) {
        if !self.is_logged_in() {
            debug!(%key, "navigation ignored while logged out");
            return;
        }
        if self.menu != key {
            debug!(from = %self.menu, to = %key, "navigate");
            self.menu = key;
        }
    }

    /// `true` while a session is active. Screen selection is gated on
    /// this and nothing else.
    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The active menu selection.
    pub fn menu(&self) -> ScreenKey {
        self.menu
    }

    /// The current login form instance.
    pub fn login_epoch(&self) -> LoginEpoch {
        self.epoch
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn spawn_backend_logout(&self, token: String) {
        let backend = Arc::clone(&self.backend);
        // Detached: nothing awaits or cancels this task.
        tokio::spawn(async move {
            match backend.logout(&token).await {
                Ok(()) => debug!("backend session invalidated"),
                Err(e) => warn!(
                    error = %e,
                    "logout notification failed, local session already cleared"
                ),
            }
        });
    }

    /// Drops the in-memory session and empties the store.
    fn discard_persisted(&mut self) {
        self.session = Session::default();
        self.clear_persisted();
    }

    fn clear_persisted(&mut self) {
        if let Err(e) = self.store.clear_session() {
            warn!(error = %e, "could not clear persisted session");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionController`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! The backend is a recording stub: every logout call sends the token
    //! it received on a channel, so tests can await the detached task
    //! instead of sleeping.

    use std::collections::BTreeMap;

    use rollcall_api::ApiError;
    use rollcall_notify::NotifyConfig;
    use rollcall_protocol::{Credentials, Notification, Severity, StorageKey, DEFAULT_AVATAR};
    use tokio::sync::{broadcast, mpsc};

    use super::*;
    use crate::{MemoryStore, StoreError};

    // -- Helpers ----------------------------------------------------------

    #[derive(Clone, Copy)]
    enum LogoutOutcome {
        Accept,
        Reject(u16),
        Hang,
    }

    struct RecordingBackend {
        calls: mpsc::UnboundedSender<String>,
        outcome: LogoutOutcome,
    }

    impl Backend for RecordingBackend {
        async fn login(&self, _credentials: &Credentials) -> Result<LoginGrant, ApiError> {
            Err(ApiError::Status(501))
        }

        async fn logout(&self, token: &str) -> Result<(), ApiError> {
            let _ = self.calls.send(token.to_string());
            match self.outcome {
                LogoutOutcome::Accept => Ok(()),
                LogoutOutcome::Reject(code) => Err(ApiError::Status(code)),
                LogoutOutcome::Hang => std::future::pending().await,
            }
        }
    }

    type Controller = SessionController<MemoryStore, RecordingBackend>;

    fn controller_with(
        store: MemoryStore,
        outcome: LogoutOutcome,
    ) -> (Controller, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Arc::new(RecordingBackend { calls: tx, outcome });
        let controller = SessionController::new(
            store,
            backend,
            Notifier::new(NotifyConfig::default()),
            SessionConfig::default(),
        );
        (controller, rx)
    }

    fn controller() -> (Controller, MemoryStore, mpsc::UnboundedReceiver<String>) {
        let store = MemoryStore::new();
        let (c, rx) = controller_with(store.clone(), LogoutOutcome::Accept);
        (c, store, rx)
    }

    fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(note) = rx.try_recv() {
            out.push(note);
        }
        out
    }

    fn stored(store: &MemoryStore) -> BTreeMap<StorageKey, String> {
        store
            .snapshot()
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }

    /// Store whose every operation fails, for the "never surfaces" paths.
    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn get(&self, _key: StorageKey) -> Result<Option<String>, StoreError> {
            Err(std::io::Error::other("disk on fire").into())
        }
        fn set(&mut self, _key: StorageKey, _value: &str) -> Result<(), StoreError> {
            Err(std::io::Error::other("disk on fire").into())
        }
        fn remove(&mut self, _key: StorageKey) -> Result<(), StoreError> {
            Err(std::io::Error::other("disk on fire").into())
        }
    }

    // =====================================================================
    // restore()
    // =====================================================================

    #[tokio::test]
    async fn test_restore_token_without_role_clears_everything() {
        let store = MemoryStore::with_slots([
            (StorageKey::Token, "abc"),
            (StorageKey::UserRole, ""),
            (StorageKey::Username, "x"),
            (StorageKey::UserAvatar, ""),
        ]);
        let (mut c, _rx) = controller_with(store.clone(), LogoutOutcome::Accept);

        let session = c.restore().clone();

        assert_eq!(session, Session::default());
        assert!(!c.is_logged_in());
        assert!(store.is_empty(), "all four slots must be removed");
    }

    #[tokio::test]
    async fn test_restore_role_without_token_clears_everything() {
        let store = MemoryStore::with_slots([
            (StorageKey::UserRole, "admin"),
            (StorageKey::Username, "alice"),
        ]);
        let (mut c, _rx) = controller_with(store.clone(), LogoutOutcome::Accept);

        c.restore();

        assert_eq!(c.session(), &Session::default());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restore_consistent_session_is_adopted() {
        let store = MemoryStore::with_slots([
            (StorageKey::Token, "tok1"),
            (StorageKey::Username, "alice"),
            (StorageKey::UserAvatar, "/a.png"),
            (StorageKey::UserRole, "admin"),
        ]);
        let (mut c, _rx) = controller_with(store, LogoutOutcome::Accept);

        c.restore();

        assert!(c.is_logged_in());
        assert_eq!(c.session().username, "alice");
        assert_eq!(c.session().avatar, "/a.png");
        assert_eq!(c.menu(), ScreenKey::LANDING);
    }

    #[tokio::test]
    async fn test_restore_empty_store_stays_logged_out() {
        let (mut c, store, _rx) = controller();

        c.restore();

        assert!(!c.is_logged_in());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restore_makes_no_network_call() {
        let store = MemoryStore::with_slots([
            (StorageKey::Token, "tok1"),
            (StorageKey::UserRole, "admin"),
        ]);
        let (mut c, mut rx) = controller_with(store, LogoutOutcome::Accept);

        c.restore();
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_restore_unreadable_store_starts_logged_out() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let backend = Arc::new(RecordingBackend {
            calls: tx,
            outcome: LogoutOutcome::Accept,
        });
        let mut c = SessionController::new(
            BrokenStore,
            backend,
            Notifier::default(),
            SessionConfig::default(),
        );

        c.restore();

        assert!(!c.is_logged_in());
    }

    // =====================================================================
    // login()
    // =====================================================================

    #[tokio::test]
    async fn test_login_persists_all_four_fields() {
        let (mut c, store, _rx) = controller();

        c.login(LoginGrant::new("tok1", "alice", "admin").with_avatar("/alice.png"));

        let slots = store.snapshot();
        assert_eq!(slots[&StorageKey::Token], "tok1");
        assert_eq!(slots[&StorageKey::Username], "alice");
        assert_eq!(slots[&StorageKey::UserAvatar], "/alice.png");
        assert_eq!(slots[&StorageKey::UserRole], "admin");
    }

    #[tokio::test]
    async fn test_login_without_avatar_uses_placeholder() {
        let (mut c, store, _rx) = controller();

        c.login(LoginGrant::new("tok1", "alice", "admin"));

        assert_eq!(c.session().avatar, DEFAULT_AVATAR);
        assert_eq!(store.snapshot()[&StorageKey::UserAvatar], DEFAULT_AVATAR);
    }

    #[tokio::test]
    async fn test_login_then_restore_after_reload_yields_same_fields() {
        let (mut c, store, _rx) = controller();
        c.login(LoginGrant::new("tok1", "alice", "admin"));

        // Simulate a reload: a fresh controller over the same storage.
        let (mut reloaded, _rx2) = controller_with(store, LogoutOutcome::Accept);
        reloaded.restore();

        assert_eq!(
            reloaded.session(),
            &Session {
                token: "tok1".into(),
                username: "alice".into(),
                avatar: DEFAULT_AVATAR.into(),
                role: "admin".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_login_resets_menu_and_publishes_success() {
        let (mut c, _store, _rx) = controller();
        c.login(LoginGrant::new("t0", "u", "r"));
        c.navigate(ScreenKey::Reports);
        c.logout();
        let mut notes = c.notifier().published();

        c.login(LoginGrant::new("tok1", "alice", "admin"));

        assert_eq!(c.menu(), ScreenKey::LANDING);
        let published = drain(&mut notes);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].severity, Severity::Success);
        assert_eq!(c.notifier().current().unwrap().severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_login_store_failure_still_logs_in() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let backend = Arc::new(RecordingBackend {
            calls: tx,
            outcome: LogoutOutcome::Accept,
        });
        let mut c = SessionController::new(
            BrokenStore,
            backend,
            Notifier::default(),
            SessionConfig::default(),
        );

        c.login(LoginGrant::new("tok1", "alice", "admin"));

        assert!(c.is_logged_in());
    }

    // =====================================================================
    // logout()
    // =====================================================================

    #[tokio::test]
    async fn test_logout_clears_memory_and_storage() {
        let (mut c, store, _rx) = controller();
        c.login(LoginGrant::new("tok1", "alice", "admin"));

        c.logout();

        assert!(!c.is_logged_in());
        assert_eq!(c.session(), &Session::default());
        assert!(stored(&store).is_empty());
    }

    #[tokio::test]
    async fn test_logout_notifies_backend_with_stored_token() {
        let (mut c, _store, mut rx) = controller();
        c.login(LoginGrant::new("tok1", "alice", "admin"));

        c.logout();

        assert_eq!(rx.recv().await.as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_logout_backend_failure_still_tears_down() {
        let store = MemoryStore::new();
        let (mut c, mut rx) = controller_with(store.clone(), LogoutOutcome::Reject(500));
        c.login(LoginGrant::new("tok1", "alice", "admin"));

        c.logout();
        // Let the detached task run to completion.
        assert_eq!(rx.recv().await.as_deref(), Some("tok1"));
        tokio::task::yield_now().await;

        assert!(!c.is_logged_in());
        assert!(stored(&store).is_empty());
    }

    #[tokio::test]
    async fn test_logout_rejected_as_unauthorized_does_not_recurse() {
        let (mut c, mut rx) = controller_with(MemoryStore::new(), LogoutOutcome::Reject(401));
        c.login(LoginGrant::new("tok1", "alice", "admin"));
        let mut notes = c.notifier().published();

        c.logout();
        rx.recv().await;
        tokio::task::yield_now().await;

        let published = drain(&mut notes);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].severity, Severity::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_does_not_wait_for_hanging_backend() {
        let (mut c, mut rx) = controller_with(MemoryStore::new(), LogoutOutcome::Hang);
        c.login(LoginGrant::new("tok1", "alice", "admin"));

        c.logout();

        // Teardown is already complete even though the call never returns.
        assert!(!c.is_logged_in());
        assert_eq!(rx.recv().await.as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_logout_twice_is_idempotent() {
        let (mut c, store, mut rx) = controller();
        c.login(LoginGrant::new("tok1", "alice", "admin"));

        c.logout();
        c.logout();

        assert!(!c.is_logged_in());
        assert!(stored(&store).is_empty());
        assert_eq!(rx.recv().await.as_deref(), Some("tok1"));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "second logout has no token to send");
    }

    #[tokio::test]
    async fn test_logout_when_logged_out_still_notifies() {
        let (mut c, _store, mut rx) = controller();
        let mut notes = c.notifier().published();

        c.logout();

        let published = drain(&mut notes);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].severity, Severity::Info);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_logout_mints_new_epoch_every_time() {
        let (mut c, _store, _rx) = controller();
        let first = c.login_epoch();

        c.logout();
        let second = c.login_epoch();
        c.logout();
        let third = c.login_epoch();

        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[tokio::test]
    async fn test_logout_resets_menu_to_landing() {
        let (mut c, _store, _rx) = controller();
        c.login(LoginGrant::new("tok1", "alice", "admin"));
        c.navigate(ScreenKey::Students);

        c.logout();

        assert_eq!(c.menu(), ScreenKey::LANDING);
    }

    // =====================================================================
    // handle_unauthorized()
    // =====================================================================

    #[tokio::test]
    async fn test_handle_unauthorized_error_then_info_then_empty() {
        let (mut c, store, mut rx) = controller();
        c.login(LoginGrant::new("tok1", "alice", "admin"));
        let epoch_before = c.login_epoch();
        let mut notes = c.notifier().published();

        c.handle_unauthorized();

        let published = drain(&mut notes);
        let severities: Vec<Severity> = published.iter().map(|n| n.severity).collect();
        assert_eq!(severities, vec![Severity::Error, Severity::Info]);
        assert_ne!(published[0].text, published[1].text);
        assert_eq!(c.session(), &Session::default());
        assert!(stored(&store).is_empty());
        assert_ne!(c.login_epoch(), epoch_before);
        assert_eq!(rx.recv().await.as_deref(), Some("tok1"));
    }

    // =====================================================================
    // navigate()
    // =====================================================================

    #[tokio::test]
    async fn test_navigate_changes_menu_when_logged_in() {
        let (mut c, _store, _rx) = controller();
        c.login(LoginGrant::new("tok1", "alice", "admin"));

        c.navigate(ScreenKey::ExitPasses);

        assert_eq!(c.menu(), ScreenKey::ExitPasses);
    }

    #[tokio::test]
    async fn test_navigate_ignored_when_logged_out() {
        let (mut c, _store, _rx) = controller();

        c.navigate(ScreenKey::Students);

        assert_eq!(c.menu(), ScreenKey::LANDING);
    }
}
