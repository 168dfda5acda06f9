//! View dispatcher: picks the one screen to show and builds its bundle.

use std::collections::HashMap;
use std::sync::Arc;

use rollcall_notify::Notifier;
use rollcall_protocol::{ScreenKey, Session};

use crate::{PlaceholderScreen, Screen, ScreenContext, ScreenFactory, UnauthorizedHandle};

/// Maps every [`ScreenKey`] to a screen constructor.
///
/// The mapping is total from construction: every key starts with a
/// [`PlaceholderScreen`] factory, and [`register`](Self::register) only
/// ever replaces one. Unknown menu strings never reach the dispatcher;
/// [`ScreenKey::from_menu`] resolves them to the landing key first.
///
/// The dispatcher does no role filtering. Which keys a role can reach is
/// decided by whoever renders the menu.
pub struct ViewDispatcher {
    factories: HashMap<ScreenKey, ScreenFactory>,
    auth_token_prefix: Arc<str>,
}

impl ViewDispatcher {
    /// Creates a dispatcher with placeholders for every key.
    ///
    /// `auth_token_prefix` is handed to every screen and must match the
    /// prefix the backend client uses.
    pub fn new(auth_token_prefix: impl Into<Arc<str>>) -> Self {
        let factories = ScreenKey::ALL
            .iter()
            .map(|key| (*key, PlaceholderScreen::factory(*key)))
            .collect();
        Self {
            factories,
            auth_token_prefix: auth_token_prefix.into(),
        }
    }

    /// Replaces the constructor for `key`.
    pub fn register<F>(&mut self, key: ScreenKey, factory: F) -> &mut Self
    where
        F: Fn(ScreenContext) -> Box<dyn Screen> + Send + Sync + 'static,
    {
        tracing::debug!(%key, "screen registered");
        self.factories.insert(key, Box::new(factory));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_screen<F>(mut self, key: ScreenKey, factory: F) -> Self
    where
        F: Fn(ScreenContext) -> Box<dyn Screen> + Send + Sync + 'static,
    {
        self.register(key, factory);
        self
    }

    pub fn auth_token_prefix(&self) -> &str {
        &self.auth_token_prefix
    }

    /// Builds the screen for `key`.
    ///
    /// Returns `None` when nobody is logged in. Otherwise exactly one
    /// screen, built with a bundle taken from `session` at this moment:
    /// callers must dispatch again after any session change rather than
    /// keep an old screen around.
    pub fn dispatch(
        &self,
        session: &Session,
        key: ScreenKey,
        notifier: &Notifier,
        on_unauthorized: &UnauthorizedHandle,
    ) -> Option<Box<dyn Screen>> {
        if !session.is_logged_in() {
            return None;
        }

        let context = ScreenContext::new(
            session.token.clone(),
            notifier.clone(),
            on_unauthorized.clone(),
            Arc::clone(&self.auth_token_prefix),
        );

        let screen = match self.factories.get(&key) {
            Some(factory) => factory(context),
            // Unreachable while the mapping is total; keep the landing
            // fallback rather than panic.
            None => Box::new(PlaceholderScreen::new(ScreenKey::LANDING, context)),
        };
        tracing::debug!(requested = %key, mounted = %screen.key(), "screen dispatched");
        Some(screen)
    }
}

impl std::fmt::Debug for ViewDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewDispatcher")
            .field("screens", &self.factories.len())
            .field("auth_token_prefix", &self.auth_token_prefix)
            .finish()
    }
}
