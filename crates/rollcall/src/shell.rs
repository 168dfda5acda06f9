//! `Shell` builder and event loop.
//!
//! The shell is the root of the dashboard. It owns the session
//! controller, the view dispatcher, and the login form, and decides on
//! every change which of the two top-level layouts is showing:
//!
//! ```text
//!                  login succeeded
//!   [Unauthenticated] ────────────→ [Authenticated]
//!   (login form)      ←──────────── (frame + one screen)
//!                  logout / unauthorized
//! ```
//!
//! Screens never touch the controller. Their unauthorized callback posts
//! a [`ShellEvent`] onto the shell's channel and the transition runs when
//! the shell processes it.

use std::fmt;
use std::sync::Arc;

use rollcall_api::{ApiConfig, Backend, HttpBackend};
use rollcall_notify::{Notifier, NotifyConfig};
use rollcall_protocol::{Credentials, LoginGrant, Notification, ScreenKey};
use rollcall_session::{SessionConfig, SessionController, SessionStore};
use rollcall_view::{Screen, ScreenContext, UnauthorizedHandle, ViewDispatcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{LoginForm, RollcallError};

/// Shown on the login form when the backend rejects the credentials.
const LOGIN_REJECTED: &str = "Invalid username or password.";

/// Shown on the login form when the backend can't be reached.
const LOGIN_UNAVAILABLE: &str = "Could not reach the server. Please try again.";

// ---------------------------------------------------------------------------
// ShellState
// ---------------------------------------------------------------------------

/// Which top-level layout is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellState {
    /// Only the login form (and the notification banner).
    Unauthenticated,
    /// The dashboard frame with exactly one management screen.
    Authenticated,
}

impl ShellState {
    /// Returns `true` if moving from `self` to `target` is a real
    /// transition. The two states only ever alternate.
    pub fn can_transition_to(self, target: Self) -> bool {
        self != target
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl fmt::Display for ShellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Unauthenticated"),
            Self::Authenticated => write!(f, "Authenticated"),
        }
    }
}

// ---------------------------------------------------------------------------
// ShellEvent
// ---------------------------------------------------------------------------

/// Everything that can change the shell, posted through [`Shell::events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// The user picked a sidebar entry.
    Navigate(ScreenKey),
    /// The login form obtained a session from the backend.
    LoginSucceeded(LoginGrant),
    /// The user asked to sign out.
    Logout,
    /// A screen's request was rejected as unauthorized.
    Unauthorized,
    /// Stop [`Shell::run`].
    Shutdown,
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// Header and sidebar data for the authenticated layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub username: String,
    /// Avatar path, never empty.
    pub avatar: String,
    /// Handed to the sidebar, which decides which entries to show.
    pub role: String,
    pub menu: ScreenKey,
}

impl Frame {
    pub fn title(&self) -> &'static str {
        self.menu.title()
    }
}

/// The layout-specific part of a [`ShellView`].
pub enum ShellBody<'a> {
    Unauthenticated(&'a LoginForm),
    Authenticated {
        frame: Frame,
        screen: &'a dyn Screen,
    },
}

/// Everything needed to draw the dashboard at one instant.
pub struct ShellView<'a> {
    /// The notification banner, rendered above both layouts.
    pub notification: Option<Notification>,
    pub body: ShellBody<'a>,
}

impl ShellView<'_> {
    pub fn state(&self) -> ShellState {
        match self.body {
            ShellBody::Unauthenticated(_) => ShellState::Unauthenticated,
            ShellBody::Authenticated { .. } => ShellState::Authenticated,
        }
    }
}

// ---------------------------------------------------------------------------
// ShellBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`Shell`].
///
/// # Example
///
/// ```rust,ignore
/// use rollcall::prelude::*;
///
/// let mut shell = ShellBuilder::new()
///     .api_config(ApiConfig::with_base_url("https://school.example/api"))
///     .screen(ScreenKey::Students, |ctx| Box::new(StudentList::new(ctx)))
///     .build_http(FileStore::new("session.json"))?;
/// shell.start();
/// shell.run().await;
/// ```
pub struct ShellBuilder {
    api_config: ApiConfig,
    notify_config: NotifyConfig,
    session_config: SessionConfig,
    screens: Vec<(ScreenKey, rollcall_view::ScreenFactory)>,
}

impl ShellBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            api_config: ApiConfig::default(),
            notify_config: NotifyConfig::default(),
            session_config: SessionConfig::default(),
            screens: Vec::new(),
        }
    }

    /// Sets the backend configuration. Its token prefix is also the one
    /// handed to every screen.
    pub fn api_config(mut self, config: ApiConfig) -> Self {
        self.api_config = config;
        self
    }

    /// Sets the notification configuration.
    pub fn notify_config(mut self, config: NotifyConfig) -> Self {
        self.notify_config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Registers the constructor for one management screen.
    pub fn screen<F>(mut self, key: ScreenKey, factory: F) -> Self
    where
        F: Fn(ScreenContext) -> Box<dyn Screen> + Send + Sync + 'static,
    {
        self.screens.push((key, Box::new(factory)));
        self
    }

    /// Builds a shell over the given store and backend.
    ///
    /// The shell starts logged out; call [`Shell::start`] to pick up a
    /// persisted session.
    pub fn build<S, B>(self, store: S, backend: B) -> Shell<S, B>
    where
        S: SessionStore,
        B: Backend,
    {
        let notifier = Notifier::new(self.notify_config);
        let controller = SessionController::new(
            store,
            Arc::new(backend),
            notifier,
            self.session_config,
        );

        // Screens format their own headers with the backend's prefix.
        let mut dispatcher = ViewDispatcher::new(self.api_config.auth_token_prefix.as_str());
        for (key, factory) in self.screens {
            dispatcher.register(key, factory);
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let signal_tx = events_tx.clone();
        let on_unauthorized = UnauthorizedHandle::new(move || {
            if signal_tx.send(ShellEvent::Unauthorized).is_err() {
                debug!("shell dropped; unauthorized signal discarded");
            }
        });

        let login_form = LoginForm::new(controller.login_epoch());

        Shell {
            controller,
            dispatcher,
            events_tx,
            events_rx,
            on_unauthorized,
            login_form,
            active: None,
            state: ShellState::Unauthenticated,
            started: false,
        }
    }

    /// Builds a shell that talks to the backend over HTTP.
    pub fn build_http<S>(self, store: S) -> Result<Shell<S, HttpBackend>, RollcallError>
    where
        S: SessionStore,
    {
        let backend = HttpBackend::new(self.api_config.clone())?;
        Ok(self.build(store, backend))
    }
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// The root of the dashboard.
///
/// Call [`start()`](Self::start) once, then feed it events, either
/// directly through [`handle()`](Self::handle) or by running
/// [`run()`](Self::run) and posting onto [`events()`](Self::events).
pub struct Shell<S, B> {
    controller: SessionController<S, B>,
    dispatcher: ViewDispatcher,
    events_tx: mpsc::UnboundedSender<ShellEvent>,
    events_rx: mpsc::UnboundedReceiver<ShellEvent>,
    on_unauthorized: UnauthorizedHandle,
    login_form: LoginForm,
    active: Option<Box<dyn Screen>>,
    state: ShellState,
    started: bool,
}

impl<S: SessionStore, B: Backend> Shell<S, B> {
    /// Restores the persisted session and mounts the first screen.
    ///
    /// Only the first call does anything.
    pub fn start(&mut self) -> ShellState {
        if self.started {
            debug!("shell already started");
            return self.state;
        }
        self.started = true;
        self.controller.restore();
        self.refresh();
        info!(state = %self.state, "shell started");
        self.state
    }

    /// Sender for posting events to this shell.
    pub fn events(&self) -> mpsc::UnboundedSender<ShellEvent> {
        self.events_tx.clone()
    }

    /// Applies one event. Returns `false` for [`ShellEvent::Shutdown`].
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn handle(&mut self, event: ShellEvent) -> bool {
        match event {
            ShellEvent::Navigate(key) => self.controller.navigate(key),
            ShellEvent::LoginSucceeded(grant) => self.controller.login(grant),
            ShellEvent::Logout => self.controller.logout(),
            ShellEvent::Unauthorized => self.controller.handle_unauthorized(),
            ShellEvent::Shutdown => {
                debug!("shutdown requested");
                return false;
            }
        }
        self.refresh();
        true
    }

    /// Processes events until [`ShellEvent::Shutdown`] arrives.
    pub async fn run(&mut self) {
        info!("shell event loop running");
        while let Some(event) = self.events_rx.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        info!("shell event loop stopped");
    }

    /// Applies every event already queued without waiting for more.
    ///
    /// Returns `false` if a [`ShellEvent::Shutdown`] was among them; the
    /// events queued behind it stay queued.
    pub fn process_pending(&mut self) -> bool {
        while let Ok(event) = self.events_rx.try_recv() {
            if !self.handle(event) {
                return false;
            }
        }
        true
    }

    /// Submits the login form.
    ///
    /// Calls the backend once. On success the session controller takes
    /// over. On failure the form keeps the error, an error notification
    /// is published, and the shell stays logged out.
    pub async fn submit_login(&mut self, credentials: Credentials) -> Result<(), RollcallError> {
        if self.controller.is_logged_in() {
            debug!("login submitted while already signed in, ignoring");
            return Ok(());
        }

        self.login_form.begin(&credentials.username);
        let backend = Arc::clone(self.controller.backend());

        match backend.login(&credentials).await {
            Ok(grant) => {
                self.login_form.finish();
                self.handle(ShellEvent::LoginSucceeded(grant));
                Ok(())
            }
            Err(e) => {
                let reason = if e.is_unauthorized() {
                    LOGIN_REJECTED
                } else {
                    LOGIN_UNAVAILABLE
                };
                warn!(username = %credentials.username, error = %e, "login failed");
                self.login_form.fail(reason);
                self.controller.notifier().error(reason);
                Err(e.into())
            }
        }
    }

    /// Snapshot of what should be on screen.
    pub fn view(&self) -> ShellView<'_> {
        let notification = self.controller.notifier().current();
        let body = match (self.controller.is_logged_in(), self.active.as_deref()) {
            (true, Some(screen)) => {
                let session = self.controller.session();
                ShellBody::Authenticated {
                    frame: Frame {
                        username: session.username.clone(),
                        avatar: session.display_avatar().to_string(),
                        role: session.role.clone(),
                        menu: self.controller.menu(),
                    },
                    screen,
                }
            }
            _ => ShellBody::Unauthenticated(&self.login_form),
        };
        ShellView { notification, body }
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    /// The mounted screen, if anyone is signed in.
    pub fn active_screen(&self) -> Option<&dyn Screen> {
        self.active.as_deref()
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login_form
    }

    pub fn controller(&self) -> &SessionController<S, B> {
        &self.controller
    }

    pub fn notifier(&self) -> &Notifier {
        self.controller.notifier()
    }

    /// Brings the login form, the mounted screen, and the state in line
    /// with the controller. Runs after every event.
    fn refresh(&mut self) {
        let epoch = self.controller.login_epoch();
        if self.login_form.epoch() != epoch {
            debug!(%epoch, "login form recreated");
            self.login_form = LoginForm::new(epoch);
        }

        // Always rebuilt: the bundle must reflect the current session.
        self.active = self.dispatcher.dispatch(
            self.controller.session(),
            self.controller.menu(),
            self.controller.notifier(),
            &self.on_unauthorized,
        );

        let next = if self.active.is_some() {
            ShellState::Authenticated
        } else {
            ShellState::Unauthenticated
        };
        if self.state.can_transition_to(next) {
            info!(from = %self.state, to = %next, "shell transition");
            self.state = next;
        }
    }
}

impl<S, B> fmt::Debug for Shell<S, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("state", &self.state)
            .field("started", &self.started)
            .field("login_form", &self.login_form)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
