//! Single-slot notification channel for Rollcall.
//!
//! Every screen reports outcomes ("Saved", "Could not load students") by
//! publishing through a [`Notifier`]. At most one notification is visible;
//! it clears itself after a fixed window (3 s by default).
//!
//! # Superseding
//!
//! A new publish replaces whatever is visible and gets its own full window.
//! Each publish bumps a generation counter and aborts the previous clear
//! task, and a clear task only clears the slot if its generation is still
//! the current one. A stale timer can therefore never wipe a newer message,
//! even if it already woke up and is waiting for the lock.
//!
//! # Observing
//!
//! The visible slot is a `tokio::sync::watch` channel ([`Notifier::subscribe`]).
//! Every publish is also broadcast ([`Notifier::published`]) so observers
//! that care about the sequence of messages, not just the latest, see all of
//! them.
//!
//! ```ignore
//! let notifier = Notifier::new(NotifyConfig::default());
//! notifier.success("Student saved.");
//! assert!(notifier.current().is_some());
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use rollcall_protocol::{Notification, Severity};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the notification channel.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// How long a notification stays visible. Default: 3000 ms.
    pub clear_after: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            clear_after: Self::DEFAULT_CLEAR_AFTER,
        }
    }
}

impl NotifyConfig {
    /// The visible window used when none is configured.
    pub const DEFAULT_CLEAR_AFTER: Duration = Duration::from_millis(3000);

    /// Create a config with a specific visible window.
    pub fn with_clear_after(clear_after: Duration) -> Self {
        Self { clear_after }
    }

    /// Fix out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Notifier::new`]. A zero window would make
    /// every notification invisible, so it is reset to the default.
    pub fn validated(mut self) -> Self {
        if self.clear_after.is_zero() {
            warn!(
                default_ms = Self::DEFAULT_CLEAR_AFTER.as_millis() as u64,
                "clear_after is zero, using default"
            );
            self.clear_after = Self::DEFAULT_CLEAR_AFTER;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Capacity of the publish broadcast. Lagging observers skip old messages.
const PUBLISHED_CAPACITY: usize = 32;

/// The clear task currently scheduled, if any.
struct PendingClear {
    /// Incremented on every publish and every manual clear.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    clear_after: Duration,
    slot: watch::Sender<Option<Notification>>,
    published: broadcast::Sender<Notification>,
    pending: Mutex<PendingClear>,
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, PendingClear> {
        // The guarded data is two plain fields; a panic elsewhere can't
        // leave it half-updated.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the slot unless a newer publish happened after `generation`.
    fn clear_if_current(&self, generation: u64) {
        let mut pending = self.lock_pending();
        if pending.generation != generation {
            trace!(generation, current = pending.generation, "stale clear ignored");
            return;
        }
        pending.task = None;
        self.slot.send_replace(None);
        trace!(generation, "notification cleared");
    }
}

/// Handle to the notification slot.
///
/// Cheap to clone; every clone publishes into the same slot. This is the
/// "publish notification" function handed to every screen.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    /// Create an empty notification channel.
    pub fn new(config: NotifyConfig) -> Self {
        let config = config.validated();
        let (slot, _) = watch::channel(None);
        let (published, _) = broadcast::channel(PUBLISHED_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                clear_after: config.clear_after,
                slot,
                published,
                pending: Mutex::new(PendingClear {
                    generation: 0,
                    task: None,
                }),
            }),
        }
    }

    /// Show `text` with the given severity, replacing anything visible.
    ///
    /// The message stays visible for the full configured window, measured
    /// from this call.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime (the clear timer is a
    /// spawned task).
    pub fn publish(&self, text: impl Into<String>, severity: Severity) {
        let note = Notification::new(text, severity);
        let mut pending = self.inner.lock_pending();

        pending.generation += 1;
        let generation = pending.generation;
        if let Some(task) = pending.task.take() {
            task.abort();
        }

        debug!(%severity, text = %note.text, generation, "notification published");
        self.inner.slot.send_replace(Some(note.clone()));
        // No subscribers is fine.
        let _ = self.inner.published.send(note);

        // The task holds a weak reference so a dropped channel doesn't
        // linger until its timer fires.
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let clear_after = self.inner.clear_after;
        pending.task = Some(tokio::spawn(async move {
            tokio::time::sleep(clear_after).await;
            if let Some(inner) = weak.upgrade() {
                inner.clear_if_current(generation);
            }
        }));
    }

    /// Shorthand for `publish(text, Severity::Info)`.
    pub fn info(&self, text: impl Into<String>) {
        self.publish(text, Severity::Info);
    }

    /// Shorthand for `publish(text, Severity::Success)`.
    pub fn success(&self, text: impl Into<String>) {
        self.publish(text, Severity::Success);
    }

    /// Shorthand for `publish(text, Severity::Error)`.
    pub fn error(&self, text: impl Into<String>) {
        self.publish(text, Severity::Error);
    }

    /// Empty the slot now and cancel the pending timer.
    pub fn clear(&self) {
        let mut pending = self.inner.lock_pending();
        pending.generation += 1;
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        self.inner.slot.send_replace(None);
    }

    /// The notification currently visible, if any.
    pub fn current(&self) -> Option<Notification> {
        self.inner.slot.borrow().clone()
    }

    /// Watch the visible slot. The receiver sees `None` when it clears.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.slot.subscribe()
    }

    /// Receive every notification published from now on, in order.
    pub fn published(&self) -> broadcast::Receiver<Notification> {
        self.inner.published.subscribe()
    }

    /// The configured visible window.
    pub fn clear_after(&self) -> Duration {
        self.inner.clear_after
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(NotifyConfig::default())
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("clear_after", &self.inner.clear_after)
            .field("current", &self.current())
            .finish()
    }
}
