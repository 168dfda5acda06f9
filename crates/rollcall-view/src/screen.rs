//! The `Screen` trait, the extension point for management screens.
//!
//! Students, teachers, schedules, the attendance scanner, and the rest
//! live outside this crate. Each one implements [`Screen`] and is
//! registered with the dispatcher as a [`ScreenFactory`]. The dispatcher
//! builds a fresh instance, with a fresh [`ScreenContext`], every time the
//! active view changes.

use rollcall_protocol::ScreenKey;

use crate::ScreenContext;

/// A management screen mounted inside the dashboard frame.
pub trait Screen: Send + 'static {
    /// Which menu entry this screen answers to.
    fn key(&self) -> ScreenKey;

    /// The collaborator bundle the screen was built with.
    fn context(&self) -> &ScreenContext;

    /// Text rendering of the screen body.
    fn render(&self) -> String {
        self.key().title().to_string()
    }
}

/// Builds a screen from its collaborator bundle.
pub type ScreenFactory =
    Box<dyn Fn(ScreenContext) -> Box<dyn Screen> + Send + Sync>;

/// Stand-in for a screen whose real implementation isn't registered.
#[derive(Debug)]
pub struct PlaceholderScreen {
    key: ScreenKey,
    context: ScreenContext,
}

impl PlaceholderScreen {
    pub fn new(key: ScreenKey, context: ScreenContext) -> Self {
        Self { key, context }
    }

    /// A factory that produces placeholders for `key`.
    pub fn factory(key: ScreenKey) -> ScreenFactory {
        Box::new(move |context: ScreenContext| -> Box<dyn Screen> {
            Box::new(PlaceholderScreen::new(key, context))
        })
    }
}

impl Screen for PlaceholderScreen {
    fn key(&self) -> ScreenKey {
        self.key
    }

    fn context(&self) -> &ScreenContext {
        &self.context
    }

    fn render(&self) -> String {
        format!("{} (no content registered)", self.key.title())
    }
}
