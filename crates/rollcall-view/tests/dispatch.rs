//! Integration tests for the view dispatcher using a mock screen.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rollcall_notify::Notifier;
use rollcall_protocol::{ScreenKey, Session, Severity};
use rollcall_view::{Screen, ScreenContext, UnauthorizedHandle, ViewDispatcher};

// =========================================================================
// Mock screen: a student list that reports what it was built with.
// =========================================================================

struct StudentList {
    context: ScreenContext,
}

impl Screen for StudentList {
    fn key(&self) -> ScreenKey {
        ScreenKey::Students
    }

    fn context(&self) -> &ScreenContext {
        &self.context
    }

    fn render(&self) -> String {
        "3 students".to_string()
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn logged_in() -> Session {
    Session {
        token: "tok1".into(),
        username: "alice".into(),
        avatar: "/a.png".into(),
        role: "admin".into(),
    }
}

fn counting_handle() -> (UnauthorizedHandle, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    (
        UnauthorizedHandle::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }),
        count,
    )
}

// =========================================================================
// dispatch()
// =========================================================================

#[test]
fn test_dispatch_logged_out_returns_none() {
    let dispatcher = ViewDispatcher::new("Token ");
    let (handle, _) = counting_handle();

    for key in ScreenKey::ALL {
        let screen = dispatcher.dispatch(&Session::default(), key, &Notifier::default(), &handle);
        assert!(screen.is_none(), "{key} must not render while logged out");
    }
}

#[test]
fn test_dispatch_every_key_mounts_that_screen() {
    let dispatcher = ViewDispatcher::new("Token ");
    let (handle, _) = counting_handle();

    for key in ScreenKey::ALL {
        let screen = dispatcher
            .dispatch(&logged_in(), key, &Notifier::default(), &handle)
            .expect("logged in");
        assert_eq!(screen.key(), key);
    }
}

#[test]
fn test_dispatch_unknown_menu_lands_on_dashboard() {
    let dispatcher = ViewDispatcher::new("Token ");
    let (handle, _) = counting_handle();

    let key = ScreenKey::from_menu("not-a-screen");
    let screen = dispatcher
        .dispatch(&logged_in(), key, &Notifier::default(), &handle)
        .unwrap();

    assert_eq!(screen.key(), ScreenKey::Dashboard);
}

#[test]
fn test_dispatch_every_screen_gets_identical_bundle() {
    let dispatcher = ViewDispatcher::new("Bearer ");
    let (handle, _) = counting_handle();
    let notifier = Notifier::default();

    for key in ScreenKey::ALL {
        let screen = dispatcher.dispatch(&logged_in(), key, &notifier, &handle).unwrap();
        let ctx = screen.context();
        assert_eq!(ctx.token(), "tok1");
        assert_eq!(ctx.auth_token_prefix(), "Bearer ");
        assert_eq!(ctx.authorization_header(), "Bearer tok1");
    }
}

#[test]
fn test_dispatch_registered_screen_replaces_placeholder() {
    let dispatcher = ViewDispatcher::new("Token ")
        .with_screen(ScreenKey::Students, |context| Box::new(StudentList { context }));
    let (handle, _) = counting_handle();

    let screen = dispatcher
        .dispatch(&logged_in(), ScreenKey::Students, &Notifier::default(), &handle)
        .unwrap();

    assert_eq!(screen.render(), "3 students");

    let other = dispatcher
        .dispatch(&logged_in(), ScreenKey::Teachers, &Notifier::default(), &handle)
        .unwrap();
    assert!(other.render().starts_with("Teachers"));
}

#[test]
fn test_dispatch_rebuilds_bundle_from_current_session() {
    let dispatcher = ViewDispatcher::new("Token ");
    let (handle, _) = counting_handle();
    let mut session = logged_in();

    let before = dispatcher
        .dispatch(&session, ScreenKey::Reports, &Notifier::default(), &handle)
        .unwrap();
    session.token = "tok2".into();
    let after = dispatcher
        .dispatch(&session, ScreenKey::Reports, &Notifier::default(), &handle)
        .unwrap();

    assert_eq!(before.context().token(), "tok1");
    assert_eq!(after.context().token(), "tok2");
}

#[test]
fn test_screen_unauthorized_reaches_handler() {
    let dispatcher = ViewDispatcher::new("Token ");
    let (handle, count) = counting_handle();

    let screen = dispatcher
        .dispatch(&logged_in(), ScreenKey::Classes, &Notifier::default(), &handle)
        .unwrap();
    screen.context().guard_status(401);

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_screen_notify_publishes_to_shared_slot() {
    let dispatcher = ViewDispatcher::new("Token ");
    let (handle, _) = counting_handle();
    let notifier = Notifier::default();

    let screen = dispatcher
        .dispatch(&logged_in(), ScreenKey::Justifications, &notifier, &handle)
        .unwrap();
    screen.context().notify("Justification saved.", Severity::Success);

    let visible = notifier.current().unwrap();
    assert_eq!(visible.text, "Justification saved.");
    assert_eq!(visible.severity, Severity::Success);
}
