//! Core data types shared by every Rollcall layer.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Avatar reference shown when a user has none of their own.
pub const DEFAULT_AVATAR: &str = "/avatar.png";

// ---------------------------------------------------------------------------
// Storage keys
// ---------------------------------------------------------------------------

/// The four durable storage slots that hold a session.
///
/// The string names are part of the persisted format and must not change:
/// a session written by one build has to be readable by the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    Token,
    Username,
    UserAvatar,
    UserRole,
}

impl StorageKey {
    /// Every key, in the order they are written.
    pub const ALL: [StorageKey; 4] = [
        StorageKey::Token,
        StorageKey::Username,
        StorageKey::UserAvatar,
        StorageKey::UserRole,
    ];

    /// The persisted name of this slot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Username => "username",
            Self::UserAvatar => "userAvatar",
            Self::UserRole => "userRole",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authoritative authentication state.
///
/// Every field is a plain string and the empty string means "absent".
/// An empty `token` is the logged-out state.
///
/// `token` and `role` are jointly present or jointly absent; see
/// [`Session::is_consistent`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub avatar: String,
    pub role: String,
}

impl Session {
    /// Builds the session a successful login produces.
    ///
    /// A missing or empty avatar is replaced by [`DEFAULT_AVATAR`].
    pub fn from_grant(grant: LoginGrant) -> Self {
        let avatar = grant
            .avatar
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string());
        Self {
            token: grant.token,
            username: grant.username,
            avatar,
            role: grant.role,
        }
    }

    /// `true` when a credential token is present.
    ///
    /// This is the only check that decides between the login screen and
    /// the dashboard frame.
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }

    /// `true` unless exactly one of `token` / `role` is set.
    pub fn is_consistent(&self) -> bool {
        self.token.is_empty() == self.role.is_empty()
    }

    /// Reads one field by its storage slot.
    pub fn field(&self, key: StorageKey) -> &str {
        match key {
            StorageKey::Token => &self.token,
            StorageKey::Username => &self.username,
            StorageKey::UserAvatar => &self.avatar,
            StorageKey::UserRole => &self.role,
        }
    }

    /// The avatar to display: the stored one, or the placeholder.
    pub fn display_avatar(&self) -> &str {
        if self.avatar.is_empty() {
            DEFAULT_AVATAR
        } else {
            &self.avatar
        }
    }
}

// ---------------------------------------------------------------------------
// Login exchange
// ---------------------------------------------------------------------------

/// What a login collaborator hands to the session controller once the
/// backend has accepted the user's credentials.
///
/// This is also the JSON body the backend login endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginGrant {
    pub token: String,
    pub username: String,
    #[serde(alias = "user_role", alias = "userRole")]
    pub role: String,
    #[serde(default, alias = "user_avatar", alias = "userAvatar")]
    pub avatar: Option<String>,
}

impl LoginGrant {
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            role: role.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Username/password pair sent to the backend login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// How a notification should be styled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A single transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

// ---------------------------------------------------------------------------
// ScreenKey
// ---------------------------------------------------------------------------

/// The closed set of management screens the dashboard can show.
///
/// Serialized in kebab-case (`"exit-passes"`, `"attendance-scanner"`), the
/// same strings the sidebar emits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenKey {
    #[default]
    Dashboard,
    Students,
    Teachers,
    Tutors,
    Schedules,
    Classes,
    Justifications,
    ExitPasses,
    AttendanceScanner,
    AttendanceRegistration,
    Reports,
    Summary,
}

impl ScreenKey {
    /// The screen shown after every login and logout.
    pub const LANDING: ScreenKey = ScreenKey::Dashboard;

    /// Every screen, in sidebar order.
    pub const ALL: [ScreenKey; 12] = [
        ScreenKey::Dashboard,
        ScreenKey::Students,
        ScreenKey::Teachers,
        ScreenKey::Tutors,
        ScreenKey::Schedules,
        ScreenKey::Classes,
        ScreenKey::Justifications,
        ScreenKey::ExitPasses,
        ScreenKey::AttendanceScanner,
        ScreenKey::AttendanceRegistration,
        ScreenKey::Reports,
        ScreenKey::Summary,
    ];

    /// Resolves a sidebar menu key. Never fails: anything unrecognized
    /// (including the empty string) selects [`ScreenKey::LANDING`].
    pub fn from_menu(key: &str) -> Self {
        Self::lookup(key).unwrap_or(Self::LANDING)
    }

    /// The canonical menu key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Tutors => "tutors",
            Self::Schedules => "schedules",
            Self::Classes => "classes",
            Self::Justifications => "justifications",
            Self::ExitPasses => "exit-passes",
            Self::AttendanceScanner => "attendance-scanner",
            Self::AttendanceRegistration => "attendance-registration",
            Self::Reports => "reports",
            Self::Summary => "summary",
        }
    }

    /// Heading shown in the header frame.
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Students => "Students",
            Self::Teachers => "Teachers",
            Self::Tutors => "Tutors",
            Self::Schedules => "Schedules",
            Self::Classes => "Classes",
            Self::Justifications => "Justifications",
            Self::ExitPasses => "Exit passes",
            Self::AttendanceScanner => "Attendance scanner",
            Self::AttendanceRegistration => "Attendance registration",
            Self::Reports => "Reports",
            Self::Summary => "Summary",
        }
    }

    // Canonical keys plus the sidebar keys older deployments still send.
    fn lookup(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Some(found) = Self::ALL.iter().find(|k| k.as_str() == key) {
            return Some(*found);
        }
        let legacy = match key {
            "alumnos" => Self::Students,
            "maestros" => Self::Teachers,
            "tutores" => Self::Tutors,
            "horarios" => Self::Schedules,
            "clases" => Self::Classes,
            "justificaciones" => Self::Justifications,
            "pases" => Self::ExitPasses,
            "asistencias" => Self::AttendanceScanner,
            "registro-asistencia" => Self::AttendanceRegistration,
            "reportes" => Self::Reports,
            "resumen" => Self::Summary,
            _ => return None,
        };
        Some(legacy)
    }
}

impl FromStr for ScreenKey {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| ProtocolError::UnknownScreen(s.to_string()))
    }
}

impl fmt::Display for ScreenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LoginEpoch
// ---------------------------------------------------------------------------

/// Identifies one instance of the login form.
///
/// A new epoch is minted on every logout so the login screen comes back
/// with no leftover input or error from a previous attempt. Consecutive
/// epochs are always distinct; the starting point is random so two
/// processes reading the same store don't share epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoginEpoch(u64);

impl LoginEpoch {
    /// A fresh epoch for a newly started controller.
    pub fn initial() -> Self {
        Self(rand::rng().random())
    }

    /// The epoch that follows this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoginEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch-{:016x}", self.0)
    }
}
