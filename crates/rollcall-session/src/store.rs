//! Durable key/value storage for the four session fields.
//!
//! Rollcall doesn't care where a session is persisted, only that four
//! string slots ([`StorageKey`]) survive a restart. The [`SessionStore`]
//! trait is that contract. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: shared in-process map. Clones see the same data,
//!   which is how tests model a reload against the same storage.
//! - [`FileStore`]: a small JSON document on disk.
//!
//! An absent slot and an empty slot mean the same thing.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rollcall_protocol::{Codec, JsonCodec, Session, StorageKey};

use crate::StoreError;

/// Key/value access to the persisted session slots.
///
/// Reads and writes are synchronous. The batch methods
/// [`write_session`](Self::write_session) and
/// [`clear_session`](Self::clear_session) have default implementations
/// built from the per-field calls; stores that can make the batch atomic
/// should override them so no observer ever sees half a session.
pub trait SessionStore: Send + 'static {
    /// Reads one slot. `Ok(None)` when the slot was never written.
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError>;

    /// Writes one slot.
    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StoreError>;

    /// Removes one slot. Removing an absent slot is not an error.
    fn remove(&mut self, key: StorageKey) -> Result<(), StoreError>;

    /// Reads all four slots; absent slots become empty strings.
    fn read_session(&self) -> Result<Session, StoreError> {
        let read = |key| -> Result<String, StoreError> {
            Ok(self.get(key)?.unwrap_or_default())
        };
        Ok(Session {
            token: read(StorageKey::Token)?,
            username: read(StorageKey::Username)?,
            avatar: read(StorageKey::UserAvatar)?,
            role: read(StorageKey::UserRole)?,
        })
    }

    /// Writes all four slots.
    fn write_session(&mut self, session: &Session) -> Result<(), StoreError> {
        for key in StorageKey::ALL {
            self.set(key, session.field(key))?;
        }
        Ok(())
    }

    /// Removes all four slots.
    fn clear_session(&mut self) -> Result<(), StoreError> {
        for key in StorageKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory [`SessionStore`].
///
/// Cheap to clone; every clone shares the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<BTreeMap<StorageKey, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with the given slots.
    pub fn with_slots<'a>(
        slots: impl IntoIterator<Item = (StorageKey, &'a str)>,
    ) -> Self {
        let map = slots
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        Self {
            slots: Arc::new(Mutex::new(map)),
        }
    }

    /// Copy of every slot currently set.
    pub fn snapshot(&self) -> BTreeMap<StorageKey, String> {
        self.lock().clone()
    }

    /// `true` when no slot is set.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<StorageKey, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(&key).cloned())
    }

    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StoreError> {
        self.lock().remove(&key);
        Ok(())
    }

    // One lock for the whole batch.
    fn write_session(&mut self, session: &Session) -> Result<(), StoreError> {
        let mut slots = self.lock();
        for key in StorageKey::ALL {
            slots.insert(key, session.field(key).to_string());
        }
        Ok(())
    }

    fn clear_session(&mut self) -> Result<(), StoreError> {
        let mut slots = self.lock();
        for key in StorageKey::ALL {
            slots.remove(&key);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// [`SessionStore`] backed by a JSON file.
///
/// The document is a flat object keyed by the persisted slot names
/// (`token`, `username`, `userAvatar`, `userRole`). Keys it doesn't know
/// are preserved on write. A missing file is an empty store.
///
/// Every write replaces the file through a temporary sibling and a rename,
/// so a batch lands all at once.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    codec: JsonCodec,
}

type Document = BTreeMap<String, String>;

impl FileStore {
    /// Opens (but does not create) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Document::new()),
            Ok(bytes) => Ok(self.codec.decode(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let bytes = self.codec.encode(doc)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::trace!(path = %self.path.display(), "session store written");
        Ok(())
    }

    fn update(
        &mut self,
        apply: impl FnOnce(&mut Document),
    ) -> Result<(), StoreError> {
        let mut doc = self.load()?;
        apply(&mut doc);
        self.save(&doc)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.remove(key.as_str());
        })
    }

    fn read_session(&self) -> Result<Session, StoreError> {
        let mut doc = self.load()?;
        let mut take = |key: StorageKey| doc.remove(key.as_str()).unwrap_or_default();
        Ok(Session {
            token: take(StorageKey::Token),
            username: take(StorageKey::Username),
            avatar: take(StorageKey::UserAvatar),
            role: take(StorageKey::UserRole),
        })
    }

    fn write_session(&mut self, session: &Session) -> Result<(), StoreError> {
        self.update(|doc| {
            for key in StorageKey::ALL {
                doc.insert(key.as_str().to_string(), session.field(key).to_string());
            }
        })
    }

    fn clear_session(&mut self) -> Result<(), StoreError> {
        self.update(|doc| {
            for key in StorageKey::ALL {
                doc.remove(key.as_str());
            }
        })
    }
}
