//! Durable storage for the persisted session entries.
//!
//! The session persists as three independent string entries (access token,
//! refresh token, serialised user record), each clearable on its own. The
//! trait seam keeps the store testable and lets tests run against an
//! in-memory backend.

use std::fmt;
use std::fs;
use std::io::ErrorKind;

use camino::Utf8PathBuf;
use thiserror::Error;

/// One of the three persisted session entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageEntry {
    /// Bearer token for API calls.
    AccessToken,
    /// Token used to mint replacement access tokens.
    RefreshToken,
    /// Serialised authenticated-user record.
    User,
}

impl StorageEntry {
    /// File name backing this entry in the file storage implementation.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::User => "user.json",
        }
    }
}

impl fmt::Display for StorageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Errors surfaced by a session storage backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// An entry could not be read.
    #[error("failed to read {entry}: {message}")]
    Read {
        /// The entry being read.
        entry: StorageEntry,
        /// Underlying error detail.
        message: String,
    },

    /// An entry could not be written.
    #[error("failed to write {entry}: {message}")]
    Write {
        /// The entry being written.
        entry: StorageEntry,
        /// Underlying error detail.
        message: String,
    },

    /// An entry could not be removed.
    #[error("failed to remove {entry}: {message}")]
    Remove {
        /// The entry being removed.
        entry: StorageEntry,
        /// Underlying error detail.
        message: String,
    },
}

/// Backend holding the three persisted session entries.
pub trait SessionStorage: Send + Sync {
    /// Reads an entry, returning `None` when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] when the backend fails.
    fn read(&self, entry: StorageEntry) -> Result<Option<String>, StorageError>;

    /// Writes an entry, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] when the backend fails.
    fn write(&self, entry: StorageEntry, value: &str) -> Result<(), StorageError>;

    /// Removes an entry. Removing an absent entry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Remove`] when the backend fails.
    fn remove(&self, entry: StorageEntry) -> Result<(), StorageError>;
}

/// File-backed storage keeping one file per entry under a state directory.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    state_dir: Utf8PathBuf,
}

impl FileSessionStorage {
    /// Creates storage rooted at the given state directory. The directory is
    /// created lazily on first write.
    #[must_use]
    pub const fn new(state_dir: Utf8PathBuf) -> Self {
        Self { state_dir }
    }

    fn entry_path(&self, entry: StorageEntry) -> Utf8PathBuf {
        self.state_dir.join(entry.file_name())
    }
}

impl SessionStorage for FileSessionStorage {
    fn read(&self, entry: StorageEntry) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.entry_path(entry)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StorageError::Read {
                entry,
                message: error.to_string(),
            }),
        }
    }

    fn write(&self, entry: StorageEntry, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.state_dir).map_err(|error| StorageError::Write {
            entry,
            message: error.to_string(),
        })?;
        fs::write(self.entry_path(entry), value).map_err(|error| StorageError::Write {
            entry,
            message: error.to_string(),
        })
    }

    fn remove(&self, entry: StorageEntry) -> Result<(), StorageError> {
        match fs::remove_file(self.entry_path(entry)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StorageError::Remove {
                entry,
                message: error.to_string(),
            }),
        }
    }
}

/// In-memory storage backend for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    entries: parking_lot::Mutex<std::collections::HashMap<StorageEntry, String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl InMemorySessionStorage {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with the given entries.
    #[must_use]
    pub fn seeded(entries: &[(StorageEntry, &str)]) -> Self {
        let storage = Self::default();
        {
            let mut guard = storage.entries.lock();
            for (entry, value) in entries {
                guard.insert(*entry, (*value).to_owned());
            }
        }
        storage
    }
}

#[cfg(any(test, feature = "test-support"))]
impl SessionStorage for InMemorySessionStorage {
    fn read(&self, entry: StorageEntry) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(&entry).cloned())
    }

    fn write(&self, entry: StorageEntry, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(entry, value.to_owned());
        Ok(())
    }

    fn remove(&self, entry: StorageEntry) -> Result<(), StorageError> {
        self.entries.lock().remove(&entry);
        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests panic on failure")]
mod tests {
    use camino::Utf8PathBuf;
    use rstest::rstest;

    use super::{FileSessionStorage, SessionStorage, StorageEntry};

    fn storage_in_tempdir() -> (tempfile::TempDir, FileSessionStorage) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("state"))
            .expect("temp path should be UTF-8");
        (dir, FileSessionStorage::new(path))
    }

    #[rstest]
    fn round_trips_each_entry() {
        let (_dir, storage) = storage_in_tempdir();
        for entry in [
            StorageEntry::AccessToken,
            StorageEntry::RefreshToken,
            StorageEntry::User,
        ] {
            assert_eq!(storage.read(entry).expect("read should succeed"), None);
            storage
                .write(entry, "stored-value")
                .expect("write should succeed");
            assert_eq!(
                storage.read(entry).expect("read should succeed"),
                Some("stored-value".to_owned())
            );
        }
    }

    #[rstest]
    fn remove_is_idempotent() {
        let (_dir, storage) = storage_in_tempdir();
        storage
            .write(StorageEntry::AccessToken, "stored-value")
            .expect("write should succeed");
        storage
            .remove(StorageEntry::AccessToken)
            .expect("remove should succeed");
        storage
            .remove(StorageEntry::AccessToken)
            .expect("second remove should be a no-op");
        assert_eq!(
            storage
                .read(StorageEntry::AccessToken)
                .expect("read should succeed"),
            None
        );
    }
}
