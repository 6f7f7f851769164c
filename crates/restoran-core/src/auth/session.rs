//! Session store holding the current bearer token.
//!
//! `SessionStore` is a cheap-to-clone handle; every clone observes the same
//! token. Writes go to memory first and then to the backing `SessionStorage`,
//! so a storage failure never leaves the in-memory state behind.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// What survives a restart: the token and the user it was issued for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Durable backing for the session store.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<SessionData>, SessionError>;
    fn save(&self, data: &SessionData) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Stores the session as JSON in the cache directory.
pub struct FileStorage {
    cache_dir: PathBuf,
}

impl FileStorage {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Keeps the "persisted" session in memory. Used by tests and by callers
/// that do not want anything written to disk.
#[derive(Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<SessionData>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: SessionData) -> Self {
        Self {
            saved: Mutex::new(Some(data)),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        Ok(self.saved.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Single source of truth for the current authentication token.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionData>>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Create an empty store without reading storage.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionData::default())),
            storage: Arc::new(storage),
        }
    }

    /// Create a store initialized from whatever `storage` holds.
    /// An unreadable session is logged and treated as logged out.
    pub fn load(storage: impl SessionStorage + 'static) -> Self {
        let store = Self::new(storage);
        match store.storage.load() {
            Ok(Some(data)) => {
                debug!(has_token = data.token.is_some(), "Session restored from storage");
                *store.write() = data;
            }
            Ok(None) => debug!("No stored session"),
            Err(e) => warn!(error = %e, "Failed to load stored session, starting logged out"),
        }
        store
    }

    /// Store backed by `MemoryStorage`.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Start a new session with `token`. Any user id from the previous
    /// session is dropped; call `set_user_id` once the new one is known.
    /// The in-memory token is updated even when persisting it fails; the
    /// error is handed back to the caller.
    pub fn login(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let snapshot = SessionData {
            token: Some(token.into()),
            user_id: None,
        };
        *self.write() = snapshot.clone();
        self.storage.save(&snapshot)
    }

    /// Remember which user the token belongs to.
    pub fn set_user_id(&self, user_id: i64) -> Result<(), SessionError> {
        let snapshot = {
            let mut state = self.write();
            state.user_id = Some(user_id);
            state.clone()
        };
        self.storage.save(&snapshot)
    }

    /// Clear the token and user id from memory and storage. Calling it when
    /// already logged out is a no-op.
    pub fn logout(&self) -> Result<(), SessionError> {
        *self.write() = SessionData::default();
        self.storage.clear()
    }

    /// Log out only if the current token is still `token`. Returns whether
    /// the session was cleared. A newer login is left untouched.
    pub fn logout_if_token(&self, token: &str) -> Result<bool, SessionError> {
        {
            let mut state = self.write();
            if state.token.as_deref() != Some(token) {
                return Ok(false);
            }
            *state = SessionData::default();
        }
        self.storage.clear()?;
        Ok(true)
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.read().user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionData> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionData> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.token.is_some())
            .field("user_id", &state.user_id)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStorage;

    impl SessionStorage for BrokenStorage {
        fn load(&self) -> Result<Option<SessionData>, SessionError> {
            Err(std::io::Error::other("disk gone").into())
        }
        fn save(&self, _data: &SessionData) -> Result<(), SessionError> {
            Err(std::io::Error::other("quota exceeded").into())
        }
        fn clear(&self) -> Result<(), SessionError> {
            Err(std::io::Error::other("disk gone").into())
        }
    }

    #[test]
    fn test_login_then_token_returns_same_token() {
        let store = SessionStore::in_memory();
        for token in ["abc123", "", "token with spaces", "ünïcödé"] {
            store.login(token).unwrap();
            assert_eq!(store.token().as_deref(), Some(token));
        }
    }

    #[test]
    fn test_logout_clears_token() {
        let store = SessionStore::in_memory();
        store.login("abc123").unwrap();
        store.set_user_id(7).unwrap();

        store.logout().unwrap();
        assert_eq!(store.token(), None);
        assert_eq!(store.user_id(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_logout_twice_is_noop() {
        let store = SessionStore::in_memory();
        store.login("abc123").unwrap();

        assert!(store.logout().is_ok());
        assert_eq!(store.token(), None);
        assert!(store.logout().is_ok());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::in_memory();
        let reader = store.clone();
        store.login("shared").unwrap();
        assert_eq!(reader.token().as_deref(), Some("shared"));
        reader.logout().unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_login_keeps_memory_when_storage_fails() {
        let store = SessionStore::new(BrokenStorage);
        assert!(store.login("abc123").is_err());
        assert_eq!(store.token().as_deref(), Some("abc123"));

        assert!(store.logout().is_err());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_new_login_drops_previous_user_id() {
        let store = SessionStore::load(MemoryStorage::with_data(SessionData {
            token: Some("t".to_string()),
            user_id: Some(7),
        }));

        store.login("other").unwrap();
        assert_eq!(store.token().as_deref(), Some("other"));
        assert_eq!(store.user_id(), None);
    }

    #[test]
    fn test_logout_if_token_only_clears_matching_session() {
        let store = SessionStore::in_memory();
        store.login("fresh").unwrap();
        store.set_user_id(7).unwrap();

        assert!(!store.logout_if_token("old").unwrap());
        assert_eq!(store.token().as_deref(), Some("fresh"));
        assert_eq!(store.user_id(), Some(7));

        assert!(store.logout_if_token("fresh").unwrap());
        assert_eq!(store.token(), None);
        assert_eq!(store.user_id(), None);
    }

    #[test]
    fn test_load_with_broken_storage_starts_logged_out() {
        let store = SessionStore::load(BrokenStorage);
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_file_storage_survives_reload() {
        let dir = tempfile::tempdir().unwrap();

        let store = SessionStore::load(FileStorage::new(dir.path().to_path_buf()));
        store.login("persisted").unwrap();
        store.set_user_id(42).unwrap();

        let reloaded = SessionStore::load(FileStorage::new(dir.path().to_path_buf()));
        assert_eq!(reloaded.token().as_deref(), Some("persisted"));
        assert_eq!(reloaded.user_id(), Some(42));

        reloaded.logout().unwrap();
        assert!(!dir.path().join(SESSION_FILE).exists());

        let after_logout = SessionStore::load(FileStorage::new(dir.path().to_path_buf()));
        assert_eq!(after_logout.token(), None);
    }

    #[test]
    fn test_file_storage_clear_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("never-created"));
        assert!(storage.clear().is_ok());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_session_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(matches!(storage.load(), Err(SessionError::Corrupt(_))));
    }

    #[test]
    fn test_memory_storage_with_preset_token() {
        let store = SessionStore::load(MemoryStorage::with_data(SessionData {
            token: Some("preset".to_string()),
            user_id: Some(3),
        }));
        assert!(store.is_authenticated());
        assert_eq!(store.user_id(), Some(3));
    }
}
