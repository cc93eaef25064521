//! Session stores.
//!
//! [`MemorySessionStore`] keeps the session for the life of the process and
//! is what tests use. [`FileSessionStore`] persists it as JSON so the CLI
//! stays logged in between invocations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::error::{QuizError, Result};
use crate::model::Session;
use crate::traits::SessionStore;

/// In-memory session store. Clones share the same session.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    session: Arc<RwLock<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(Some(session))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// JSON-file session store.
///
/// The file is rewritten through a sibling temp file and a rename, so a crash
/// mid-write leaves either the old session or the new one on disk.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    cached: RwLock<Option<Session>>,
}

impl FileSessionStore {
    /// Open the store at `path`. A missing file means "logged out"; an
    /// unreadable one is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = read_session(&path);
        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn read_session(path: &Path) -> Option<Session> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read session file");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed session file");
            None
        }
    }
}

fn storage_error(path: &Path, e: impl std::fmt::Display) -> QuizError {
    QuizError::Storage(format!("{}: {e}", path.display()))
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        self.cached.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|e| storage_error(&self.path, e))?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| storage_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, e))?;

        debug!(path = %self.path.display(), user_id = %session.user_id, "session saved");
        *cached = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(storage_error(&self.path, e)),
        }
        debug!(path = %self.path.display(), "session cleared");
        *cached = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());
        assert!(store.access_token().is_none());

        store
            .save(&Session::new("u1", "a1").with_refresh_token("r1"))
            .unwrap();
        assert_eq!(store.user_id().as_deref(), Some("u1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));

        store.update_tokens("a2".into(), None).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));

        store.clear().unwrap();
        assert!(store.load().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemorySessionStore::new();
        let other = store.clone();
        store.save(&Session::new("u1", "a1")).unwrap();
        assert_eq!(other.user_id().as_deref(), Some("u1"));
    }

    #[test]
    fn update_tokens_without_session_is_auth_error() {
        let store = MemorySessionStore::new();
        let err = store.update_tokens("a".into(), None).unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path);
        assert!(store.load().is_none());
        store
            .save(&Session::new("u9", "tok").with_refresh_token("ref"))
            .unwrap();
        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let reopened = FileSessionStore::open(&path);
        let session = reopened.load().unwrap();
        assert_eq!(session.user_id, "u9");
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.refresh_token.as_deref(), Some("ref"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"accessToken\""));
        assert!(raw.contains("\"userId\""));
    }

    #[test]
    fn file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::open(&path);
        store.save(&Session::new("u1", "a")).unwrap();

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.load().is_none());
        assert!(FileSessionStore::open(&path).load().is_none());
    }

    #[test]
    fn file_store_ignores_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileSessionStore::open(&path);
        assert!(store.load().is_none());
    }
}
