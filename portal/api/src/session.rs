//! # Session
//!
//! The signed-in user and their bearer token, shared by every service adapter.
//!
//! A [`Session`] is a cheap clone handle. Reads go through [`Session::token`] and
//! [`Session::user`]; the only writes are [`Session::sign_in`],
//! [`Session::update_user`] and [`Session::sign_out`], and each write is mirrored to
//! the [`TokenStore`] the session was created with.

use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use models::{AuthToken, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,

    #[serde(default)]
    pub user: Option<User>,
}

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, ApiError>;
    fn save(&self, session: &StoredSession) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

/// JSON file, the console's equivalent of browser storage.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, ApiError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ApiError::Decode(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, session: &StoredSession) -> Result<(), ApiError> {
        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        fs::write(&self.path, raw)?;

        debug!("Session written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<StoredSession>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, ApiError> {
        Ok(self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), ApiError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<Option<StoredSession>>>,
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Loads whatever the store already holds.
    pub fn restore(store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let state = store.load()?;

        if let Some(stored) = &state {
            info!(
                "Restored session for {}",
                stored.user.as_ref().map_or("unknown user", |user| user.email.as_str())
            );
        }

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            store,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(None)),
            store: Arc::new(MemoryTokenStore::default()),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|stored| stored.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.read().as_ref().and_then(|stored| stored.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn sign_in(&self, auth: AuthToken) -> Result<(), ApiError> {
        let stored = StoredSession {
            token: auth.token,
            user: Some(auth.user),
        };
        self.store.save(&stored)?;

        *self.write() = Some(stored);
        Ok(())
    }

    /// Replaces the cached user after a profile change. No-op when signed out.
    pub fn update_user(&self, user: User) -> Result<(), ApiError> {
        let mut state = self.write();

        if let Some(stored) = state.as_mut() {
            stored.user = Some(user);
            self.store.save(stored)?;
        }

        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), ApiError> {
        *self.write() = None;
        self.store.clear()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<StoredSession>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<StoredSession>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
