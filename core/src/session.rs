//! Bearer-token storage.
//!
//! The client never reads a global: it is handed an `Arc<dyn TokenStore>` at
//! construction and asks it for the current token on every authenticated
//! call, so a login or logout elsewhere is seen by the next request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::ApiError;

/// Fixed key the token is stored under.
pub const TOKEN_KEY: &str = "token";

pub trait TokenStore: Send + Sync {
    /// Current token, or `None` when signed out.
    fn token(&self) -> Option<String>;

    fn set_token(&self, token: &str) -> Result<(), ApiError>;

    fn clear(&self) -> Result<(), ApiError>;
}

/// Process-local token store. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: &str) -> Result<(), ApiError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Token store backed by a small JSON file of string keys, so a session
/// survives restarts. Other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable token file");
                BTreeMap::new()
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), ApiError> {
        let raw = serde_json::to_string_pretty(entries).map_err(|e| ApiError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| ApiError::Storage(e.to_string()))
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        self.load().remove(TOKEN_KEY)
    }

    fn set_token(&self, token: &str) -> Result<(), ApiError> {
        let mut entries = self.load();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save(&entries)
    }

    fn clear(&self) -> Result<(), ApiError> {
        let mut entries = self.load();
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}
