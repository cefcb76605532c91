use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::protocol::User;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{ClientError, ClientResult};

const APP_DIR_NAME: &str = "song_miniapp";
const SESSION_FILE_NAME: &str = "session.json";

/// The part of the auth state that survives a restart. Loading flags and
/// error text are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

impl PersistedSession {
    pub fn is_usable(&self) -> bool {
        self.is_authenticated && self.token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> ClientResult<Option<PersistedSession>>;
    async fn save(&self, session: &PersistedSession) -> ClientResult<()>;
    async fn clear(&self) -> ClientResult<()>;
}

pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> ClientResult<PathBuf> {
        let base = dirs::data_local_dir()
            .ok_or_else(|| ClientError::Storage("unable to resolve local app data dir".into()))?;
        Ok(base.join(APP_DIR_NAME).join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> ClientResult<Option<PersistedSession>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ClientError::Storage(format!(
                    "failed to read '{}': {err}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                ClientError::Storage(format!(
                    "failed to create session dir '{}': {err}",
                    parent.display()
                ))
            })?;
        }

        let body = serde_json::to_vec_pretty(session)
            .map_err(|err| ClientError::Storage(format!("failed to encode session: {err}")))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(|err| {
            ClientError::Storage(format!("failed to write '{}': {err}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|err| {
            ClientError::Storage(format!("failed to replace '{}': {err}", self.path.display()))
        })
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ClientError::Storage(format!(
                "failed to remove '{}': {err}",
                self.path.display()
            ))),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStorage {
    inner: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStorage {
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> ClientResult<Option<PersistedSession>> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        *self.inner.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        *self.inner.lock().await = None;
        Ok(())
    }
}
