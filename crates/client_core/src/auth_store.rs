use std::sync::Arc;

use shared::{domain::Language, protocol::User};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::{ClientError, ClientResult},
    host::HostContext,
    session::{PersistedSession, SessionStorage},
    transport::ApiTransport,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub error: Option<String>,
}

impl AuthState {
    fn persisted(&self) -> PersistedSession {
        PersistedSession {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated,
        }
    }
}

/// Session identity for the signed-in Telegram user.
pub struct AuthStore {
    transport: Arc<ApiTransport>,
    storage: Arc<dyn SessionStorage>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(transport: Arc<ApiTransport>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            transport,
            storage,
            state: RwLock::new(AuthState::default()),
        }
    }

    /// Rehydrates the persisted session and re-attaches its token to the
    /// transport.
    pub async fn restore(
        transport: Arc<ApiTransport>,
        storage: Arc<dyn SessionStorage>,
    ) -> ClientResult<Self> {
        let store = Self::new(transport, storage);
        if let Some(session) = store.storage.load().await? {
            if session.is_usable() {
                if let Some(token) = &session.token {
                    store.transport.set_token(token.clone()).await;
                }
                let mut state = store.state.write().await;
                state.user = session.user;
                state.token = session.token;
                state.is_authenticated = true;
                info!("restored persisted session");
            }
        }
        Ok(store)
    }

    pub async fn snapshot(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Exchanges the host's init data for a session. A failure leaves the
    /// session cleared and the message recorded.
    pub async fn init_auth(&self, host: &HostContext) -> ClientResult<()> {
        self.begin().await;

        let result = match host.init_data() {
            Some(init_data) => self.transport.verify_telegram(init_data).await,
            None => Err(ClientError::NoInitData),
        };

        match result {
            Ok(response) => {
                self.establish(response.access_token, response.user).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "auth initialization failed");
                self.transport.clear_token().await;
                {
                    let mut state = self.state.write().await;
                    state.user = None;
                    state.token = None;
                    state.is_authenticated = false;
                    state.is_loading = false;
                    state.error = Some(err.to_string());
                }
                self.persist().await;
                Err(err)
            }
        }
    }

    /// Same exchange with explicit init data. On failure the existing
    /// session is kept and only the error is recorded.
    pub async fn login(&self, init_data: &str) -> ClientResult<User> {
        self.begin().await;

        match self.transport.verify_telegram(init_data).await {
            Ok(response) => {
                let user = response.user.clone();
                self.establish(response.access_token, response.user).await;
                Ok(user)
            }
            Err(err) => {
                let mut state = self.state.write().await;
                state.is_loading = false;
                state.error = Some(format!("Login failed: {err}"));
                Err(err)
            }
        }
    }

    /// Drops the session and the attached credential. Safe to call when
    /// already signed out.
    pub async fn logout(&self) -> ClientResult<()> {
        {
            let mut state = self.state.write().await;
            state.user = None;
            state.token = None;
            state.is_authenticated = false;
            state.error = None;
        }
        self.transport.clear_token().await;
        self.storage.clear().await?;
        info!("signed out");
        Ok(())
    }

    pub async fn set_user(&self, user: User) {
        self.state.write().await.user = Some(user);
        self.persist().await;
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.transport.set_token(token.clone()).await;
        {
            let mut state = self.state.write().await;
            state.token = Some(token);
            state.is_authenticated = true;
        }
        self.persist().await;
    }

    /// Locale is the only user field the client may change.
    pub async fn set_locale(&self, locale: Language) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            match state.user.as_mut() {
                Some(user) => {
                    user.locale = locale;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.persist().await;
        }
        changed
    }

    pub async fn set_loading(&self, is_loading: bool) {
        self.state.write().await.is_loading = is_loading;
    }

    pub async fn set_error(&self, error: Option<String>) {
        self.state.write().await.error = error;
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.is_loading = true;
        state.error = None;
    }

    async fn establish(&self, token: String, user: User) {
        self.transport.set_token(token.clone()).await;
        {
            let mut state = self.state.write().await;
            info!(user_id = %user.id, telegram_id = user.telegram_id, "session established");
            state.user = Some(user);
            state.token = Some(token);
            state.is_authenticated = true;
            state.is_loading = false;
            state.error = None;
        }
        self.persist().await;
    }

    async fn persist(&self) {
        let session = self.state.read().await.persisted();
        let result = if session.is_authenticated || session.user.is_some() {
            self.storage.save(&session).await
        } else {
            self.storage.clear().await
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to persist session");
        }
    }
}

#[cfg(test)]
#[path = "tests/auth_store_tests.rs"]
mod tests;
