//! Client state for the song-order mini app: backend transport, the auth
//! and order stores, the creation wizard and the page view models.

pub mod app;
pub mod auth_store;
pub mod config;
pub mod error;
pub mod host;
pub mod notify;
pub mod order_store;
pub mod routes;
pub mod session;
pub mod transport;
pub mod views;
pub mod wizard;

pub use app::{MiniApp, StartupOutcome};
pub use auth_store::{AuthState, AuthStore};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use host::HostContext;
pub use notify::{Notification, NotificationVariant};
pub use order_store::{OrderState, OrderStore};
pub use routes::Route;
pub use session::{FileSessionStorage, MemorySessionStorage, PersistedSession, SessionStorage};
pub use transport::ApiTransport;
pub use wizard::{CreationWizard, SubmitOutcome, WizardStep};

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
pub(crate) mod mock_backend;
