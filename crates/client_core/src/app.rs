use std::sync::Arc;

use shared::domain::{Language, OrderId};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    auth_store::AuthStore,
    config::ClientConfig,
    error::{ClientError, ClientResult},
    host::HostContext,
    notify::Notification,
    order_store::OrderStore,
    routes::Route,
    session::SessionStorage,
    transport::ApiTransport,
    views::{OrderDetailsView, OrdersListView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Fresh exchange of host init data.
    Authenticated,
    /// No init data from the host, but a stored session was reused.
    Restored,
    /// Neither worked; only sign-in is possible.
    Unauthenticated,
}

/// Application state shared by every page: one transport, one auth store,
/// one order store, and the current route.
pub struct MiniApp {
    transport: Arc<ApiTransport>,
    auth: Arc<AuthStore>,
    orders: Arc<OrderStore>,
    route: RwLock<Route>,
}

impl MiniApp {
    pub async fn new(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> ClientResult<Self> {
        let transport = Arc::new(ApiTransport::new(config)?);
        let auth = Arc::new(AuthStore::restore(Arc::clone(&transport), storage).await?);
        let orders = Arc::new(OrderStore::new(Arc::clone(&transport)));
        Ok(Self {
            transport,
            auth,
            orders,
            route: RwLock::new(Route::Welcome),
        })
    }

    pub fn transport(&self) -> &Arc<ApiTransport> {
        &self.transport
    }

    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.auth
    }

    pub fn orders(&self) -> &Arc<OrderStore> {
        &self.orders
    }

    /// Host init data always wins; without it a persisted session is reused.
    pub async fn start(&self, host: &HostContext) -> StartupOutcome {
        if host.init_data().is_none() && self.auth.is_authenticated().await {
            info!("no host init data, continuing with stored session");
            return StartupOutcome::Restored;
        }

        match self.auth.init_auth(host).await {
            Ok(()) => StartupOutcome::Authenticated,
            Err(err) => {
                warn!(error = %err, "startup authentication failed");
                StartupOutcome::Unauthenticated
            }
        }
    }

    pub async fn sign_out(&self) -> ClientResult<()> {
        self.orders.reset().await;
        self.auth.logout().await?;
        *self.route.write().await = Route::Welcome;
        Ok(())
    }

    pub async fn change_locale(&self, locale: Language) -> ClientResult<()> {
        if self.auth.set_locale(locale).await {
            Ok(())
        } else {
            Err(ClientError::Validation("sign in to change the language".into()))
        }
    }

    pub async fn route(&self) -> Route {
        *self.route.read().await
    }

    pub async fn navigate(&self, route: Route) {
        info!(path = %route, "navigate");
        *self.route.write().await = route;
    }

    pub async fn navigate_path(&self, path: &str) -> ClientResult<Route> {
        let route = Route::parse(path)
            .ok_or_else(|| ClientError::Validation(format!("unknown page '{path}'")))?;
        self.navigate(route).await;
        Ok(route)
    }

    /// Loads what the orders page needs.
    pub async fn load_orders(&self, view: &OrdersListView) -> ClientResult<()> {
        self.navigate(Route::Orders).await;
        self.orders.fetch_orders(&view.query()).await
    }

    /// Navigates to the detail page and builds its view from a fresh fetch.
    pub async fn load_order(&self, id: OrderId) -> ClientResult<OrderDetailsView> {
        self.navigate(Route::OrderDetails(id)).await;
        let order = self.orders.fetch_order(id).await?;
        Ok(OrderDetailsView::from_order(&order))
    }

    pub async fn open_orders(&self, view: &OrdersListView) -> Result<(), Notification> {
        self.load_orders(view)
            .await
            .map_err(|err| Notification::request_failed(&err))
    }

    pub async fn open_order(&self, route: Route) -> Result<OrderDetailsView, Notification> {
        let Route::OrderDetails(id) = route else {
            let err = ClientError::Validation(format!("'{route}' is not an order page"));
            return Err(Notification::request_failed(&err));
        };
        self.load_order(id)
            .await
            .map_err(|err| Notification::request_failed(&err))
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
