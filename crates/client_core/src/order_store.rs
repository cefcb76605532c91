//! Local mirror of the user's orders.
//!
//! Every operation performs exactly one backend call. Writes that the
//! backend does not echo back (approve, lyrics edit) are applied to the
//! local copy as predicted transitions; the next `fetch_order` or
//! `fetch_orders` replaces them with the backend's record.

use std::sync::Arc;

use shared::{
    domain::{OrderId, OrderStatus},
    protocol::{LyricsVersion, Order, OrderCreateData, OrderListQuery, OrderPatch, TaskHandle},
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    transport::ApiTransport,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderState {
    pub orders: Vec<Order>,
    pub current_order: Option<Order>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct OrderStore {
    transport: Arc<ApiTransport>,
    state: RwLock<OrderState>,
}

impl OrderStore {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self {
            transport,
            state: RwLock::new(OrderState::default()),
        }
    }

    pub async fn snapshot(&self) -> OrderState {
        self.state.read().await.clone()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    pub async fn current_order(&self) -> Option<Order> {
        self.state.read().await.current_order.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Replaces the whole list with the returned page.
    pub async fn fetch_orders(&self, query: &OrderListQuery) -> ClientResult<()> {
        self.begin().await;
        match self.transport.list_orders(query).await {
            Ok(page) => {
                debug!(count = page.items.len(), total = page.total, "fetched orders");
                let mut state = self.state.write().await;
                state.orders = page.items;
                state.is_loading = false;
                Ok(())
            }
            Err(err) => Err(self.fail("Failed to fetch orders", err).await),
        }
    }

    pub async fn create_order(&self, draft: &OrderCreateData) -> ClientResult<Order> {
        self.begin().await;
        match self.transport.create_order(draft).await {
            Ok(order) => {
                info!(order_id = %order.id, status = %order.status, "order created");
                let mut state = self.state.write().await;
                state.orders.insert(0, order.clone());
                state.current_order = Some(order.clone());
                state.is_loading = false;
                Ok(order)
            }
            Err(err) => Err(self.fail("Failed to create order", err).await),
        }
    }

    pub async fn update_order(&self, id: OrderId, patch: &OrderPatch) -> ClientResult<Order> {
        self.begin().await;
        match self.transport.update_order(id, patch).await {
            Ok(updated) => {
                let mut state = self.state.write().await;
                for order in state.orders.iter_mut().filter(|order| order.id == id) {
                    *order = updated.clone();
                }
                if state.current_order.as_ref().is_some_and(|order| order.id == id) {
                    state.current_order = Some(updated.clone());
                }
                state.is_loading = false;
                Ok(updated)
            }
            Err(err) => Err(self.fail("Failed to update order", err).await),
        }
    }

    pub async fn fetch_order(&self, id: OrderId) -> ClientResult<Order> {
        self.begin().await;
        match self.transport.get_order(id).await {
            Ok(order) => {
                let mut state = self.state.write().await;
                state.current_order = Some(order.clone());
                state.is_loading = false;
                Ok(order)
            }
            Err(err) => Err(self.fail("Failed to fetch order", err).await),
        }
    }

    /// Marks the order approved locally as soon as the backend accepts the
    /// call, without re-fetching it.
    pub async fn approve_order(&self, id: OrderId) -> ClientResult<()> {
        self.begin().await;
        match self.transport.approve_order(id).await {
            Ok(()) => {
                info!(order_id = %id, "order approved");
                let mut state = self.state.write().await;
                for order in state.orders.iter_mut().filter(|order| order.id == id) {
                    order.status = OrderStatus::Approved;
                }
                if let Some(order) = state.current_order.as_mut().filter(|order| order.id == id) {
                    order.status = OrderStatus::Approved;
                }
                state.is_loading = false;
                Ok(())
            }
            Err(err) => Err(self.fail("Failed to approve order", err).await),
        }
    }

    /// Starts generation on the backend. Progress is only visible through a
    /// later fetch.
    pub async fn generate_lyrics(&self, id: OrderId, regenerate: bool) -> ClientResult<TaskHandle> {
        self.begin().await;
        match self.transport.generate_lyrics(id, regenerate).await {
            Ok(task) => {
                info!(order_id = %id, regenerate, task_id = %task, "lyrics generation started");
                self.finish().await;
                Ok(task)
            }
            Err(err) => Err(self.fail("Failed to generate lyrics", err).await),
        }
    }

    pub async fn submit_lyrics_edit(&self, id: OrderId, text: &str) -> ClientResult<LyricsVersion> {
        self.begin().await;
        if text.trim().is_empty() {
            let err = ClientError::Validation("lyrics text must not be empty".into());
            return Err(self.fail("Failed to submit lyrics edit", err).await);
        }

        match self.transport.submit_lyrics_edit(id, text).await {
            Ok(lyrics) => {
                info!(order_id = %id, version = lyrics.version, "lyrics edit submitted");
                let mut state = self.state.write().await;
                if let Some(order) = state.current_order.as_mut().filter(|order| order.id == id) {
                    order.lyrics_versions.push(lyrics.clone());
                    order.status = OrderStatus::LyricsReady;
                }
                state.is_loading = false;
                Ok(lyrics)
            }
            Err(err) => Err(self.fail("Failed to submit lyrics edit", err).await),
        }
    }

    pub async fn generate_audio(&self, id: OrderId) -> ClientResult<TaskHandle> {
        self.begin().await;
        match self.transport.generate_audio(id).await {
            Ok(task) => {
                info!(order_id = %id, task_id = %task, "audio generation started");
                self.finish().await;
                Ok(task)
            }
            Err(err) => Err(self.fail("Failed to generate audio", err).await),
        }
    }

    /// Returns the backend's payment payload untouched.
    pub async fn create_payment(&self, id: OrderId) -> ClientResult<serde_json::Value> {
        self.begin().await;
        match self.transport.create_payment(id).await {
            Ok(payload) => {
                self.finish().await;
                Ok(payload)
            }
            Err(err) => Err(self.fail("Failed to create payment", err).await),
        }
    }

    pub async fn set_current_order(&self, order: Option<Order>) {
        self.state.write().await.current_order = order;
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

    /// Drops everything cached for the signed-in user.
    pub async fn reset(&self) {
        *self.state.write().await = OrderState::default();
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.is_loading = true;
        state.error = None;
    }

    async fn finish(&self) {
        self.state.write().await.is_loading = false;
    }

    async fn fail(&self, context: &str, err: ClientError) -> ClientError {
        warn!(error = %err, "{context}");
        let mut state = self.state.write().await;
        state.is_loading = false;
        state.error = Some(format!("{context}: {err}"));
        err
    }
}

#[cfg(test)]
#[path = "tests/order_store_tests.rs"]
mod tests;
