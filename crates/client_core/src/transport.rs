//! HTTP transport to the song-order backend.
//!
//! Owns the bearer credential: once a token is attached every request
//! carries it until it is cleared again.

use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::OrderId,
    error::ApiError,
    protocol::{
        AuthResponse, LyricsEditRequest, LyricsGenerateRequest, LyricsVersion, Order,
        OrderCreateData, OrderListQuery, OrderListResponse, OrderPatch, TaskHandle,
        TaskResponse, TelegramAuthRequest,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
};

pub struct ApiTransport {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let parsed = Url::parse(config.api_base_url.trim()).map_err(|err| {
            ClientError::Config(format!("invalid api base url '{}': {err}", config.api_base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "api base url must be http(s), got '{}'",
                parsed.scheme()
            )));
        }

        let http = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "backend request");
        let mut request = self.http.request(method, self.url(path));
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        request
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.request(Method::GET, path).await.send().await?;
        Self::decode(path, response).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .request(Method::GET, path)
            .await
            .query(query)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .request(Method::POST, path)
            .await
            .json(body)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.request(Method::POST, path).await.send().await?;
        Self::decode(path, response).await
    }

    /// POST without a body whose response payload is not needed.
    pub async fn post_unit(&self, path: &str) -> ClientResult<()> {
        let response = self.request(Method::POST, path).await.send().await?;
        Self::check(path, response).await.map(|_| ())
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .request(Method::PATCH, path)
            .await
            .json(body)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn check(path: &str, response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let fallback = status.canonical_reason().unwrap_or("request failed");
        let err = ApiError::from_body(status.as_u16(), &body, fallback);
        warn!(path, status = status.as_u16(), message = %err.message, "backend request failed");
        Err(err.into())
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> ClientResult<T> {
        let response = Self::check(path, response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::InvalidResponse(format!("{path}: {err}")))
    }

    // ========== Auth API ==========

    pub async fn verify_telegram(&self, init_data: &str) -> ClientResult<AuthResponse> {
        self.post(
            "/auth/telegram/verify",
            &TelegramAuthRequest {
                init_data: init_data.to_string(),
            },
        )
        .await
    }

    // ========== Orders API ==========

    pub async fn list_orders(&self, query: &OrderListQuery) -> ClientResult<OrderListResponse> {
        self.get_with_query("/orders", query).await
    }

    pub async fn create_order(&self, draft: &OrderCreateData) -> ClientResult<Order> {
        self.post("/orders", draft).await
    }

    pub async fn update_order(&self, id: OrderId, patch: &OrderPatch) -> ClientResult<Order> {
        self.patch(&format!("/orders/{id}"), patch).await
    }

    pub async fn get_order(&self, id: OrderId) -> ClientResult<Order> {
        self.get(&format!("/orders/{id}")).await
    }

    pub async fn approve_order(&self, id: OrderId) -> ClientResult<()> {
        self.post_unit(&format!("/orders/{id}/approve")).await
    }

    pub async fn generate_lyrics(&self, id: OrderId, regenerate: bool) -> ClientResult<TaskHandle> {
        let response: TaskResponse = self
            .post(
                &format!("/orders/{id}/lyrics/generate"),
                &LyricsGenerateRequest { regenerate },
            )
            .await?;
        Ok(response.task_id)
    }

    pub async fn submit_lyrics_edit(&self, id: OrderId, text: &str) -> ClientResult<LyricsVersion> {
        self.post(
            &format!("/orders/{id}/lyrics/submit_edit"),
            &LyricsEditRequest {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn generate_audio(&self, id: OrderId) -> ClientResult<TaskHandle> {
        let response: TaskResponse = self
            .post_empty(&format!("/orders/{id}/generate_audio"))
            .await?;
        Ok(response.task_id)
    }

    pub async fn create_payment(&self, id: OrderId) -> ClientResult<serde_json::Value> {
        self.post_empty(&format!("/orders/{id}/pay")).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
