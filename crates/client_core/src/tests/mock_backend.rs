//! In-process stand-in for the song-order backend used by the store tests.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use shared::{
    domain::{Language, LyricsStatus, LyricsVersionId, OrderId, OrderStatus, PaymentStatus},
    protocol::{
        LyricsEditRequest, LyricsGenerateRequest, LyricsVersion, Order, OrderCreateData,
        OrderListQuery, OrderListResponse, OrderPatch, TelegramAuthRequest, User,
    },
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{config::ClientConfig, transport::ApiTransport};

pub(crate) const VALID_INIT_DATA: &str =
    "query_id=AAH&user=%7B%22id%22%3A777%2C%22first_name%22%3A%22Anna%22%7D&auth_date=1700000000&hash=good";
pub(crate) const FIRST_ORDER_ID: i64 = 42;

type Shared = Arc<Mutex<BackendState>>;

pub(crate) struct BackendState {
    pub next_order_id: i64,
    pub next_lyrics_id: i64,
    pub orders: BTreeMap<i64, Order>,
    pub tokens: HashSet<String>,
    pub issued_tokens: u32,
    pub requests: Vec<String>,
    pub auth_headers: Vec<Option<String>>,
    pub list_delay: Option<Duration>,
    pub fail_next: Option<(StatusCode, String)>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            next_order_id: FIRST_ORDER_ID,
            next_lyrics_id: 1,
            orders: BTreeMap::new(),
            tokens: HashSet::new(),
            issued_tokens: 0,
            requests: Vec::new(),
            auth_headers: Vec::new(),
            list_delay: None,
            fail_next: None,
        }
    }
}

pub(crate) struct MockBackend {
    pub url: String,
    pub state: Shared,
}

impl MockBackend {
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.url.clone()).with_timeout(Duration::from_secs(5))
    }

    pub fn transport(&self) -> Arc<ApiTransport> {
        Arc::new(ApiTransport::new(&self.config()).expect("transport"))
    }

    /// A transport that already carries a token the backend accepts.
    pub async fn signed_in_transport(&self) -> Arc<ApiTransport> {
        let transport = self.transport();
        let token = "seeded-token".to_string();
        self.state.lock().await.tokens.insert(token.clone());
        transport.set_token(token).await;
        transport
    }

    pub async fn insert_order(&self, order: Order) {
        self.state.lock().await.orders.insert(order.id.0, order);
    }

    pub async fn order(&self, id: i64) -> Option<Order> {
        self.state.lock().await.orders.get(&id).cloned()
    }

    pub async fn requests(&self) -> Vec<String> {
        self.state.lock().await.requests.clone()
    }

    pub async fn last_auth_header(&self) -> Option<String> {
        self.state.lock().await.auth_headers.last().cloned().flatten()
    }

    pub async fn fail_next(&self, status: StatusCode, detail: &str) {
        self.state.lock().await.fail_next = Some((status, detail.to_string()));
    }

    pub async fn delay_listing(&self, delay: Duration) {
        self.state.lock().await.list_delay = Some(delay);
    }
}

pub(crate) fn sample_user() -> User {
    User {
        id: shared::domain::UserId(1),
        telegram_id: 777,
        username: Some("anna_k".into()),
        first_name: Some("Anna".into()),
        last_name: None,
        phone: None,
        locale: Language::Ru,
        created_at: Utc::now(),
    }
}

pub(crate) fn sample_order(id: i64, status: OrderStatus) -> Order {
    let now = Utc::now();
    Order {
        id: OrderId(id),
        status,
        language: Language::Ru,
        genre: Some("pop".into()),
        mood: None,
        tempo: None,
        occasion: Some("birthday".into()),
        recipient: Some("Anna".into()),
        notes: None,
        price: Some(19.9),
        currency: "USD".into(),
        payment_status: PaymentStatus::None,
        created_at: now,
        updated_at: now,
        lyrics_versions: Vec::new(),
        audio_assets: Vec::new(),
    }
}

pub(crate) fn sample_lyrics(id: i64, version: u32, text: &str) -> LyricsVersion {
    LyricsVersion {
        id: LyricsVersionId(id),
        version,
        text: text.to_string(),
        status: LyricsStatus::Ready,
        created_at: Utc::now(),
    }
}

pub(crate) async fn spawn_backend() -> MockBackend {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state: Shared = Arc::new(Mutex::new(BackendState::default()));

    let app = Router::new()
        .route("/api/v1/auth/telegram/verify", post(verify))
        .route("/api/v1/orders", get(list_orders).post(create_order))
        .route("/api/v1/orders/:id", get(get_order).patch(update_order))
        .route("/api/v1/orders/:id/approve", post(approve_order))
        .route("/api/v1/orders/:id/lyrics/generate", post(generate_lyrics))
        .route("/api/v1/orders/:id/lyrics/submit_edit", post(submit_lyrics_edit))
        .route("/api/v1/orders/:id/generate_audio", post(generate_audio))
        .route("/api/v1/orders/:id/pay", post(create_payment))
        .with_state(Arc::clone(&state));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend {
        url: format!("http://{addr}/api/v1"),
        state,
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "Order not found")
}

/// Records the call, applies an injected failure, and checks the bearer
/// token.
async fn authorize(state: &Shared, headers: &HeaderMap, call: String) -> Result<(), Response> {
    let mut guard = state.lock().await;
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    guard.requests.push(call);
    guard.auth_headers.push(header.clone());

    if let Some((status, message)) = guard.fail_next.take() {
        return Err(detail(status, &message));
    }

    let token = header.as_deref().and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token) if guard.tokens.contains(token) => Ok(()),
        _ => Err(detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")),
    }
}

async fn verify(
    State(state): State<Shared>,
    Json(body): Json<TelegramAuthRequest>,
) -> Result<Json<Value>, Response> {
    let mut guard = state.lock().await;
    guard.requests.push("POST /auth/telegram/verify".into());
    if !body.init_data.ends_with("hash=good") {
        return Err(detail(
            StatusCode::UNAUTHORIZED,
            "Invalid Telegram authentication data",
        ));
    }

    guard.issued_tokens += 1;
    let token = format!("token-{}", guard.issued_tokens);
    guard.tokens.insert(token.clone());
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": {
            "id": 1,
            "telegram_id": 777,
            "username": "anna_k",
            "first_name": "Anna",
            "locale": "ru",
            "created_at": "2024-05-01T10:15:30.123456"
        }
    })))
}

async fn list_orders(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>, Response> {
    let call = match &query.status {
        Some(status) => format!("GET /orders?status={status}"),
        None => "GET /orders".to_string(),
    };
    authorize(&state, &headers, call).await?;

    let delay = state.lock().await.list_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let guard = state.lock().await;
    let skip = query.skip.unwrap_or(0) as usize;
    let limit = query.limit.unwrap_or(20) as usize;
    let matching: Vec<Order> = guard
        .orders
        .values()
        .rev()
        .filter(|order| {
            query
                .status
                .as_deref()
                .map_or(true, |status| order.status.as_str() == status)
        })
        .cloned()
        .collect();
    let total = matching.len() as u64;
    let items = matching.into_iter().skip(skip).take(limit).collect();

    Ok(Json(OrderListResponse {
        items,
        total,
        skip: skip as u32,
        limit: limit as u32,
    }))
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(draft): Json<OrderCreateData>,
) -> Result<Json<Order>, Response> {
    authorize(&state, &headers, "POST /orders".into()).await?;

    let mut guard = state.lock().await;
    let id = guard.next_order_id;
    guard.next_order_id += 1;

    let mut order = sample_order(id, OrderStatus::Draft);
    order.language = draft.language;
    order.genre = draft.genre;
    order.mood = draft.mood;
    order.tempo = draft.tempo;
    order.occasion = draft.occasion;
    order.recipient = draft.recipient;
    order.notes = draft.notes;
    order.price = None;
    guard.orders.insert(id, order.clone());
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Order>, Response> {
    authorize(&state, &headers, format!("GET /orders/{id}")).await?;
    let guard = state.lock().await;
    guard.orders.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<Order>, Response> {
    authorize(&state, &headers, format!("PATCH /orders/{id}")).await?;
    let mut guard = state.lock().await;
    let order = guard.orders.get_mut(&id).ok_or_else(not_found)?;
    if let Some(genre) = patch.genre {
        order.genre = Some(genre);
    }
    if let Some(mood) = patch.mood {
        order.mood = Some(mood);
    }
    if let Some(tempo) = patch.tempo {
        order.tempo = Some(tempo);
    }
    if let Some(occasion) = patch.occasion {
        order.occasion = Some(occasion);
    }
    if let Some(recipient) = patch.recipient {
        order.recipient = Some(recipient);
    }
    if let Some(notes) = patch.notes {
        order.notes = Some(notes);
    }
    order.updated_at = Utc::now();
    Ok(Json(order.clone()))
}

async fn approve_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Order>, Response> {
    authorize(&state, &headers, format!("POST /orders/{id}/approve")).await?;
    let mut guard = state.lock().await;
    let order = guard.orders.get_mut(&id).ok_or_else(not_found)?;
    if order.status != OrderStatus::LyricsReady {
        return Err(detail(
            StatusCode::BAD_REQUEST,
            "Order cannot be approved in current status",
        ));
    }
    order.status = OrderStatus::Approved;
    Ok(Json(order.clone()))
}

async fn generate_lyrics(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<LyricsGenerateRequest>,
) -> Result<Json<Value>, Response> {
    let call = format!("POST /orders/{id}/lyrics/generate regenerate={}", body.regenerate);
    authorize(&state, &headers, call).await?;
    let mut guard = state.lock().await;
    let order = guard.orders.get_mut(&id).ok_or_else(not_found)?;
    order.status = OrderStatus::PendingLyrics;
    Ok(Json(json!({
        "task_id": format!("lyrics-{id}"),
        "message": "Lyrics generation started"
    })))
}

async fn submit_lyrics_edit(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<LyricsEditRequest>,
) -> Result<Json<LyricsVersion>, Response> {
    authorize(&state, &headers, format!("POST /orders/{id}/lyrics/submit_edit")).await?;
    let mut guard = state.lock().await;
    let lyrics_id = guard.next_lyrics_id;
    let order = guard.orders.get_mut(&id).ok_or_else(not_found)?;
    let lyrics = sample_lyrics(lyrics_id, order.next_lyrics_version(), &body.text);
    order.lyrics_versions.push(lyrics.clone());
    order.status = OrderStatus::LyricsReady;
    guard.next_lyrics_id += 1;
    Ok(Json(lyrics))
}

async fn generate_audio(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Response> {
    authorize(&state, &headers, format!("POST /orders/{id}/generate_audio")).await?;
    let mut guard = state.lock().await;
    let order = guard.orders.get_mut(&id).ok_or_else(not_found)?;
    order.status = OrderStatus::Generating;
    Ok(Json(json!({
        "task_id": format!("audio-{id}"),
        "message": "Audio generation started"
    })))
}

async fn create_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Response> {
    authorize(&state, &headers, format!("POST /orders/{id}/pay")).await?;
    let guard = state.lock().await;
    let order = guard.orders.get(&id).ok_or_else(not_found)?;
    Ok(Json(json!({
        "id": 1,
        "order_id": id,
        "provider": "stripe",
        "amount": order.price.unwrap_or(0.0),
        "currency": order.currency,
        "status": "pending"
    })))
}
