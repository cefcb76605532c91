//! View models for the mini app pages. They read store state, derive what a
//! page shows, and dispatch store operations for page actions.

use shared::{
    domain::{AudioKind, AudioStatus, Language, OrderId, OrderStatus},
    protocol::{AudioAsset, Order, OrderListQuery, User},
};

use crate::{
    auth_store::AuthState, error::ClientResult, notify::Notification, order_store::OrderStore,
    routes::Route,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Neutral,
    Info,
    Success,
    Warning,
    Accent,
    Progress,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub status: OrderStatus,
    pub tone: BadgeTone,
}

impl StatusBadge {
    pub fn for_status(status: OrderStatus) -> Self {
        let tone = match status {
            OrderStatus::Draft => BadgeTone::Neutral,
            OrderStatus::PendingLyrics => BadgeTone::Info,
            OrderStatus::LyricsReady | OrderStatus::Delivered => BadgeTone::Success,
            OrderStatus::UserEditing => BadgeTone::Warning,
            OrderStatus::Approved => BadgeTone::Accent,
            OrderStatus::Generating => BadgeTone::Progress,
            OrderStatus::Canceled => BadgeTone::Danger,
        };
        Self { status, tone }
    }

    pub fn label(&self) -> &'static str {
        self.status.as_str()
    }
}

pub fn order_title(order: &Order) -> String {
    match order.recipient.as_deref().map(str::trim) {
        Some(recipient) if !recipient.is_empty() => format!("Song for {recipient}"),
        _ => "New song".to_string(),
    }
}

pub fn order_meta(order: &Order) -> String {
    [&order.occasion, &order.genre, &order.mood]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" • ")
}

// ========== Welcome ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeView {
    pub greeting: String,
    pub signed_in: bool,
    pub links: Vec<Route>,
}

impl WelcomeView {
    pub fn from_auth(auth: &AuthState) -> Self {
        let greeting = match auth.user.as_ref() {
            Some(user) => format!("Hi, {}! Let's make a song.", user.display_name()),
            None => "Hi! Let's make a song.".to_string(),
        };
        Self {
            greeting,
            signed_in: auth.is_authenticated,
            links: vec![Route::Create, Route::Orders, Route::Profile],
        }
    }
}

// ========== Orders list ==========

/// Filter tabs on the orders page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Draft,
    Pending,
    Ready,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Draft,
        StatusFilter::Pending,
        StatusFilter::Ready,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Draft => "draft",
            StatusFilter::Pending => "pending",
            StatusFilter::Ready => "ready",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.key().eq_ignore_ascii_case(raw.trim()))
    }

    /// Backend status the tab filters on; `All` sends none.
    pub fn backend_status(self) -> Option<OrderStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Draft => Some(OrderStatus::Draft),
            StatusFilter::Pending => Some(OrderStatus::PendingLyrics),
            StatusFilter::Ready => Some(OrderStatus::LyricsReady),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: OrderId,
    pub title: String,
    pub meta: String,
    pub badge: StatusBadge,
    pub created: String,
    pub lyrics_versions: usize,
    pub route: Route,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersListView {
    pub filter: StatusFilter,
    pub search: String,
}

impl OrdersListView {
    pub fn new(filter: StatusFilter, search: impl Into<String>) -> Self {
        Self {
            filter,
            search: search.into(),
        }
    }

    pub fn query(&self) -> OrderListQuery {
        OrderListQuery {
            status: self.filter.backend_status().map(|status| status.as_str().to_string()),
            ..OrderListQuery::default()
        }
    }

    pub async fn load(&self, orders: &OrderStore) -> Result<(), Notification> {
        orders
            .fetch_orders(&self.query())
            .await
            .map_err(|err| Notification::request_failed(&err))
    }

    /// Search is applied locally over recipient, occasion and genre.
    pub fn rows(&self, orders: &[Order]) -> Vec<OrderRow> {
        let needle = self.search.trim().to_lowercase();
        orders
            .iter()
            .filter(|order| {
                needle.is_empty()
                    || [&order.recipient, &order.occasion, &order.genre]
                        .into_iter()
                        .flatten()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .map(|order| OrderRow {
                id: order.id,
                title: order_title(order),
                meta: order_meta(order),
                badge: StatusBadge::for_status(order.status),
                created: order.created_at.format("%d %b %Y").to_string(),
                lyrics_versions: order.lyrics_versions.len(),
                route: Route::OrderDetails(order.id),
            })
            .collect()
    }

    pub fn empty_message(&self) -> &'static str {
        if !self.search.trim().is_empty() || self.filter != StatusFilter::All {
            "No orders found"
        } else {
            "You have no orders yet. Create your first song!"
        }
    }
}

// ========== Order details ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    GenerateLyrics,
    EditLyrics,
    RegenerateLyrics,
    Approve,
    GenerateAudio,
}

impl OrderAction {
    pub fn label(self) -> &'static str {
        match self {
            OrderAction::GenerateLyrics => "Generate lyrics",
            OrderAction::EditLyrics => "Edit",
            OrderAction::RegenerateLyrics => "Regenerate",
            OrderAction::Approve => "Approve",
            OrderAction::GenerateAudio => "Create audio",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LyricsPanel {
    Latest { version: u32, created: String, text: String },
    Placeholder(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioRow {
    pub kind: &'static str,
    pub status: &'static str,
    pub duration: Option<String>,
    pub url: Option<String>,
    pub playable: bool,
}

impl AudioRow {
    fn from_asset(asset: &AudioAsset) -> Self {
        Self {
            kind: match asset.kind {
                AudioKind::Preview => "Preview",
                AudioKind::Full => "Full version",
            },
            status: match asset.status {
                AudioStatus::Queued => "queued",
                AudioStatus::Generating => "generating",
                AudioStatus::Ready => "ready",
                AudioStatus::Failed => "failed",
            },
            duration: asset
                .duration_sec
                .map(|seconds| format!("{}s", seconds.round() as i64)),
            url: asset.url.clone(),
            playable: asset.is_playable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetailsView {
    pub id: OrderId,
    pub title: String,
    pub meta: String,
    pub badge: StatusBadge,
    pub language: Language,
    pub created: String,
    pub notes: Option<String>,
    pub lyrics: LyricsPanel,
    pub actions: Vec<OrderAction>,
    pub audio: Vec<AudioRow>,
}

impl OrderDetailsView {
    pub fn from_order(order: &Order) -> Self {
        let latest = order.latest_lyrics();
        let lyrics = match latest {
            Some(lyrics) => LyricsPanel::Latest {
                version: lyrics.version,
                created: lyrics.created_at.format("%d.%m.%Y %H:%M").to_string(),
                text: lyrics.text.clone(),
            },
            None if order.status == OrderStatus::PendingLyrics => {
                LyricsPanel::Placeholder("Generating lyrics...")
            }
            None => LyricsPanel::Placeholder("Lyrics not created yet"),
        };

        Self {
            id: order.id,
            title: order_title(order),
            meta: order_meta(order),
            badge: StatusBadge::for_status(order.status),
            language: order.language,
            created: order.created_at.format("%d.%m.%Y").to_string(),
            notes: order.notes.clone().filter(|notes| !notes.trim().is_empty()),
            lyrics,
            actions: available_actions(order),
            audio: order.audio_assets.iter().map(AudioRow::from_asset).collect(),
        }
    }

    pub fn allows(&self, action: OrderAction) -> bool {
        self.actions.contains(&action)
    }
}

pub fn available_actions(order: &Order) -> Vec<OrderAction> {
    let mut actions = Vec::new();
    match order.status {
        OrderStatus::Draft => actions.push(OrderAction::GenerateLyrics),
        OrderStatus::LyricsReady if order.latest_lyrics().is_some() => {
            actions.extend([
                OrderAction::EditLyrics,
                OrderAction::RegenerateLyrics,
                OrderAction::Approve,
            ]);
        }
        OrderStatus::Approved if order.audio_assets.is_empty() => {
            actions.push(OrderAction::GenerateAudio)
        }
        _ => {}
    }
    actions
}

/// A page action that reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderCommand {
    GenerateLyrics,
    RegenerateLyrics,
    SubmitLyricsEdit(String),
    Approve,
    GenerateAudio,
    Pay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub notification: Notification,
    /// Payment payload, only set for `Pay`.
    pub payload: Option<serde_json::Value>,
}

/// Runs a details-page action and turns the result into a toast.
pub async fn run_command(orders: &OrderStore, id: OrderId, command: OrderCommand) -> CommandOutcome {
    let result: ClientResult<(Notification, Option<serde_json::Value>)> = match command {
        OrderCommand::GenerateLyrics => orders.generate_lyrics(id, false).await.map(|_| {
            (
                Notification::success("Lyrics requested", "Lyrics generation has started..."),
                None,
            )
        }),
        OrderCommand::RegenerateLyrics => orders.generate_lyrics(id, true).await.map(|_| {
            (
                Notification::success("Lyrics requested", "Lyrics regeneration has started..."),
                None,
            )
        }),
        OrderCommand::SubmitLyricsEdit(text) => {
            orders.submit_lyrics_edit(id, &text).await.map(|lyrics| {
                (
                    Notification::success(
                        "Lyrics saved",
                        format!("Saved as version {}", lyrics.version),
                    ),
                    None,
                )
            })
        }
        OrderCommand::Approve => orders
            .approve_order(id)
            .await
            .map(|_| (Notification::success("Order approved", "The lyrics are approved"), None)),
        OrderCommand::GenerateAudio => orders.generate_audio(id).await.map(|_| {
            (
                Notification::success("Audio generation", "Creating the audio version..."),
                None,
            )
        }),
        OrderCommand::Pay => orders.create_payment(id).await.map(|payload| {
            (
                Notification::success("Payment", "Payment has been created"),
                Some(payload),
            )
        }),
    };

    match result {
        Ok((notification, payload)) => CommandOutcome {
            notification,
            payload,
        },
        Err(err) => CommandOutcome {
            notification: Notification::request_failed(&err),
            payload: None,
        },
    }
}

// ========== Profile ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub fields: Vec<(&'static str, String)>,
    pub locale: Option<Language>,
}

impl ProfileView {
    pub fn from_user(user: Option<&User>) -> Self {
        let Some(user) = user else {
            return Self {
                name: "Guest".to_string(),
                fields: Vec::new(),
                locale: None,
            };
        };

        let mut fields = vec![("Telegram ID", user.telegram_id.to_string())];
        if let Some(username) = &user.username {
            fields.push(("Username", format!("@{username}")));
        }
        if let Some(phone) = &user.phone {
            fields.push(("Phone", phone.clone()));
        }
        fields.push(("Language", user.locale.display_name().to_string()));
        fields.push(("Member since", user.created_at.format("%d.%m.%Y").to_string()));

        Self {
            name: user.display_name(),
            fields,
            locale: Some(user.locale),
        }
    }
}

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod tests;
