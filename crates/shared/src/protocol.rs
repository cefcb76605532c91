use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AudioAssetId, AudioKind, AudioStatus, Language, LyricsStatus, LyricsVersionId, OrderId,
    OrderStatus, PaymentStatus, UserId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub telegram_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub locale: Language,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name, &self.username) {
            (Some(first), Some(last), _) => format!("{first} {last}"),
            (Some(first), None, _) => first.clone(),
            (None, _, Some(username)) => format!("@{username}"),
            _ => format!("user {}", self.telegram_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsVersion {
    pub id: LyricsVersionId,
    pub version: u32,
    pub text: String,
    pub status: LyricsStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub id: AudioAssetId,
    pub kind: AudioKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    pub status: AudioStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl AudioAsset {
    pub fn is_playable(&self) -> bool {
        self.status == AudioStatus::Ready && self.url.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        with = "decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub lyrics_versions: Vec<LyricsVersion>,
    #[serde(default)]
    pub audio_assets: Vec<AudioAsset>,
}

impl Order {
    /// Highest-numbered lyrics version. Versions are append-only, so this is
    /// normally the last element, but the number is authoritative.
    pub fn latest_lyrics(&self) -> Option<&LyricsVersion> {
        self.lyrics_versions.iter().max_by_key(|lyrics| lyrics.version)
    }

    pub fn next_lyrics_version(&self) -> u32 {
        self.latest_lyrics().map_or(1, |lyrics| lyrics.version + 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderCreateData {
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update for `PATCH /orders/{id}`. Language is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self == &OrderPatch::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub items: Vec<Order>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramAuthRequest {
    pub init_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsGenerateRequest {
    pub regenerate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsEditRequest {
    pub text: String,
}

/// Opaque id of a backend generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(pub String);

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: TaskHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Accepts RFC 3339 timestamps as well as the offset-less form the backend
/// emits for UTC values.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            return Some(value.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Decimal amounts arrive either as JSON numbers or as strings.
mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_f64(*value),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(value)) => Ok(Some(value)),
            Some(Raw::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid decimal '{text}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    fn order_json() -> serde_json::Value {
        json!({
            "id": 42,
            "status": "lyrics_ready",
            "language": "ru",
            "genre": "pop",
            "occasion": "birthday",
            "recipient": "Anna",
            "price": "19.90",
            "currency": "USD",
            "payment_status": "none",
            "created_at": "2024-05-01T10:15:30.123456",
            "updated_at": "2024-05-01T10:16:00+00:00",
            "lyrics_versions": [
                {"id": 1, "version": 1, "text": "first", "status": "ready", "created_at": "2024-05-01T10:15:31"},
                {"id": 2, "version": 2, "text": "second", "status": "draft", "created_at": "2024-05-01T10:15:32"}
            ]
        })
    }

    #[test]
    fn decodes_backend_order_with_naive_timestamps_and_string_price() {
        let order: Order = serde_json::from_value(order_json()).expect("decode order");
        assert_eq!(order.id, OrderId(42));
        assert_eq!(order.status, OrderStatus::LyricsReady);
        assert_eq!(order.price, Some(19.9));
        assert_eq!(order.created_at.year(), 2024);
        assert_eq!(order.created_at.second(), 30);
        assert!(order.audio_assets.is_empty());
        assert_eq!(order.latest_lyrics().map(|l| l.text.as_str()), Some("second"));
        assert_eq!(order.next_lyrics_version(), 3);
    }

    #[test]
    fn numeric_price_and_missing_price_are_accepted() {
        let mut value = order_json();
        value["price"] = json!(5);
        let order: Order = serde_json::from_value(value.clone()).expect("numeric price");
        assert_eq!(order.price, Some(5.0));

        value.as_object_mut().expect("object").remove("price");
        let order: Order = serde_json::from_value(value).expect("missing price");
        assert_eq!(order.price, None);
    }

    #[test]
    fn create_data_omits_unset_fields() {
        let draft = OrderCreateData {
            language: Language::Kz,
            recipient: Some("Aigerim".into()),
            ..OrderCreateData::default()
        };
        let value = serde_json::to_value(&draft).expect("encode");
        assert_eq!(value, json!({"language": "kz", "recipient": "Aigerim"}));
    }

    #[test]
    fn list_query_serializes_only_present_params() {
        let query = OrderListQuery {
            status: Some("draft".into()),
            ..OrderListQuery::default()
        };
        assert_eq!(serde_json::to_value(&query).expect("encode"), json!({"status": "draft"}));
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(timestamp::parse("yesterday").is_none());
    }
}
