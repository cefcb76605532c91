use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(OrderId);
id_newtype!(LyricsVersionId);
id_newtype!(AudioAssetId);

/// Song and interface language. `kz` is the backend's code for Kazakh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Ru,
    Kz,
    En,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Ru, Language::Kz, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::Kz => "kz",
            Language::En => "en",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::Ru => "Russian",
            Language::Kz => "Kazakh",
            Language::En => "English",
        }
    }

    /// Maps a host or OS language tag (`ru-RU`, `kk`, `en_US.UTF-8`) onto a
    /// supported language.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.starts_with("ru") {
            Some(Language::Ru)
        } else if tag.starts_with("kk") || tag.starts_with("kz") {
            Some(Language::Kz)
        } else if tag.starts_with("en") {
            Some(Language::En)
        } else {
            None
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    PendingLyrics,
    LyricsReady,
    UserEditing,
    Approved,
    Generating,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Draft,
        OrderStatus::PendingLyrics,
        OrderStatus::LyricsReady,
        OrderStatus::UserEditing,
        OrderStatus::Approved,
        OrderStatus::Generating,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::PendingLyrics => "pending_lyrics",
            OrderStatus::LyricsReady => "lyrics_ready",
            OrderStatus::UserEditing => "user_editing",
            OrderStatus::Approved => "approved",
            OrderStatus::Generating => "generating",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }

    /// Position in the linear lifecycle. `Canceled` sits outside it.
    pub fn lifecycle_rank(self) -> Option<u8> {
        match self {
            OrderStatus::Draft => Some(0),
            OrderStatus::PendingLyrics => Some(1),
            OrderStatus::LyricsReady => Some(2),
            OrderStatus::UserEditing => Some(3),
            OrderStatus::Approved => Some(4),
            OrderStatus::Generating => Some(5),
            OrderStatus::Delivered => Some(6),
            OrderStatus::Canceled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// True once the order has passed the point where lyrics must exist.
    pub fn has_lyrics(self) -> bool {
        match (self.lifecycle_rank(), OrderStatus::LyricsReady.lifecycle_rank()) {
            (Some(rank), Some(ready)) => rank >= ready,
            _ => false,
        }
    }

    /// Lifecycle moves forward; canceling is allowed from any non-terminal
    /// state. Re-entering `lyrics_ready` from `user_editing` covers a
    /// submitted edit.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Canceled {
            return true;
        }
        if self == OrderStatus::UserEditing && next == OrderStatus::LyricsReady {
            return true;
        }
        match (self.lifecycle_rank(), next.lifecycle_rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    None,
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsStatus {
    Draft,
    Ready,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioKind {
    Preview,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStatus {
    Queued,
    Generating,
    Ready,
    Failed,
}
