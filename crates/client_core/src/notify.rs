use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// Transient toast shown after a page action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Default,
        }
    }

    pub fn request_failed(err: &ClientError) -> Self {
        Self {
            title: "Error".to_string(),
            description: err.to_string(),
            variant: NotificationVariant::Destructive,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}
