use serde::{Deserialize, Serialize};

/// Handle to a notification shown by the editor host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Progress,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// Completion ratio in `0.0..=1.0`; only meaningful for [`NotificationKind::Progress`].
    pub progress: Option<f64>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::plain(message, NotificationKind::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::plain(message, NotificationKind::Warning)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::plain(message, NotificationKind::Success)
    }

    pub fn progress(message: impl Into<String>, progress: f64) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Progress,
            progress: Some(progress.clamp(0.0, 1.0)),
        }
    }

    fn plain(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
            progress: None,
        }
    }
}
