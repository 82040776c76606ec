use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Delivery mode of an admin-authored notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationKind {
    Instant,
    Schedule,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Instant => "instant",
            NotificationKind::Schedule => "schedule",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "instant" => Some(NotificationKind::Instant),
            "schedule" => Some(NotificationKind::Schedule),
            _ => None,
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
