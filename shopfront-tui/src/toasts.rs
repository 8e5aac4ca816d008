//! Toast notifications shown in the footer.

use chrono::{DateTime, Utc};
use shopfront_client::mutation::{Notice, NoticeLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

impl From<Notice> for Toast {
    fn from(notice: Notice) -> Self {
        let level = match notice.level {
            NoticeLevel::Success => ToastLevel::Success,
            NoticeLevel::Error => ToastLevel::Error,
            NoticeLevel::Info => ToastLevel::Info,
        };
        Toast::new(level, notice.message)
    }
}
