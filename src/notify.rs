//! User-visible notices ("toasts") with broadcast fan-out to WebSocket clients.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A single notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Sink for notices. The quiz runner and handlers emit through this.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Broadcast hub for notices. Each WebSocket client subscribes independently.
pub struct NoticeHub {
    tx: broadcast::Sender<Notice>,
}

impl NoticeHub {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self { tx })
    }

    /// Subscribe to notices published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Notifier for NoticeHub {
    fn notify(&self, notice: Notice) {
        debug!(level = ?notice.level, message = %notice.message, "Notice");
        // No subscribers is fine: the notice is also returned in the HTTP response.
        let _ = self.tx.send(notice);
    }
}
