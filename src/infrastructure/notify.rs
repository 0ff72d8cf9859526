use crate::domain::ports::NotificationSender;
use crate::error::{PurchaseError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::info;

/// Notification sender that logs instead of delivering.
///
/// Used by the CLI driver; a deployment plugs in a real mail adapter.
#[derive(Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        info!(recipient, subject, "enrollment notification");
        Ok(())
    }
}

/// A delivered notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Records sent notifications and can be switched to fail, to exercise the
/// best-effort delivery contract.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SentNotification>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        let sent = self.sent.read().await;
        sent.clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PurchaseError::Internal(Box::new(std::io::Error::other(
                "notification channel down",
            ))));
        }
        let mut sent = self.sent.write().await;
        sent.push(SentNotification {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
