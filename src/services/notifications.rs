use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ServiceError;

/// Where a customer can be reached. Either channel may be absent; senders
/// deliver on whichever they have.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Notification collaborator. The engine treats delivery as fire-and-forget:
/// the reconciliation service logs and swallows errors from this trait, so
/// implementations may fail freely without affecting saves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(&self, contact: &CustomerContact, message: &str) -> Result<(), ServiceError>;
}

/// Default sender: records the notification in the log and succeeds. Hosts
/// wire real email/SMS delivery behind the trait.
pub struct LoggingNotificationSender;

#[async_trait]
impl NotificationSender for LoggingNotificationSender {
    async fn notify(&self, contact: &CustomerContact, message: &str) -> Result<(), ServiceError> {
        info!(
            email = contact.email.as_deref().unwrap_or("-"),
            phone = contact.phone.as_deref().unwrap_or("-"),
            message,
            "Customer notification"
        );
        Ok(())
    }
}
