//! Notifier that logs and records instead of posting to a device

use super::{Notifier, PermissionStatus, ProximityNotification};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

/// Records every notification and emits it as a structured log event
#[derive(Debug)]
pub struct LogNotifier {
    permission: PermissionStatus,
    delivered: Mutex<Vec<(String, ProximityNotification)>>,
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LogNotifier {
    /// Notifier that grants permission
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    /// Notifier answering permission requests with `permission`
    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            permission,
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Notifications shown so far, oldest first
    pub fn delivered(&self) -> Vec<ProximityNotification> {
        self.lock().iter().map(|(_, n)| n.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, ProximityNotification)>> {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn schedule_immediate(&self, notification: &ProximityNotification) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        info!(
            notification_id = %id,
            title = %notification.title,
            body = %notification.body,
            data = %notification.data,
            "Notification shown"
        );
        self.lock().push((id.clone(), notification.clone()));
        Ok(id)
    }

    async fn cancel_all(&self) -> Result<()> {
        let mut delivered = self.lock();
        info!(count = delivered.len(), "Notifications cancelled");
        delivered.clear();
        Ok(())
    }
}
