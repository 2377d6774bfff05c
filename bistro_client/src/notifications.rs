//! The client-side notification consumer.
//!
//! Notifications reach the client on two independent paths: the pull API (polled, and replayed on
//! reconnect) and the live channel. [`NotificationFeed`] merges both into one deduplicated feed,
//! tracks the unread badge, and reports which arrivals warrant an alert (sound, browser
//! notification) as return values. It performs no side effects itself; the caller owns the
//! timers, the network and the UI.

use bistro_engine::db_types::Notification;
use log::*;

#[derive(Debug, Clone, Default)]
pub struct NotificationFeed {
    /// Most recent first, mirroring the pull API's ordering.
    notifications: Vec<Notification>,
    unread: i64,
    /// Highest id ever observed; arrivals at or below it never alert again.
    last_seen_id: i64,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread(&self) -> i64 {
        self.unread
    }

    /// Merge a pulled batch and adopt the server's unread count. Returns the notifications that
    /// were not seen before and are still unread; those are the ones worth alerting for. The very
    /// first batch after startup alerts for nothing, so reopening the app stays quiet.
    pub fn ingest_batch(&mut self, batch: Vec<Notification>, unread: i64) -> Vec<Notification> {
        let first_sync = self.last_seen_id == 0 && self.notifications.is_empty();
        let mut fresh = Vec::new();
        for notification in batch.into_iter().rev() {
            if self.push_new(notification.clone()) && !notification.is_read && !first_sync {
                fresh.push(notification);
            }
        }
        self.unread = unread;
        trace!("📥️ Batch merged; {} unread, {} alertable", self.unread, fresh.len());
        fresh
    }

    /// A notification arrived on the live channel. Returns it when it is new and unread, i.e.
    /// when the caller should alert; duplicates are swallowed silently.
    pub fn receive(&mut self, notification: Notification) -> Option<Notification> {
        if !self.push_new(notification.clone()) {
            trace!("📥️ Ignoring duplicate notification {}", notification.id);
            return None;
        }
        if notification.is_read {
            return None;
        }
        self.unread += 1;
        Some(notification)
    }

    /// Mark one notification read locally, mirroring a successful `mark_as_read` call.
    pub fn mark_read(&mut self, notification_id: i64) {
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == notification_id) {
            if !n.is_read {
                n.is_read = true;
                self.unread = (self.unread - 1).max(0);
            }
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.is_read = true;
        }
        self.unread = 0;
    }

    pub fn remove(&mut self, notification_id: i64) {
        if let Some(i) = self.notifications.iter().position(|n| n.id == notification_id) {
            let removed = self.notifications.remove(i);
            if !removed.is_read {
                self.unread = (self.unread - 1).max(0);
            }
        }
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.unread = 0;
    }

    // Insert keeping most-recent-first order. Returns false for duplicates.
    fn push_new(&mut self, notification: Notification) -> bool {
        if self.notifications.iter().any(|n| n.id == notification.id) {
            return false;
        }
        self.last_seen_id = self.last_seen_id.max(notification.id);
        let slot = self.notifications.iter().position(|n| n.id < notification.id).unwrap_or(self.notifications.len());
        self.notifications.insert(slot, notification);
        true
    }
}
