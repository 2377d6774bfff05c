use log::*;

use crate::{
    db_types::Notification,
    traits::{NotificationApiError, NotificationManagement},
};

/// Default page size for the notification pull API.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;

/// The pull side of the notification channel.
pub struct NotificationApi<B> {
    db: B,
}

impl<B> NotificationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> NotificationApi<B>
where B: NotificationManagement
{
    /// The caller's most recent notifications plus their unread count.
    pub async fn latest_for_user(
        &self,
        user_id: i64,
        limit: Option<i64>,
    ) -> Result<(Vec<Notification>, i64), NotificationApiError> {
        let limit = limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT).clamp(1, 200);
        let notifications = self.db.notifications_for_user(user_id, limit).await?;
        let unread = self.db.unread_count(user_id).await?;
        trace!("📥️ {} notifications fetched for user {user_id} ({unread} unread)", notifications.len());
        Ok((notifications, unread))
    }

    pub async fn mark_as_read(&self, user_id: i64, notification_id: i64) -> Result<(), NotificationApiError> {
        if self.db.mark_as_read(user_id, notification_id).await? {
            Ok(())
        } else {
            Err(NotificationApiError::NotFound(notification_id))
        }
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, NotificationApiError> {
        let n = self.db.mark_all_read(user_id).await?;
        debug!("📥️ Marked {n} notifications read for user {user_id}");
        Ok(n)
    }

    pub async fn delete(&self, user_id: i64, notification_id: i64) -> Result<(), NotificationApiError> {
        if self.db.delete_notification(user_id, notification_id).await? {
            Ok(())
        } else {
            Err(NotificationApiError::NotFound(notification_id))
        }
    }

    pub async fn delete_all(&self, user_id: i64) -> Result<u64, NotificationApiError> {
        let n = self.db.delete_all(user_id).await?;
        debug!("📥️ Cleared {n} notifications for user {user_id}");
        Ok(n)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
