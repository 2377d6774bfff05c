use crate::{db_types::Notification, traits::NotificationApiError};

/// The pull side of the notification channel. Clients reconnecting after a dropped live
/// connection recover missed events through these queries.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    /// Most recent first, bounded by `limit`.
    async fn notifications_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>, NotificationApiError>;

    async fn unread_count(&self, user_id: i64) -> Result<i64, NotificationApiError>;

    /// Returns false when the notification does not exist or belongs to another user.
    async fn mark_as_read(&self, user_id: i64, notification_id: i64) -> Result<bool, NotificationApiError>;

    /// Returns the number of notifications affected.
    async fn mark_all_read(&self, user_id: i64) -> Result<u64, NotificationApiError>;

    async fn delete_notification(&self, user_id: i64, notification_id: i64) -> Result<bool, NotificationApiError>;

    async fn delete_all(&self, user_id: i64) -> Result<u64, NotificationApiError>;
}
