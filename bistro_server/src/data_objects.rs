use std::fmt::Display;

use bistro_engine::db_types::{ItemComposition, Notification, OrderType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The checkout payload. Prices are deliberately absent: the server derives all of them from the
/// catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub order_type: OrderType,
    #[serde(default)]
    pub takeout_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub client_message: Option<String>,
    pub items: Vec<ItemComposition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemReadyRequest {
    pub is_ready: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveRequest {
    pub archived: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatPostRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}
