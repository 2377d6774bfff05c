use std::{fmt::Display, str::FromStr};

use bistro_common::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------    OrderStatus      ---------------------------------------------------------
/// The order lifecycle state machine, as an integer-coded status.
///
/// The common path is monotonic (0 → 6), but the system deliberately does not enforce forward-only
/// transitions: an admin may set any status on any order (an "undo" allowance). Validation is
/// limited to the code being one of the eight known values, which this enum guarantees by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(try_from = "i64", into = "i64")]
pub enum OrderStatus {
    /// The order has been placed and is waiting for the restaurant to confirm it.
    AwaitingConfirmation = 0,
    /// The restaurant has accepted the order.
    Confirmed = 1,
    /// The kitchen is preparing the order.
    InPreparation = 2,
    /// The order is ready for pickup or dispatch.
    Ready = 3,
    /// The order is out for delivery.
    InDelivery = 4,
    /// The order has been delivered.
    Delivered = 5,
    /// The order is complete.
    Completed = 6,
    /// The order was cancelled by the customer or the restaurant.
    Cancelled = 7,
}

/// Label used when rendering a status code that no longer maps to a known status.
pub const UNKNOWN_STATUS_LABEL: &str = "Statut inconnu";

impl OrderStatus {
    pub fn code(&self) -> i64 {
        *self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::AwaitingConfirmation),
            1 => Some(Self::Confirmed),
            2 => Some(Self::InPreparation),
            3 => Some(Self::Ready),
            4 => Some(Self::InDelivery),
            5 => Some(Self::Delivered),
            6 => Some(Self::Completed),
            7 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// The human-readable (French) label for this status. This is what gets snapshotted into the
    /// status history ledger.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingConfirmation => "En attente de confirmation",
            Self::Confirmed => "Confirmée",
            Self::InPreparation => "En préparation",
            Self::Ready => "Prête",
            Self::InDelivery => "En livraison",
            Self::Delivered => "Livrée",
            Self::Completed => "Terminée",
            Self::Cancelled => "Annulée",
        }
    }

    /// Total label mapping over arbitrary codes, so that history rendering never fails on data
    /// written by a future (or corrupted) version of the system.
    pub fn label_for_code(code: i64) -> &'static str {
        Self::from_code(code).map(|s| s.label()).unwrap_or(UNKNOWN_STATUS_LABEL)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status code: {0}")]
pub struct InvalidStatusCode(pub i64);

impl TryFrom<i64> for OrderStatus {
    type Error = InvalidStatusCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(InvalidStatusCode(code))
    }
}

impl From<OrderStatus> for i64 {
    fn from(status: OrderStatus) -> Self {
        status.code()
    }
}

//--------------------------------------     OrderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Takeout,
    Delivery,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Takeout => write!(f, "takeout"),
            OrderType::Delivery => write!(f, "delivery"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order type: {0}")]
pub struct InvalidOrderType(String);

impl FromStr for OrderType {
    type Err = InvalidOrderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "takeout" => Ok(Self::Takeout),
            "delivery" => Ok(Self::Delivery),
            s => Err(InvalidOrderType(s.to_string())),
        }
    }
}

//--------------------------------------       Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Staff,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff)
    }
}

//--------------------------------------       User          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Order          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Server-computed, authoritative. Never recomputed after creation.
    pub total_price: Cents,
    pub status: OrderStatus,
    pub order_type: OrderType,
    /// `None` means "as soon as possible".
    pub takeout_time: Option<DateTime<Utc>>,
    pub payment_method: String,
    pub client_message: Option<String>,
    pub restaurant_message: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewOrder        ---------------------------------------------------------
/// A checkout request after deserialization, before server-side pricing. All prices are computed
/// from the catalog at creation time; nothing the client submits is trusted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub order_type: OrderType,
    pub takeout_time: Option<DateTime<Utc>>,
    pub payment_method: String,
    pub client_message: Option<String>,
    /// Rare administrative path: an order created pre-archived suppresses all fan-out.
    pub archived: bool,
    pub items: Vec<ItemComposition>,
}

impl NewOrder {
    pub fn new(user_id: i64, order_type: OrderType, items: Vec<ItemComposition>) -> Self {
        Self {
            user_id,
            order_type,
            takeout_time: None,
            payment_method: "cash".to_string(),
            client_message: None,
            archived: false,
            items,
        }
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = method.into();
        self
    }

    pub fn with_client_message<S: Into<String>>(mut self, message: S) -> Self {
        self.client_message = Some(message.into());
        self
    }

    pub fn with_takeout_time(mut self, at: DateTime<Utc>) -> Self {
        self.takeout_time = Some(at);
        self
    }

    pub fn pre_archived(mut self) -> Self {
        self.archived = true;
        self
    }
}

//--------------------------------------  ItemComposition    ---------------------------------------------------------
/// What was ordered: a dish or a standalone sauce, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderedItem {
    Dish(i64),
    Sauce(i64),
}

/// The full configuration of one basket line as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemComposition {
    pub item: OrderedItem,
    /// Requested version/size name. Falls back to the catalog's first defined version when absent
    /// or unknown.
    pub version_size: Option<String>,
    /// Sauce chosen as a modifier on a dish.
    pub sauce_id: Option<i64>,
    pub extra_ids: Vec<i64>,
    pub removed_ingredient_ids: Vec<i64>,
    pub quantity: i64,
    pub message: Option<String>,
}

impl ItemComposition {
    pub fn dish(dish_id: i64, quantity: i64) -> Self {
        Self {
            item: OrderedItem::Dish(dish_id),
            version_size: None,
            sauce_id: None,
            extra_ids: Vec::new(),
            removed_ingredient_ids: Vec::new(),
            quantity,
            message: None,
        }
    }

    pub fn sauce(sauce_id: i64, quantity: i64) -> Self {
        Self { item: OrderedItem::Sauce(sauce_id), ..Self::dish(0, quantity) }
    }

    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version_size = Some(version.into());
        self
    }

    pub fn with_sauce(mut self, sauce_id: i64) -> Self {
        self.sauce_id = Some(sauce_id);
        self
    }

    pub fn with_extras(mut self, extra_ids: Vec<i64>) -> Self {
        self.extra_ids = extra_ids;
        self
    }

    pub fn without_ingredients(mut self, ingredient_ids: Vec<i64>) -> Self {
        self.removed_ingredient_ids = ingredient_ids;
        self
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }
}

//--------------------------------------    OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub dish_id: Option<i64>,
    pub sauce_id: Option<i64>,
    /// Sauce chosen as a modifier on a dish (distinct from `sauce_id`, which means the item IS a
    /// sauce).
    pub modifier_sauce_id: Option<i64>,
    /// Snapshot of the version/size name at order time; catalog versions may change later.
    pub version_size: Option<String>,
    pub quantity: i64,
    /// Locked at order time.
    pub unit_price: Cents,
    /// `unit_price` × `quantity`, locked at order time.
    pub total_price: Cents,
    pub is_ready: bool,
    pub message: Option<String>,
}

/// An extra added to an order item, with its own price locked at order time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItemExtra {
    pub extra_id: i64,
    pub price: Cents,
}

//-------------------------------------- StatusHistoryEntry  ---------------------------------------------------------
/// Append-only ledger entry. The status is stored as the human-readable label, not the numeric
/// code, so the ledger stays legible even if the code table evolves.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub status_label: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------  NotificationType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderStatus,
    OrderNew,
    Chat,
}

//--------------------------------------   Notification      ---------------------------------------------------------
/// Structured payload attached to a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub order_id: Option<i64>,
    pub status: Option<i64>,
    pub status_text: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Json<NotificationData>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: NotificationData,
}

//--------------------------------------    SenderType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Client,
    Shop,
}

//--------------------------------------    ChatMessage      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub order_id: i64,
    pub sender_id: i64,
    pub sender_type: SenderType,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub order_id: i64,
    pub sender_id: i64,
    pub sender_type: SenderType,
    pub message: String,
}

//--------------------------------------      Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub price: Cents,
    /// When true, a sauce modifier on this dish is free of charge.
    pub sauce_included: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct DishVersion {
    pub name: String,
    pub extra_price: Cents,
}

#[derive(Debug, Clone, FromRow)]
pub struct Sauce {
    pub id: i64,
    pub name: String,
    pub price: Cents,
}

#[derive(Debug, Clone, FromRow)]
pub struct Extra {
    pub id: i64,
    pub name: String,
    pub price: Cents,
}

#[derive(Debug, Clone, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
}
