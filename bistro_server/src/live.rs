//! The live channel: named rooms fanning events out to connected clients over server-sent events.
//!
//! Rooms are process-local. Every subscriber of a room receives every event emitted to it; a slow
//! subscriber that lags past the channel capacity misses events and recovers through the pull API
//! (`/api/notifications`), which is why durability lives in the database and never here.

use std::{
    collections::HashMap,
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use actix_web::{error::ResponseError, web, HttpRequest, HttpResponse};
use bistro_engine::{
    db_types::{ChatMessage, Notification, Order, OrderItem, OrderStatus},
    traits::ChatManagement,
};
use futures::StreamExt;
use log::*;
use serde_json::json;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{auth::TokenIssuer, errors::ServerError, route};

/// Capacity of each room's broadcast channel. Lagging subscribers lose the oldest events.
const ROOM_BUFFER_SIZE: usize = 64;

//----------------------------------------------   Room  --------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// All staff: new orders, status changes, item readiness, archive toggles.
    Admin,
    /// One user's personal notification feed.
    User(i64),
    /// The chat sub-channel of one order.
    OrderChat(i64),
}

impl Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::Admin => write!(f, "admin-room"),
            Room::User(id) => write!(f, "user-{id}"),
            Room::OrderChat(id) => write!(f, "order-chat-{id}"),
        }
    }
}

impl FromStr for Room {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "admin-room" {
            return Ok(Room::Admin);
        }
        if let Some(id) = s.strip_prefix("user-") {
            return id.parse().map(Room::User).map_err(|e| format!("Invalid user room '{s}': {e}"));
        }
        if let Some(id) = s.strip_prefix("order-chat-") {
            return id.parse().map(Room::OrderChat).map_err(|e| format!("Invalid order-chat room '{s}': {e}"));
        }
        Err(format!("Unknown room: {s}"))
    }
}

//----------------------------------------------   LiveEvent  ---------------------------------------------------------
/// A named event as delivered on the wire.
#[derive(Debug, Clone)]
pub struct LiveEvent {
    pub event: &'static str,
    pub data: serde_json::Value,
}

impl LiveEvent {
    pub fn new_order(order: &Order) -> Self {
        Self { event: "newOrder", data: json!(order) }
    }

    pub fn status_update(order: &Order, status: OrderStatus, notes: Option<&str>) -> Self {
        Self {
            event: "order-status-update",
            data: json!({
                "order_id": order.id,
                "status": status.code(),
                "status_text": status.label(),
                "notes": notes,
            }),
        }
    }

    pub fn item_updated(order_id: i64, item: &OrderItem) -> Self {
        Self { event: "order-item-updated", data: json!({ "order_id": order_id, "item": item }) }
    }

    pub fn new_notification(notification: &Notification) -> Self {
        Self { event: "new-notification", data: json!(notification) }
    }

    pub fn chat_message(message: &ChatMessage) -> Self {
        Self { event: "chat-message", data: json!(message) }
    }

    pub fn order_archived(order: &Order) -> Self {
        Self { event: "order-archived", data: json!(order) }
    }

    /// The SSE wire framing for this event.
    pub fn to_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event, self.data)
    }
}

//----------------------------------------------   ConnectionRegistry  ------------------------------------------------
/// Tracks the broadcast channel backing each live room.
///
/// Rooms are created lazily on first subscription or emit, and an emit into a room with no
/// subscribers is a no-op. The registry is cheap to clone and shared between the HTTP handlers and
/// the engine event hooks.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    rooms: Arc<Mutex<HashMap<Room, broadcast::Sender<LiveEvent>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, room: Room) -> Result<broadcast::Receiver<LiveEvent>, ServerError> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| ServerError::Unspecified("The live room registry lock is poisoned".to_string()))?;
        Ok(rooms.entry(room).or_insert_with(|| broadcast::channel(ROOM_BUFFER_SIZE).0).subscribe())
    }

    pub fn emit(&self, room: Room, event: LiveEvent) {
        let sender = {
            let rooms = match self.rooms.lock() {
                Ok(rooms) => rooms,
                Err(_) => {
                    warn!("📡️ The live room registry lock is poisoned; event for {room} dropped");
                    return;
                },
            };
            rooms.get(&room).cloned()
        };
        match sender {
            Some(sender) => match sender.send(event) {
                Ok(n) => trace!("📡️ Event delivered to {n} subscribers of {room}"),
                Err(_) => trace!("📡️ Room {room} has no subscribers left"),
            },
            None => trace!("📡️ No one has joined {room}; event dropped"),
        }
    }
}

//----------------------------------------------   SSE endpoint  ------------------------------------------------------
route!(live_stream => Get "/live/{room}" impl ChatManagement);
/// The streaming endpoint behind the live channel.
///
/// Room authorization: `admin-room` requires the staff role; `user-{id}` requires staff or the matching
/// user id; `order-chat-{id}` requires staff or ownership of the order. A failed join is
/// acknowledged in-band with `{"success": false}` on an otherwise normal response, so that clients
/// treat it as a refusal rather than a transport error and do not hammer the server with
/// reconnects.
pub async fn live_stream<B: ChatManagement>(
    req: HttpRequest,
    path: web::Path<String>,
    registry: web::Data<ConnectionRegistry>,
    verifier: web::Data<TokenIssuer>,
    chat: web::Data<bistro_engine::ChatApi<B>>,
) -> HttpResponse {
    let room = match Room::from_str(&path.into_inner()) {
        Ok(room) => room,
        Err(e) => {
            debug!("📡️ Join refused: {e}");
            return refuse_join("Unknown room");
        },
    };
    let claims = match crate::auth::extract_token(&req).and_then(|t| verifier.decode_token(&t).ok()) {
        Some(claims) => claims,
        None => {
            debug!("📡️ Join refused for {room}: no valid access token");
            return refuse_join("Not authenticated");
        },
    };
    let authorized = match room {
        Room::Admin => claims.is_staff(),
        Room::User(id) => claims.is_staff() || claims.user_id == id,
        Room::OrderChat(order_id) => {
            claims.is_staff() ||
                matches!(chat.db().order_owner(order_id).await, Ok(Some(owner)) if owner == claims.user_id)
        },
    };
    if !authorized {
        debug!("📡️ Join refused: user {} may not join {room}", claims.user_id);
        return refuse_join("Not authorized for this room");
    }
    info!("📡️ User {} joined {room}", claims.user_id);
    let receiver = match registry.subscribe(room) {
        Ok(receiver) => receiver,
        Err(e) => return e.error_response(),
    };
    let ack = LiveEvent { event: "connected", data: json!({ "success": true }) };
    let frames = futures::stream::once(async move { Ok::<_, actix_web::Error>(web::Bytes::from(ack.to_frame())) })
        .chain(BroadcastStream::new(receiver).filter_map(|ev| async move {
            match ev {
                Ok(ev) => Some(Ok(web::Bytes::from(ev.to_frame()))),
                // Lagged subscribers skip ahead; the pull API covers the gap.
                Err(_) => None,
            }
        }));
    sse_response().streaming(frames)
}

fn sse_response() -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Ok();
    builder.content_type("text/event-stream").insert_header(("Cache-Control", "no-cache"));
    builder
}

fn refuse_join(reason: &str) -> HttpResponse {
    let ack = LiveEvent { event: "connected", data: json!({ "success": false, "reason": reason }) };
    sse_response().body(ack.to_frame())
}
