//! Bistro order engine
//!
//! The core logic of the ordering platform: server-side pricing, the order lifecycle, the
//! notification channel and the per-order chat. It is transport-agnostic; the HTTP server crate
//! sits on top of the public APIs defined here.
//!
//! The library is divided into three main sections:
//! 1. Database management ([`mod@db`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public APIs instead. The exception is the data types,
//!    which are defined in [`db_types`] and are public.
//! 2. The public APIs ([`mod@api`]): order flow, notifications, chat and authentication. Each API
//!    is generic over the storage traits in [`traits`], which a backend implements to act as a
//!    store for the engine.
//! 3. Events ([`mod@events`]). Lifecycle milestones (order created, status changed, item ready,
//!    archive toggled, chat message) are published through a small actor framework so that callers
//!    can hook custom actions, such as pushing to live connections, without the engine knowing
//!    about transports.
mod db;

pub mod api;
pub mod db_types;
pub mod events;
pub mod pricing;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{new_pool, SqliteDatabase};

pub use api::{
    auth_api::AuthApi,
    chat_api::ChatApi,
    notification_api::{NotificationApi, DEFAULT_NOTIFICATION_LIMIT},
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::OrderQueryApi,
};
pub use traits::{AuthApiError, ChatApiError, NotificationApiError, OrderFlowError};
