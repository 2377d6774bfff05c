//! Storage collaborator contracts.
//!
//! The engine's public APIs are generic over these traits. A backend (SQLite in this workspace)
//! implements all of them; tests substitute mocks per concern.

mod catalog;
mod chat_management;
mod errors;
mod lifecycle_database;
mod notification_management;
mod order_management;
mod user_store;

pub use catalog::CatalogStore;
pub use chat_management::ChatManagement;
pub use errors::{AuthApiError, ChatApiError, NotificationApiError, OrderFlowError};
pub use lifecycle_database::OrderLifecycleDatabase;
pub use notification_management::NotificationManagement;
pub use order_management::OrderManagement;
pub use user_store::UserStore;
