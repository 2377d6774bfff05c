pub mod auth_api;
pub mod chat_api;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
