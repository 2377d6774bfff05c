use thiserror::Error;

use crate::pricing::PricingError;

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order request. {0}")]
    Validation(String),
    #[error("{0}")]
    UnknownReference(#[from] PricingError),
    #[error("Not found. {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotificationApiError {
    #[error("Notification {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for NotificationApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ChatApiError {
    #[error("Order {0} not found")]
    OrderNotFound(i64),
    #[error("Chat messages may not be empty")]
    EmptyMessage,
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for ChatApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("The supplied credential does not match any user")]
    InvalidCredential,
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}
