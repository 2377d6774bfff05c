use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use bistro_engine::{AuthApiError, ChatApiError, NotificationApiError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Auth token invalid or not provided")]
    CouldNotDeserializeAuthToken,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializeAuthToken => StatusCode::UNAUTHORIZED,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("User account not found.")]
    UserNotFound,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredential => Self::AuthenticationError(AuthError::ValidationError(e.to_string())),
            AuthApiError::UserNotFound(_) => Self::AuthenticationError(AuthError::UserNotFound),
            AuthApiError::Database(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Validation(_) => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::UnknownReference(_) => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::NotFound(s) => Self::NoRecordFound(s),
            OrderFlowError::Database(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<NotificationApiError> for ServerError {
    fn from(e: NotificationApiError) -> Self {
        match e {
            NotificationApiError::NotFound(id) => Self::NoRecordFound(format!("Notification {id}")),
            NotificationApiError::Database(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<ChatApiError> for ServerError {
    fn from(e: ChatApiError) -> Self {
        match e {
            ChatApiError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id}")),
            ChatApiError::EmptyMessage => Self::InvalidRequestBody(e.to_string()),
            ChatApiError::Database(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
