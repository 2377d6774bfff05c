use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use bistro_common::Secret;
use bistro_engine::db_types::{Role, User};
use chrono::{Duration, Utc};
use log::debug;

use crate::{auth::TokenIssuer, config::AuthConfig, middleware::BearerAuthFactory};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this key anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        hmac_key: Secret::new("endpoint-test-signing-key-0123456789abcdef".to_string()),
        token_validity: Duration::hours(24),
    }
}

pub fn issue_token(user_id: i64, role: Role) -> String {
    let issuer = TokenIssuer::new(&get_auth_config());
    let user = User { id: user_id, display_name: format!("user-{user_id}"), role, created_at: Utc::now() };
    issuer.issue_token(&user, None).expect("Failed to issue token")
}

pub async fn send_request(
    auth_header: &str,
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = req;
    if !auth_header.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_header}")));
    }
    let req = req.to_request();
    let issuer = TokenIssuer::new(&get_auth_config());
    let app = App::new().wrap(BearerAuthFactory::new(issuer)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(auth_header, TestRequest::get().uri(path), configure).await
}

pub async fn post_request(
    auth_header: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(auth_header, TestRequest::post().uri(path).set_json(body), configure).await
}

pub async fn delete_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(auth_header, TestRequest::delete().uri(path), configure).await
}
