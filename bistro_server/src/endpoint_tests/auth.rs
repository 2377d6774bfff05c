//! Tests for the login endpoint. Unlike the `/api` surface, `/auth` sits outside the bearer
//! middleware, so these build the test app directly rather than going through
//! [`helpers::send_request`].

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use bistro_engine::{
    db_types::{Role, User},
    AuthApi,
};
use chrono::Utc;

use crate::{
    auth::TokenIssuer,
    endpoint_tests::{helpers::get_auth_config, mocks::MockUsers},
    routes::AuthRoute,
};

fn test_app_data() -> (web::Data<AuthApi<MockUsers>>, web::Data<TokenIssuer>) {
    let mut db = MockUsers::new();
    db.expect_verify_credential().withf(|credential| credential == "alice-credential").returning(|_| {
        Ok(Some(User { id: 42, display_name: "Alice".to_string(), role: Role::Customer, created_at: Utc::now() }))
    });
    db.expect_verify_credential().withf(|credential| credential != "alice-credential").returning(|_| Ok(None));
    (web::Data::new(AuthApi::new(db)), web::Data::new(TokenIssuer::new(&get_auth_config())))
}

#[actix_web::test]
async fn a_valid_credential_yields_a_decodable_access_token() {
    let _ = env_logger::try_init().ok();
    let (api, issuer) = test_app_data();
    let app = App::new().app_data(api).app_data(issuer).service(AuthRoute::<MockUsers>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/auth").insert_header(("bistro_auth_token", "alice-credential")).to_request();
    let (_, res) = test::try_call_service(&service, req).await.expect("Request failed").into_parts();
    assert!(res.status().is_success());
    let body = res.into_body().try_into_bytes().unwrap();
    let response: serde_json::Value = serde_json::from_slice(&body).expect("Body was not JSON");
    assert_eq!(response["user_id"], 42);
    assert_eq!(response["display_name"], "Alice");
    let token = response["token"].as_str().expect("Token missing");
    let claims = TokenIssuer::new(&get_auth_config()).decode_token(token).expect("Token did not verify");
    assert_eq!(claims.user_id, 42);
    assert_eq!(claims.role, Role::Customer);
    assert!(claims.expires_at > Utc::now());
}

#[actix_web::test]
async fn an_unknown_credential_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (api, issuer) = test_app_data();
    let app = App::new().app_data(api).app_data(issuer).service(AuthRoute::<MockUsers>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/auth").insert_header(("bistro_auth_token", "who-is-this")).to_request();
    let (_, res) = test::try_call_service(&service, req).await.expect("Request failed").into_parts();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    assert_eq!(
        body,
        "{\"error\":\"Authentication Error. Access token signature is invalid. The supplied credential does not \
         match any user\"}"
    );
}

#[actix_web::test]
async fn a_missing_credential_header_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (api, issuer) = test_app_data();
    let app = App::new().app_data(api).app_data(issuer).service(AuthRoute::<MockUsers>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/auth").to_request();
    let (_, res) = test::try_call_service(&service, req).await.expect("Request failed").into_parts();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    assert_eq!(body, r#"{"error":"Auth token invalid or not provided"}"#);
}
