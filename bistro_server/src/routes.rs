//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) should be expressed as futures or asynchronous functions. Async handlers get executed
//! concurrently by worker threads and thus don't block execution.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use bistro_engine::{
    db_types::{NewChatMessage, NewOrder, OrderStatus, Role, SenderType},
    order_objects::OrderQueryFilter,
    traits::{
        CatalogStore,
        ChatManagement,
        NotificationManagement,
        OrderLifecycleDatabase,
        OrderManagement,
        UserStore,
    },
    AuthApi,
    ChatApi,
    NotificationApi,
    OrderFlowApi,
    OrderQueryApi,
};
use log::*;
use serde::Deserialize;

use crate::{
    auth::{AccessClaims, TokenIssuer},
    data_objects::{
        ArchiveRequest,
        AuthResponse,
        ChatPostRequest,
        CheckoutRequest,
        ItemReadyRequest,
        JsonResponse,
        NotificationListResponse,
        StatusUpdateRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(auth => Post "/auth" impl UserStore);
/// Route handler for the auth endpoint
///
/// Users supply their login credential in the `bistro_auth_token` header. The credential is an
/// opaque per-user token; if it resolves to a user, the server issues a signed access token
/// carrying the user id and role, valid for the configured validity period. The access token will
/// NOT refresh.
pub async fn auth<A: UserStore>(
    req: HttpRequest,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received auth request");
    let payload = req.headers().get("bistro_auth_token").ok_or(ServerError::CouldNotDeserializeAuthToken)?;
    let credential = payload.to_str().map_err(|e| {
        debug!("💻️ Could not read auth credential. {e}");
        ServerError::CouldNotDeserializeAuthToken
    })?;
    let user = api.authenticate(credential).await?;
    let token = signer.issue_token(&user, None)?;
    debug!("💻️ Issued access token for user {}", user.id);
    Ok(HttpResponse::Ok().json(AuthResponse { token, user_id: user.id, display_name: user.display_name }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(checkout => Post "/orders" impl OrderLifecycleDatabase, CatalogStore);
/// Place a new order. The caller is the ordering user; all prices are derived server-side.
pub async fn checkout<A: OrderLifecycleDatabase + CatalogStore>(
    claims: AccessClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST checkout for user {} with {} lines", claims.user_id, request.items.len());
    let mut order = NewOrder::new(claims.user_id, request.order_type, request.items);
    if let Some(method) = request.payment_method {
        order = order.with_payment_method(method);
    }
    if let Some(message) = request.client_message {
        order = order.with_client_message(message);
    }
    if let Some(at) = request.takeout_time {
        order = order.with_takeout_time(at);
    }
    let created = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(created))
}

route!(my_orders => Get "/orders/my" impl OrderManagement);
pub async fn my_orders<A: OrderManagement>(
    claims: AccessClaims,
    api: web::Data<OrderQueryApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user {}", claims.user_id);
    let orders = api.orders_for_user(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
/// The full order aggregate. Customers may only fetch their own orders; staff may fetch any.
pub async fn order_by_id<A: OrderManagement>(
    claims: AccessClaims,
    path: web::Path<i64>,
    api: web::Data<OrderQueryApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for user {}", claims.user_id);
    let result = api
        .order_by_id(order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    if !claims.is_staff() && result.order.user_id != claims.user_id {
        return Err(ServerError::InsufficientPermissions(format!("Order {order_id} belongs to another user")));
    }
    Ok(HttpResponse::Ok().json(result))
}

/// Admin order-search query parameters. `status` is a numeric status code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub user_id: Option<i64>,
    pub status: Option<i64>,
    pub archived: Option<bool>,
    pub order_type: Option<bistro_engine::db_types::OrderType>,
}

route!(search_orders => Get "/orders" impl OrderManagement where requires [Role::Staff]);
pub async fn search_orders<A: OrderManagement>(
    query: web::Query<SearchParams>,
    api: web::Data<OrderQueryApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    debug!("💻️ GET orders search: {params:?}");
    let mut filter = OrderQueryFilter::default();
    if let Some(user_id) = params.user_id {
        filter = filter.with_user_id(user_id);
    }
    if let Some(code) = params.status {
        let status = OrderStatus::from_code(code)
            .ok_or_else(|| ServerError::InvalidRequestBody(format!("Invalid status code: {code}")))?;
        filter = filter.with_status(status);
    }
    if let Some(archived) = params.archived {
        filter = filter.with_archived(archived);
    }
    if let Some(order_type) = params.order_type {
        filter = filter.with_order_type(order_type);
    }
    let orders = api.search(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(update_status => Post "/orders/{id}/status" impl OrderLifecycleDatabase, CatalogStore where requires [Role::Staff]);
/// Set an order's status. Any known status code is accepted from any current status.
pub async fn update_status<A: OrderLifecycleDatabase + CatalogStore>(
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let request = body.into_inner();
    let status = OrderStatus::from_code(request.status)
        .ok_or_else(|| ServerError::InvalidRequestBody(format!("Invalid status code: {}", request.status)))?;
    debug!("💻️ POST status {status} for order {order_id}");
    let order = api.set_status(order_id, status, request.notes.as_deref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(item_ready => Post "/orders/{id}/items/{item_id}/ready" impl OrderLifecycleDatabase, CatalogStore where requires [Role::Staff]);
pub async fn item_ready<A: OrderLifecycleDatabase + CatalogStore>(
    path: web::Path<(i64, i64)>,
    body: web::Json<ItemReadyRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let (order_id, item_id) = path.into_inner();
    debug!("💻️ POST item {item_id} of order {order_id} ready = {}", body.is_ready);
    let item = api.set_item_ready(order_id, item_id, body.is_ready).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(archive_order => Post "/orders/{id}/archive" impl OrderLifecycleDatabase, CatalogStore where requires [Role::Staff]);
pub async fn archive_order<A: OrderLifecycleDatabase + CatalogStore>(
    path: web::Path<i64>,
    body: web::Json<ArchiveRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST archive = {} for order {order_id}", body.archived);
    let order = api.set_archived(order_id, body.archived).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Notifications  -----------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationParams {
    pub limit: Option<i64>,
}

route!(my_notifications => Get "/notifications" impl NotificationManagement);
/// The caller's notification feed, most recent first, with the unread count. This is the pull
/// side of the live channel; clients call it on reconnect to recover anything they missed.
pub async fn my_notifications<A: NotificationManagement>(
    claims: AccessClaims,
    query: web::Query<NotificationParams>,
    api: web::Data<NotificationApi<A>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET notifications for user {}", claims.user_id);
    let (notifications, unread) = api.latest_for_user(claims.user_id, query.limit).await?;
    Ok(HttpResponse::Ok().json(NotificationListResponse { notifications, unread }))
}

route!(mark_notification_read => Post "/notifications/{id}/read" impl NotificationManagement);
pub async fn mark_notification_read<A: NotificationManagement>(
    claims: AccessClaims,
    path: web::Path<i64>,
    api: web::Data<NotificationApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.mark_as_read(claims.user_id, id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Notification {id} marked as read"))))
}

route!(mark_all_notifications_read => Post "/notifications/read-all" impl NotificationManagement);
pub async fn mark_all_notifications_read<A: NotificationManagement>(
    claims: AccessClaims,
    api: web::Data<NotificationApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let n = api.mark_all_read(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{n} notifications marked as read"))))
}

route!(delete_notification => Delete "/notifications/{id}" impl NotificationManagement);
pub async fn delete_notification<A: NotificationManagement>(
    claims: AccessClaims,
    path: web::Path<i64>,
    api: web::Data<NotificationApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete(claims.user_id, id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Notification {id} deleted"))))
}

route!(clear_notifications => Delete "/notifications" impl NotificationManagement);
pub async fn clear_notifications<A: NotificationManagement>(
    claims: AccessClaims,
    api: web::Data<NotificationApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let n = api.delete_all(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{n} notifications deleted"))))
}

//----------------------------------------------   Chat  ----------------------------------------------------
route!(chat_transcript => Get "/orders/{id}/chat" impl ChatManagement);
pub async fn chat_transcript<A: ChatManagement>(
    claims: AccessClaims,
    path: web::Path<i64>,
    api: web::Data<ChatApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    authorize_chat_access(&claims, order_id, api.as_ref()).await?;
    let transcript = api.transcript(order_id).await?;
    Ok(HttpResponse::Ok().json(transcript))
}

route!(post_chat_message => Post "/orders/{id}/chat" impl ChatManagement);
/// Post a message into an order's chat. The sender type follows the caller's role: customers
/// write as `client`, staff as `shop`.
pub async fn post_chat_message<A: ChatManagement>(
    claims: AccessClaims,
    path: web::Path<i64>,
    body: web::Json<ChatPostRequest>,
    api: web::Data<ChatApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    authorize_chat_access(&claims, order_id, api.as_ref()).await?;
    let sender_type = if claims.is_staff() { SenderType::Shop } else { SenderType::Client };
    let message = NewChatMessage {
        order_id,
        sender_id: claims.user_id,
        sender_type,
        message: body.into_inner().message,
    };
    let saved = api.post_message(message).await?;
    Ok(HttpResponse::Created().json(saved))
}

async fn authorize_chat_access<A: ChatManagement>(
    claims: &AccessClaims,
    order_id: i64,
    api: &ChatApi<A>,
) -> Result<(), ServerError> {
    if claims.is_staff() {
        return Ok(());
    }
    let owner = api
        .db()
        .order_owner(order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    if owner == claims.user_id {
        Ok(())
    } else {
        Err(ServerError::InsufficientPermissions(format!("Order {order_id} belongs to another user")))
    }
}
