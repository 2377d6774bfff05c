use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use bistro_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AuthApi,
    ChatApi,
    NotificationApi,
    OrderFlowApi,
    OrderQueryApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    live::{ConnectionRegistry, LiveEvent, LiveStreamRoute, Room},
    routes::{
        health,
        ArchiveOrderRoute,
        AuthRoute,
        ChatTranscriptRoute,
        CheckoutRoute,
        ClearNotificationsRoute,
        DeleteNotificationRoute,
        ItemReadyRoute,
        MarkAllNotificationsReadRoute,
        MarkNotificationReadRoute,
        MyNotificationsRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PostChatMessageRoute,
        SearchOrdersRoute,
        UpdateStatusRoute,
    },
};

/// Buffer size of each engine event channel.
const EVENT_BUFFER_SIZE: usize = 100;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let registry = ConnectionRegistry::new();
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, live_event_hooks(registry.clone()));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, registry, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    registry: ConnectionRegistry,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    // Behind a reverse proxy the peer address is the proxy, so the access log takes the client
    // address from X-Forwarded-For instead when configured to.
    let log_format = if config.use_x_forwarded_for {
        "%t (%D ms) %s %{X-Forwarded-For}i %{Host}i %U"
    } else {
        "%t (%D ms) %s %a %{Host}i %U"
    };
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), config.fees, producers.clone());
        let query_api = OrderQueryApi::new(db.clone());
        let notifications_api = NotificationApi::new(db.clone());
        let chat_api = ChatApi::new(db.clone(), producers.clone());
        let auth_api = AuthApi::new(db.clone());
        let token_issuer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new(log_format).log_target("bistro::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(notifications_api))
            .app_data(web::Data::new(chat_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(token_issuer.clone()))
            .app_data(web::Data::new(registry.clone()));
        // Routes that require authentication. `/orders/my` must register before `/orders/{id}`.
        let api_scope = web::scope("/api")
            .wrap(crate::middleware::BearerAuthFactory::new(token_issuer))
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(SearchOrdersRoute::<SqliteDatabase>::new())
            .service(ChatTranscriptRoute::<SqliteDatabase>::new())
            .service(PostChatMessageRoute::<SqliteDatabase>::new())
            .service(UpdateStatusRoute::<SqliteDatabase>::new())
            .service(ItemReadyRoute::<SqliteDatabase>::new())
            .service(ArchiveOrderRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(MyNotificationsRoute::<SqliteDatabase>::new())
            .service(MarkAllNotificationsReadRoute::<SqliteDatabase>::new())
            .service(MarkNotificationReadRoute::<SqliteDatabase>::new())
            .service(DeleteNotificationRoute::<SqliteDatabase>::new())
            .service(ClearNotificationsRoute::<SqliteDatabase>::new());
        // The live channel authenticates in-band (EventSource cannot set headers), so it sits
        // outside the bearer scope, as does /auth itself.
        app.service(api_scope)
            .service(health)
            .service(AuthRoute::<SqliteDatabase>::new())
            .service(LiveStreamRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Wires the engine's lifecycle events into the live rooms.
///
/// Persistence has already happened by the time any of these run; a dropped or lagging room costs
/// a push, never the data.
pub fn live_event_hooks(registry: ConnectionRegistry) -> EventHooks {
    let mut hooks = EventHooks::default();
    let reg = registry.clone();
    hooks.on_order_created(move |ev| {
        let reg = reg.clone();
        Box::pin(async move {
            debug!("📡️ Pushing new order #{} to the admin room", ev.order.id);
            reg.emit(Room::Admin, LiveEvent::new_order(&ev.order));
            for notification in &ev.notifications {
                reg.emit(Room::User(notification.user_id), LiveEvent::new_notification(notification));
            }
        })
    });
    let reg = registry.clone();
    hooks.on_status_changed(move |ev| {
        let reg = reg.clone();
        Box::pin(async move {
            debug!("📡️ Pushing status change for order #{} ({})", ev.order.id, ev.new_status);
            let update = LiveEvent::status_update(&ev.order, ev.new_status, ev.notes.as_deref());
            reg.emit(Room::User(ev.order.user_id), update.clone());
            reg.emit(Room::OrderChat(ev.order.id), update.clone());
            reg.emit(Room::Admin, update);
            reg.emit(Room::User(ev.order.user_id), LiveEvent::new_notification(&ev.notification));
        })
    });
    let reg = registry.clone();
    hooks.on_item_ready(move |ev| {
        let reg = reg.clone();
        Box::pin(async move {
            let update = LiveEvent::item_updated(ev.order_id, &ev.item);
            reg.emit(Room::OrderChat(ev.order_id), update.clone());
            reg.emit(Room::Admin, update);
        })
    });
    let reg = registry.clone();
    hooks.on_order_archived(move |ev| {
        let reg = reg.clone();
        Box::pin(async move {
            debug!("📡️ Pushing archive toggle for order #{}", ev.order.id);
            reg.emit(Room::Admin, LiveEvent::order_archived(&ev.order));
        })
    });
    let reg = registry;
    hooks.on_chat_message(move |ev| {
        let reg = reg.clone();
        Box::pin(async move {
            let event = LiveEvent::chat_message(&ev.message);
            reg.emit(Room::OrderChat(ev.message.order_id), event.clone());
            reg.emit(Room::Admin, event);
        })
    });
    hooks
}
