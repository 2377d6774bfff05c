use bistro_common::Cents;
use bistro_engine::{
    db_types::{
        ChatMessage,
        Dish,
        DishVersion,
        Extra,
        Ingredient,
        NewChatMessage,
        NewNotification,
        NewOrder,
        Notification,
        Order,
        OrderItem,
        OrderStatus,
        Sauce,
        StatusHistoryEntry,
        User,
    },
    order_objects::{OrderItemView, OrderQueryFilter},
    pricing::PricedItem,
    traits::{
        AuthApiError,
        CatalogStore,
        ChatApiError,
        ChatManagement,
        NotificationApiError,
        NotificationManagement,
        OrderFlowError,
        OrderLifecycleDatabase,
        OrderManagement,
        UserStore,
    },
};
use mockall::mock;

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn items_for_order(&self, order_id: i64) -> Result<Vec<OrderItemView>, OrderFlowError>;
        async fn history_for_order(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, OrderFlowError>;
        async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;
        async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
    }
}

mock! {
    pub NotificationManager {}
    impl NotificationManagement for NotificationManager {
        async fn notifications_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>, NotificationApiError>;
        async fn unread_count(&self, user_id: i64) -> Result<i64, NotificationApiError>;
        async fn mark_as_read(&self, user_id: i64, notification_id: i64) -> Result<bool, NotificationApiError>;
        async fn mark_all_read(&self, user_id: i64) -> Result<u64, NotificationApiError>;
        async fn delete_notification(&self, user_id: i64, notification_id: i64) -> Result<bool, NotificationApiError>;
        async fn delete_all(&self, user_id: i64) -> Result<u64, NotificationApiError>;
    }
}

mock! {
    pub ChatManager {}
    impl ChatManagement for ChatManager {
        async fn order_owner(&self, order_id: i64) -> Result<Option<i64>, ChatApiError>;
        async fn insert_chat_message(&self, message: NewChatMessage) -> Result<ChatMessage, ChatApiError>;
        async fn chat_messages_for_order(&self, order_id: i64) -> Result<Vec<ChatMessage>, ChatApiError>;
    }
}

mock! {
    pub LifecycleDb {}
    impl OrderLifecycleDatabase for LifecycleDb {
        async fn insert_full_order<'a, 'b>(&self, order: &'a NewOrder, items: &'b [PricedItem], total: Cents) -> Result<Order, OrderFlowError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn update_order_status<'a>(&self, order_id: i64, status: OrderStatus, notes: Option<&'a str>) -> Result<Order, OrderFlowError>;
        async fn set_item_ready(&self, order_id: i64, item_id: i64, is_ready: bool) -> Result<Option<OrderItem>, OrderFlowError>;
        async fn set_archived(&self, order_id: i64, archived: bool) -> Result<Option<Order>, OrderFlowError>;
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, OrderFlowError>;
        async fn staff_user_ids(&self) -> Result<Vec<i64>, OrderFlowError>;
    }
    impl CatalogStore for LifecycleDb {
        async fn fetch_dish(&self, id: i64) -> Result<Option<(Dish, Vec<DishVersion>)>, OrderFlowError>;
        async fn fetch_sauce(&self, id: i64) -> Result<Option<Sauce>, OrderFlowError>;
        async fn fetch_extra(&self, id: i64) -> Result<Option<Extra>, OrderFlowError>;
        async fn fetch_ingredient(&self, id: i64) -> Result<Option<Ingredient>, OrderFlowError>;
    }
}

mock! {
    pub Users {}
    impl UserStore for Users {
        async fn verify_credential(&self, token: &str) -> Result<Option<User>, AuthApiError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
    }
}
