use sqlx::SqlitePool;

/// The schema is applied statement by statement at pool creation. Every statement is idempotent,
/// so reopening an existing database is a no-op.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        display_name TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'customer',
        auth_token TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dishes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price INTEGER NOT NULL,
        sauce_included INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dish_versions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        dish_id INTEGER NOT NULL REFERENCES dishes (id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        extra_price INTEGER NOT NULL DEFAULT 0,
        position INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sauces (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price INTEGER NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS extras (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price INTEGER NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ingredients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users (id),
        total_price INTEGER NOT NULL,
        status INTEGER NOT NULL DEFAULT 0,
        order_type TEXT NOT NULL,
        takeout_time TEXT,
        payment_method TEXT NOT NULL,
        client_message TEXT,
        restaurant_message TEXT,
        archived INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        dish_id INTEGER REFERENCES dishes (id),
        sauce_id INTEGER REFERENCES sauces (id),
        modifier_sauce_id INTEGER REFERENCES sauces (id),
        version_size TEXT,
        quantity INTEGER NOT NULL,
        unit_price INTEGER NOT NULL,
        total_price INTEGER NOT NULL,
        is_ready INTEGER NOT NULL DEFAULT 0,
        message TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_item_extras (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_item_id INTEGER NOT NULL REFERENCES order_items (id) ON DELETE CASCADE,
        extra_id INTEGER NOT NULL REFERENCES extras (id),
        price INTEGER NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_item_removed_ingredients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_item_id INTEGER NOT NULL REFERENCES order_items (id) ON DELETE CASCADE,
        ingredient_id INTEGER NOT NULL REFERENCES ingredients (id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS status_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        status_label TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        data TEXT NOT NULL DEFAULT '{}',
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        sender_id INTEGER NOT NULL REFERENCES users (id),
        sender_type TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id);",
    "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id, is_read);",
    "CREATE INDEX IF NOT EXISTS idx_chat_order ON chat_messages (order_id);",
    "CREATE INDEX IF NOT EXISTS idx_history_order ON status_history (order_id);",
];

pub async fn apply(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
