use bistro_common::Cents;
use bistro_engine::{db_types::Role, SqliteDatabase};
use rand::random;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    let n: u64 = random();
    format!("sqlite://{}/bistro_test_{n}.db", std::env::temp_dir().display())
}

/// A freshly created database seeded with two users and a small catalog.
pub struct TestEnv {
    pub db: SqliteDatabase,
    pub customer_id: i64,
    pub staff_id: i64,
    pub tacos_id: i64,
    pub harissa_id: i64,
    pub cheddar_id: i64,
    pub oignons_id: i64,
}

pub async fn seeded_env() -> TestEnv {
    let _ = env_logger::try_init();
    let url = random_db_path();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let customer_id = db.add_user("Alice", Role::Customer, "alice-token").await.expect("Error adding customer");
    let staff_id = db.add_user("Bob", Role::Staff, "bob-token").await.expect("Error adding staff");
    let tacos_id = db
        .add_dish("Tacos", Cents::from(900), false, &[("M", Cents::from(0)), ("L", Cents::from(150))])
        .await
        .expect("Error adding dish");
    let harissa_id = db.add_sauce("Harissa", Cents::from(100)).await.expect("Error adding sauce");
    let cheddar_id = db.add_extra("Cheddar", Cents::from(150)).await.expect("Error adding extra");
    let oignons_id = db.add_ingredient("Oignons").await.expect("Error adding ingredient");
    TestEnv { db, customer_id, staff_id, tacos_id, harissa_id, cheddar_id, oignons_id }
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    Sqlite::drop_database(&url).await.expect("Error dropping test database");
}
