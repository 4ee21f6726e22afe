//! Common test utilities
//!
//! Integration tests need a reachable MySQL instance; they skip
//! themselves when `DATABASE_URL` is unset or the connection fails.

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

pub async fn get_test_pool() -> Result<MySqlPool, sqlx::Error> {
    let _ = dotenvy::dotenv();

    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| {
            sqlx::Error::Configuration("TEST_DATABASE_URL / DATABASE_URL not set".into())
        })?;

    MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
}

/// Run migrations
pub async fn setup_database(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Clean up test data
pub async fn cleanup_database(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for table in [
        "user_activity",
        "notifications",
        "saved_articles",
        "writer_requests",
        "articles",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await?;
    }
    Ok(())
}
