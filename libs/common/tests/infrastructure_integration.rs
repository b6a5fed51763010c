//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database and Redis cache are
//! properly configured and accessible from the application. They assume a
//! local stack and are ignored by default.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn infrastructure_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config)?;

    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let test_key = "integration_test_key";
    redis_pool.set(test_key, "integration_test_value", Some(10)).await?;

    let retrieved = redis_pool.get(test_key).await?;
    assert_eq!(
        retrieved,
        Some("integration_test_value".to_string()),
        "Redis SET/GET test failed"
    );

    redis_pool.delete(test_key).await?;
    assert_eq!(redis_pool.get(test_key).await?, None);

    Ok(())
}
