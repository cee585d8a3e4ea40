use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/campspot";
const MAX_CONNECTIONS: u32 = 10;

/// Creates a connection pool to the PostgreSQL database named by `DATABASE_URL`.
pub async fn create_connection_pool() -> Result<PgPool, sqlx::Error> {
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        log::warn!("DATABASE_URL is not set, using {}", DEFAULT_DATABASE_URL);
        DEFAULT_DATABASE_URL.to_string()
    });

    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(&database_url)
        .await
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Tests the database connection by executing a simple query.
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    let row = sqlx::query("SELECT 1 as test").fetch_one(pool).await?;

    let test_value: i32 = row.get("test");
    log::info!("Database connection successful (test value {})", test_value);

    Ok(())
}
