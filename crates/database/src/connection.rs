use crate::error::DbError;
use dotenvy::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

/// Establishes a connection pool to the PostgreSQL database backing the table store.
///
/// An explicit `database_url` wins; otherwise `DATABASE_URL` is read from the
/// environment, after loading `.env` if one exists. The pool is created once
/// by the caller and handed to the backend; nothing here keeps it globally.
pub async fn connect(database_url: Option<&str>, max_connections: u32) -> Result<PgPool, DbError> {
    let database_url = match database_url {
        Some(url) => url.to_string(),
        None => {
            // A missing .env file is fine as long as the variable is set some other way.
            dotenv().ok();
            env::var("DATABASE_URL").map_err(|_e| {
                DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string())
            })?
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;

    Ok(pool)
}

/// Applies the table-store schema.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
