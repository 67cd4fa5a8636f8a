use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::error::InfraError;

/// Connect to Postgres and bring the schema up to date.
pub async fn init_db(database_url: &str, max_connections: u32) -> Result<PgPool, InfraError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("Connected to database!");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}
