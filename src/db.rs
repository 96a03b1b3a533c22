use crate::config::configuration::DatabaseSettings;
use deadpool::Runtime;
use diesel::sql_query;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use diesel_async_migrations::{embed_migrations, EmbeddedMigrations};
use std::time::Duration;

pub type PgPool = Pool<AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/******************************************/
// Establishing Db Connection Pool
/******************************************/
pub async fn establish_connection(settings: &DatabaseSettings) -> PgPool {
    build_pool(
        &settings.url,
        settings.max_connections,
        settings.acquire_timeout_secs,
    )
}

pub fn build_pool(database_url: &str, max_connections: usize, acquire_timeout_secs: u64) -> PgPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder(manager)
        .max_size(max_connections)
        .wait_timeout(Some(Duration::from_secs(acquire_timeout_secs)))
        .runtime(Runtime::Tokio1)
        .build()
        .expect("Failed to create pool.")
}

/******************************************/
// Running embedded migrations
/******************************************/
pub async fn run_migrations(database_url: &str) -> Result<(), diesel::result::Error> {
    let mut conn = AsyncPgConnection::establish(database_url)
        .await
        .map_err(|err| diesel::result::Error::QueryBuilderError(Box::new(err)))?;
    MIGRATIONS.run_pending_migrations(&mut conn).await?;
    tracing::info!("Database migrations are up to date");
    Ok(())
}

/******************************************/
// Creating new db for tests
/******************************************/
pub async fn create_database(maintenance_url: &str, database_name: &str) {
    let mut connection = AsyncPgConnection::establish(maintenance_url)
        .await
        .expect("Failed to connect to Postgres");

    let create_db_query = format!(r#"CREATE DATABASE "{}";"#, database_name);
    sql_query(&create_db_query)
        .execute(&mut connection)
        .await
        .expect("Failed to create database");
    tracing::info!(database = %database_name, "Database created");
}

/******************************************/
// Dropping db code
/******************************************/
pub async fn drop_database(maintenance_url: &str, database_name: &str) {
    let mut connection = match AsyncPgConnection::establish(maintenance_url).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to the maintenance database");
            return;
        }
    };

    // A database with live connections cannot be dropped
    let terminate_query = format!(
        r#"
        SELECT pg_terminate_backend(pid)
        FROM pg_stat_activity
        WHERE datname = '{}';
    "#,
        database_name
    );

    if let Err(e) = sql_query(&terminate_query).execute(&mut connection).await {
        tracing::error!(error = %e, "Failed to terminate connections");
        return;
    }

    let drop_query = format!(r#"DROP DATABASE IF EXISTS "{}";"#, database_name);

    if let Err(e) = sql_query(&drop_query).execute(&mut connection).await {
        tracing::error!(error = %e, "Failed to drop database");
    } else {
        tracing::info!(database = %database_name, "Database dropped");
    }
}
