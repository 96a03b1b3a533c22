use servesoft::config::configuration::Settings;
use servesoft::db::{establish_connection, run_migrations};
use servesoft::startup::Application;
use servesoft::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    let subscriber = get_subscriber("servesoft".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = Settings::new().expect("Failed to load configurations");
    run_migrations(&config.database.url)
        .await
        .expect("Failed to run database migrations");
    let pool = establish_connection(&config.database).await;

    let application = Application::build(config, pool).await?;
    tracing::info!(port = application.port(), "ServeSoft is listening");
    application.run_until_stopped().await?;
    Ok(())
}
