//! Book service entry point.

use std::sync::Arc;

use book_service::{BookServiceConfig, PostgresBookStore};
use common::HttpAuthenticator;
use common::telemetry::{init_tracing, metrics_handle};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    common::config::load_dotenv();
    let config = BookServiceConfig::from_env()?;

    // 2. Initialize tracing and metrics
    init_tracing(&config.server);
    let metrics_handle = metrics_handle();

    // 3. Connect to the database and apply migrations
    let pool = PgPoolOptions::new()
        .connect(config.database_url.expose_secret())
        .await?;
    let store = PostgresBookStore::new(pool);
    store.run_migrations().await?;
    tracing::info!("database migrations applied");

    // 4. Build the application
    let authenticator = Arc::new(HttpAuthenticator::new(
        reqwest::Client::new(),
        config.auth_endpoint.clone(),
    ));
    let app = book_service::create_app(
        book_service::create_state(store),
        authenticator,
        metrics_handle,
    );

    // 5. Start server
    common::server::serve(&config.server, app).await?;
    Ok(())
}
