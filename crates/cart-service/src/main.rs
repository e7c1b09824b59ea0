//! Cart service entry point.

use std::sync::Arc;

use cart_service::{CartServiceConfig, HttpBookCatalog, PostgresCartStore};
use common::HttpAuthenticator;
use common::telemetry::{init_tracing, metrics_handle};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    common::config::load_dotenv();
    let config = CartServiceConfig::from_env()?;

    // 2. Initialize tracing and metrics
    init_tracing(&config.server);
    let metrics_handle = metrics_handle();

    // 3. Connect to the database and apply migrations
    let pool = PgPoolOptions::new()
        .connect(config.database_url.expose_secret())
        .await?;
    let store = PostgresCartStore::new(pool);
    store.run_migrations().await?;
    tracing::info!("database migrations applied");

    // 4. Wire the upstream services
    let client = reqwest::Client::new();
    let authenticator = Arc::new(HttpAuthenticator::new(
        client.clone(),
        config.auth_endpoint.clone(),
    ));
    let catalog = HttpBookCatalog::new(client, config.book_service_url.clone());
    tracing::info!(book_service_url = %config.book_service_url, "book catalog configured");

    // 5. Build the application and start the server
    let app = cart_service::create_app(
        cart_service::create_state(store, catalog),
        authenticator,
        metrics_handle,
    );
    common::server::serve(&config.server, app).await?;
    Ok(())
}
