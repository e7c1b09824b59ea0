//! User service entry point.

use common::telemetry::{init_tracing, metrics_handle};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use user_service::{PostgresUserStore, UserServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    common::config::load_dotenv();
    let config = UserServiceConfig::from_env()?;

    // 2. Initialize tracing and metrics
    init_tracing(&config.server);
    let metrics_handle = metrics_handle();

    // 3. Connect to the database and apply migrations
    let pool = PgPoolOptions::new()
        .connect(config.database_url.expose_secret())
        .await?;
    let store = PostgresUserStore::new(pool);
    store.run_migrations().await?;
    tracing::info!("database migrations applied");

    // 4. Build the application
    let state = user_service::create_state(store, &config);
    let app = user_service::create_app(state, metrics_handle);

    // 5. Start server
    common::server::serve(&config.server, app).await?;
    Ok(())
}
