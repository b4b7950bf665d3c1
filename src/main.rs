use outlet_numbering::{
    api::{self, AppState},
    config::{database, settings},
    core::NumberAllocator,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load application settings
    let app_settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    info!(
        "Business timezone: {}, allocation attempts: {}",
        app_settings.numbering.timezone, app_settings.numbering.max_attempts
    );

    // 4. Connect and ensure schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Serve HTTP
    let allocator = NumberAllocator::from_settings(&app_settings.numbering);
    let app = api::router(AppState::new(db, allocator));

    let listener = tokio::net::TcpListener::bind(&app_settings.server.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", app_settings.server.bind_address, e))?;
    info!("Listening on {}", app_settings.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::from)?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
