use emi_ledger::{
    api::{self, AppState, auth::HeaderIdentity},
    config::{self, database},
    errors::Result,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env first so RUST_LOG from it reaches the filter; missing file is fine
    let env_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if env_loaded {
        info!("Loaded .env file");
    }

    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    database::ensure_sqlite_parent_dir(&app_config.database_url)?;
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    let identity = HeaderIdentity::new(&app_config.identity_header)?;
    info!("Reading caller identity from '{}'", app_config.identity_header);
    let state = AppState::new(db.clone(), Arc::new(identity));

    let listener = TcpListener::bind(&app_config.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {e}", app_config.bind_address))?;

    api::serve(listener, state).await?;

    db.close().await?;
    info!("Database connection closed");
    Ok(())
}
