use dotenvy::dotenv;
use std::sync::Arc;
use storefront::{
    api::{self, AppState},
    config::{self, database, statuses::seed_statuses},
    core::status::StatusCatalog,
    errors::Result,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install SIGINT handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, starting graceful shutdown"),
        () = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal: variables can be set externally
    if dotenv().is_err() {
        info!("No .env file loaded");
    }

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        bind_address = %app_config.bind_address,
        isolation = ?app_config.transaction_isolation,
        "Configuration loaded"
    );

    // 4. Connect and make sure the schema exists
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Status reference data, then resolve the ids once for the whole process
    if app_config.seed_reference_data {
        seed_statuses(&db).await?;
    } else {
        warn!("Reference data seeding disabled; statuses must already exist");
    }
    let statuses = StatusCatalog::new()
        .load_statuses(&db)
        .await
        .inspect_err(|e| error!("Status reference data incomplete: {}", e))?;

    // 6. Serve
    let state = Arc::new(AppState {
        db,
        statuses,
        isolation: app_config.transaction_isolation,
        request_timeout: app_config.request_timeout(),
    });
    let app = api::create_app(state);

    let listener = tokio::net::TcpListener::bind(&app_config.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", app_config.bind_address, e))?;
    info!(addr = %app_config.bind_address, "starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down gracefully");
    Ok(())
}
