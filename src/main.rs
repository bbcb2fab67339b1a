use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pulseboard::{config::Settings, db, error::Result, router, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let settings = Settings::new()?;
    info!(
        time_zone = %settings.tz(),
        default_range = %settings.default_range(),
        "Configuration loaded"
    );

    info!("Connecting to database...");
    let pool = db::create_pool_with(&settings.database_url(), settings.max_connections).await?;
    info!("Database connected");

    // Run migrations
    info!("Running migrations...");
    db::run_migrations(&pool).await?;
    info!("Migrations complete");

    let addr = SocketAddr::new(
        settings.host.parse().unwrap_or([0, 0, 0, 0].into()),
        settings.port,
    );

    let state = AppState::new(pool, settings);

    // CORS layer
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
