use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lecturehall::api::router;
use lecturehall::config::AppConfig;
use lecturehall::services::StatusMonitor;
use lecturehall::state::AppState;
use lecturehall::video::YouTubeOembedClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lecturehall=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let monitor = StatusMonitor::new(pool.clone(), config.status_sweep_secs);
    tokio::spawn(monitor.start());

    let video = Arc::new(YouTubeOembedClient::new()?);
    let bind_addr = config.bind_addr;
    let state = AppState {
        db: pool,
        config: Arc::new(config),
        video,
    };

    let app = router(state);

    info!("listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
