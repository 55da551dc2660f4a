use medfi::{config::AppConfig, create_app, db, AppState};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before reading configuration
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let store = db::open_store(&config).await?;
    let bind_addr = config.bind_addr;
    let app = create_app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
