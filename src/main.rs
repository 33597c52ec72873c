use dotenvy::dotenv;
use seo_pages::{config::Settings, create_app, AppState};
use tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load .env (if present) before reading settings
    let _ = dotenv();
    let settings = Settings::from_env()?;
    let bind_addr = settings.bind_addr.clone();

    let state = AppState::from_settings(settings).await?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
