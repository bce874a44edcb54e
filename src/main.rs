use anyhow::Context;
use memeverse::{config::Config, routes::create_router, startup};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "memeverse=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        bind_address = %config.bind_address,
        imgflip = %config.imgflip_api_url,
        premium = config.premium_enabled(),
        storage_dir = %config.storage_dir.display(),
        "Configuration loaded"
    );

    // --- Application State ---
    let state = startup::build_state(&config).context("Failed to build application state")?;
    startup::initialize(&state)
        .await
        .context("Failed to initialize stores")?;

    let app = create_router(state);

    // --- Server Startup ---
    tracing::info!("Server listening on http://{}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
