use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revly_backend_core::{build_router, initialize_app_state};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revly_backend_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let state = match initialize_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Initialization failed: {}", e),
            ));
        },
    };

    let bind_address = format!("{}:{}", state.config.bind_address, state.config.port);
    info!("Starting Revly backend on {}", bind_address);

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, router).await
}
