// Library exports for the Revly backend core
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselDatabaseConfig, DieselPool};
pub use middleware::AuthenticatedUser;
pub use models::{Company, Order, PaymentPreference, User};
pub use services::{
    identify_tenant, review_eligibility, ConvomatError, ConvomatService, NotificationService,
    OrderService,
};
pub use utils::{escape_like, ListQuery, ServiceError};

use axum::routing::get;
use axum::Router;
use diesel::Connection;
use diesel_migrations::MigrationHarness;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

// Library initialization function for external consumers
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // Load environment
    dotenv::dotenv().ok();

    // Initialize config
    let config = app_config::config();

    // Initialize database pool
    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::default();
    let max_connections = db_config.max_connections;
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    // Run embedded migrations unless disabled
    if !config.disable_embedded_migrations {
        info!("Running embedded migrations...");
        run_embedded_migrations(&config.database_url).await?;
    }

    // Initialize services
    let convomat = Arc::new(ConvomatService::new(&config.convomat));
    let notifications = Arc::new(NotificationService::new(config.email.clone()));

    Ok(AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        convomat,
        notifications,
        max_connections,
    })
}

/// Embedded migrations run on a blocking sync connection
async fn run_embedded_migrations(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = database_url.to_string();
    let result = tokio::task::spawn_blocking(move || -> Result<(), String> {
        let mut conn =
            diesel::pg::PgConnection::establish(&url).map_err(|e| e.to_string())?;
        conn.run_pending_migrations(db::MIGRATIONS)
            .map_err(|e| e.to_string())?;
        Ok(())
    })
    .await?;

    result.map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    Ok(())
}

// Full application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(handlers::company_routes())
        .merge(handlers::order_routes())
        .merge(handlers::user_routes())
        .merge(handlers::admin_routes());

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Health check handler
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let timestamp = chrono::Utc::now().to_rfc3339();

    let (overall_healthy, postgres_health) = match db::check_diesel_health(&state.diesel_pool).await
    {
        Ok(_) => (
            true,
            serde_json::json!({
                "status": "healthy",
                "max_connections": state.max_connections,
                "error": null
            }),
        ),
        Err(e) => (
            false,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            }),
        ),
    };

    let response = serde_json::json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "revly-backend",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
