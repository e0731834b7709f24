mod api;
mod cache;
mod config;
mod db;
mod state;
mod validation;

use axum::{
    routing::{delete, get, post},
    Router,
};
use state::AppState;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insights_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = db::Database::new(&settings.database.path).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    // Always seed demo data for development
    db.seed_demo_data().expect("Failed to seed demo data");
    tracing::info!("Demo data seeded successfully");

    tracing::info!("Database initialized successfully");

    // Create application state
    let state = AppState::new(db);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Insight routes
        .route("/insights", get(api::insights::get_feed))
        .route("/insights", post(api::insights::create_insight))
        .route("/insights/:id", get(api::insights::get_insight))
        .route("/insights/:id", delete(api::insights::delete_insight))
        .route("/insights/:id/comments", post(api::insights::add_comment))
        // User routes
        .route("/users", post(api::users::upsert_user))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id/insights", get(api::users::get_user_insights))
        // Community routes
        .route("/communities", post(api::communities::create_community))
        .route(
            "/communities/:slug/insights",
            get(api::communities::get_community_insights),
        )
        .with_state(state)
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}

async fn health_check() -> &'static str {
    "OK"
}
