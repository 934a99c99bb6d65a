mod auth;
mod db;
mod error;
mod item;
mod message;
mod middleware;
mod routes;
mod services;
mod state;
mod user;

use db::{create_pool, run_migrations};
use routes::create_router;
use services::{start_token_sweeper, EmailService, GeocodingClient};
use state::{AppState, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_cart=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    tracing::info!("Connecting to database...");
    let db = create_pool(&database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Create repositories
    let user_repository = crate::user::user_repository::UserRepository::new(db.clone());
    let item_repository = crate::item::item_repository::ItemRepository::new(db.clone());
    let message_repository = crate::message::message_repository::MessageRepository::new(db.clone());
    let verification_repository =
        crate::auth::auth_repository::VerificationRepository::new(db.clone());

    item_repository.seed_default_categories().await?;

    // Create services
    let email_service = EmailService::new(config.frontend_url.clone());
    let geocoding = GeocodingClient::new();
    let auth_service = crate::auth::auth_service::AuthService::new(
        db.clone(),
        user_repository.clone(),
        verification_repository.clone(),
        email_service.clone(),
        config.jwt_secret.clone(),
        config.jwt_expiration_hours,
    );
    let user_service = crate::user::user_service::UserService::new(user_repository.clone());
    let item_service = crate::item::item_service::ItemService::new(item_repository.clone());
    let message_service =
        crate::message::message_service::MessageService::new(message_repository.clone());

    // Create application state
    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        user_repository,
        item_repository,
        message_repository,
        auth_service,
        user_service,
        item_service,
        message_service,
        email_service,
        geocoding,
    };

    // Start the hourly expired-token sweeper
    if let Err(e) = start_token_sweeper(verification_repository).await {
        tracing::error!("Token sweeper failed to start: {:?}", e);
    }

    // Create router
    let app = create_router(state);

    // Start server
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
