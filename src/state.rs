use crate::db::DbPool;
use std::sync::Arc;

use crate::auth::auth_service::AuthService;
use crate::item::item_repository::ItemRepository;
use crate::item::item_service::ItemService;
use crate::message::message_repository::MessageRepository;
use crate::message::message_service::MessageService;
use crate::services::email_service::EmailService;
use crate::services::geocoding::GeocodingClient;
use crate::user::user_repository::UserRepository;
use crate::user::user_service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub user_repository: UserRepository,
    pub item_repository: ItemRepository,
    pub message_repository: MessageRepository,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub item_service: ItemService,
    pub message_service: MessageService,
    pub email_service: EmailService,
    pub geocoding: GeocodingClient,
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub frontend_url: String,
    pub upload_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
        }
    }
}
