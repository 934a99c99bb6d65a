use crate::{
    auth::auth_dto::{
        AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, RegisterResponse,
        ResetPasswordRequest, UpdateEmailRequest, UpdateLocationRequest, VerifyOtpRequest,
        VerifyOtpResponse,
    },
    auth::auth_handlers,
    item::item_dto::{BrowseResponse, SavedItemsResponse, SuggestionsResponse},
    item::item_handlers,
    item::item_models::{Category, Item, ItemWithSeller, Photo},
    message::message_dto::{
        CreateConversationRequest, HasMessagesResponse, SendMessageRequest,
    },
    message::message_handlers,
    message::message_models::{Conversation, LocationData, Message, MessageTemplate},
    middleware::auth_middleware,
    state::AppState,
    user::user_dto::UpdateProfileRequest,
    user::user_handlers,
    user::user_models::{PublicProfile, User, UserResponse},
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth_handlers::register,
        auth_handlers::login,
        user_handlers::get_current_user,
        user_handlers::update_current_user,
        item_handlers::browse_items,
        item_handlers::create_item,
        item_handlers::get_item,
        message_handlers::list_conversations,
        message_handlers::create_conversation,
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            AuthResponse,
            ForgotPasswordRequest,
            VerifyOtpRequest,
            VerifyOtpResponse,
            ResetPasswordRequest,
            UpdateEmailRequest,
            UpdateLocationRequest,
            UpdateProfileRequest,
            User,
            UserResponse,
            PublicProfile,
            Category,
            Item,
            ItemWithSeller,
            Photo,
            BrowseResponse,
            SuggestionsResponse,
            SavedItemsResponse,
            Conversation,
            Message,
            MessageTemplate,
            LocationData,
            CreateConversationRequest,
            SendMessageRequest,
            HasMessagesResponse,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User profile endpoints"),
        (name = "items", description = "Listing endpoints"),
        (name = "messages", description = "Conversation and messaging endpoints")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/verify/:token", get(auth_handlers::verify_email))
        .route("/forgot-password", post(auth_handlers::forgot_password))
        .route("/verify-otp", post(auth_handlers::verify_otp))
        .route("/reset-password", post(auth_handlers::reset_password))
        .route(
            "/verify-email-change/:token",
            get(auth_handlers::verify_email_change),
        )
        .route(
            "/update-email",
            put(auth_handlers::update_email).route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    // Protected routes (auth required)
    let user_routes = Router::new()
        .route(
            "/me",
            get(user_handlers::get_current_user).put(user_handlers::update_current_user),
        )
        .route("/me/location", put(user_handlers::update_location))
        .route(
            "/me/photo",
            post(user_handlers::upload_photo).layer(DefaultBodyLimit::max(5 * 1024 * 1024)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route("/:id", get(user_handlers::get_public_profile));

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    // Browse, categories, suggestions, and detail are public; identity is
    // picked up opportunistically from the bearer token when present.
    // Mutating methods on the shared paths carry the auth layer per-method.
    let item_routes = Router::new()
        .route(
            "/",
            post(item_handlers::create_item)
                .layer::<_, std::convert::Infallible>(require_auth.clone())
                // 10 photos at up to 10 MB each
                .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
                .get(item_handlers::browse_items),
        )
        .route("/categories", get(item_handlers::list_categories))
        .route("/suggestions", get(item_handlers::search_suggestions))
        .route(
            "/my-listings",
            get(item_handlers::my_listings).layer(require_auth.clone()),
        )
        .route(
            "/saved",
            get(item_handlers::saved_items).layer(require_auth.clone()),
        )
        .route(
            "/:id/save",
            post(item_handlers::toggle_save).layer(require_auth.clone()),
        )
        .route(
            "/:id",
            put(item_handlers::update_item)
                .delete(item_handlers::delete_item)
                .layer::<_, std::convert::Infallible>(require_auth)
                .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
                .get(item_handlers::get_item),
        );

    let message_routes = Router::new()
        .route(
            "/conversations",
            get(message_handlers::list_conversations)
                .post(message_handlers::create_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(message_handlers::list_messages).post(message_handlers::send_message),
        )
        .route("/conversations/:id/read", put(message_handlers::mark_read))
        .route(
            "/conversations/:id/archive",
            put(message_handlers::archive_conversation),
        )
        .route(
            "/conversations/:id/has-messages",
            get(message_handlers::has_messages),
        )
        .route("/templates", get(message_handlers::list_templates))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    let api_routes = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/items", item_routes)
        .nest("/messages", message_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
