//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, IpqsSafetyAdapter, OpenAiChatAdapter},
    config::Config,
    error::ApiError,
    web::{
        admin::usage_handler,
        auth::{delete_account_handler, login_handler, logout_handler, signup_handler},
        chat::chat_handler,
        history::history_handler,
        middleware::require_auth,
        state::{AppState, GuestQuota},
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use sabi_assistant_core::ports::LinkSafetyService;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);
    let gateway = Arc::new(OpenAiChatAdapter::new(
        openai_client,
        config.chat_model.clone(),
    ));

    let safety: Option<Arc<dyn LinkSafetyService>> = match &config.ipqs_api_key {
        Some(key) => {
            info!("URL reputation checks enabled for scam-check mode");
            Some(Arc::new(IpqsSafetyAdapter::new(
                config.ipqs_api_url.clone(),
                key.clone(),
            )))
        }
        None => {
            info!("No IPQS_API_KEY set; scam-check replies will carry no safety annotations");
            None
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        gateway,
        safety,
        config: config.clone(),
        guest_quota: GuestQuota::new(),
    });

    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required; /api/chat resolves identity itself)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/api/chat", post(chat_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/account", delete(delete_account_handler))
        .route("/api/history", get(history_handler))
        .route("/admin/usage", get(usage_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
