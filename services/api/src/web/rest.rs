//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{admin, auth, chat, history};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::delete_account_handler,
        chat::chat_handler,
        history::history_handler,
        admin::usage_handler,
    ),
    components(schemas(
        auth::SignupRequest,
        auth::LoginRequest,
        auth::AuthResponse,
        chat::ChatRequest,
        chat::ChatResponse,
        history::ExchangeView,
        admin::UsageResponse,
    )),
    tags(
        (name = "Sabi Assistant API", description = "API endpoints for the multi-mode chat assistant.")
    )
)]
pub struct ApiDoc;
