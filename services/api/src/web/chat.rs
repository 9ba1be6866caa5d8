//! services/api/src/web/chat.rs
//!
//! The chat submission flow: identity, quota, prompt, gateway call,
//! fallback substitution, safety annotation and the exchange record.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use sabi_assistant_core::domain::{Language, Mode};
use sabi_assistant_core::ports::CompletionOptions;
use sabi_assistant_core::prompt::build_prompt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::{cookie_value, optional_account};
use crate::web::state::AppState;

/// The canned apology substituted whenever the gateway fails or returns a
/// degenerate reply. Gateway trouble is never surfaced to the end user.
pub const FALLBACK_REPLY: &str =
    "Sorry, I could not come up with a proper answer right now. Please try again in a moment.";

/// The marker prepended to scam-check replies when the reputation checker
/// flags the submitted content.
pub const SAFETY_WARNING: &str = "⚠️ SAFETY WARNING";

// Replies shorter than this are treated as degenerate.
const MIN_REPLY_LEN: usize = 10;

const GUEST_COOKIE: &str = "guest_id";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub lang: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /api/chat - Submit a message and receive the assistant's reply
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply generated", body = ChatResponse),
        (status = 400, description = "Empty message"),
        (status = 429, description = "Guest message limit reached"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Response, (StatusCode, String)> {
    // 1. Resolve the optional caller identity (expired session = anonymous)
    let account = optional_account(&state, &headers).await;

    // 2. Enforce the guest quota when one is configured
    let mut issued_guest_id = None;
    if account.is_none() {
        if let Some(limit) = state.config.guest_message_limit {
            let guest_id = match cookie_value(&headers, GUEST_COOKIE) {
                Some(id) => id.to_string(),
                None => {
                    let id = Uuid::new_v4().to_string();
                    issued_guest_id = Some(id.clone());
                    id
                }
            };
            if !state.guest_quota.try_consume(&guest_id, limit) {
                return Err((
                    StatusCode::TOO_MANY_REQUESTS,
                    "Free message limit reached. Register to keep chatting.".to_string(),
                ));
            }
        }
    }

    // 3. Run the exchange itself
    let reply = run_exchange(&state, account.map(|a| a.0), &req).await?;

    let mut response = Json(ChatResponse { reply }).into_response();
    if let Some(guest_id) = issued_guest_id {
        let cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", GUEST_COOKIE, guest_id);
        if let Ok(value) = header::HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}

//=========================================================================================
// The Exchange Flow
//=========================================================================================

/// Runs one full submission: prompt, gateway, fallback, safety annotation,
/// exchange record. Returns the reply text handed back to the caller.
pub async fn run_exchange(
    state: &AppState,
    account_id: Option<i64>,
    req: &ChatRequest,
) -> Result<String, (StatusCode, String)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Message must not be empty".to_string(),
        ));
    }

    let mode = Mode::from_tag(&req.mode);
    let language = Language::from_tag(&req.lang);

    let prompt = build_prompt(mode, language, message);
    let options = CompletionOptions {
        temperature: state.config.chat_temperature,
        max_reply_tokens: state.config.max_reply_tokens,
    };

    // The gateway is the one slow await in the flow; a timeout counts as a
    // transient failure and takes the fallback path like any other.
    let reply = match tokio::time::timeout(
        state.config.gateway_timeout,
        state.gateway.complete(&prompt, &options),
    )
    .await
    {
        Ok(Ok(text)) if !is_degenerate(&text) => text.trim().to_string(),
        Ok(Ok(text)) => {
            warn!(
                "Gateway returned a degenerate reply ({} chars); substituting fallback",
                text.trim().len()
            );
            FALLBACK_REPLY.to_string()
        }
        Ok(Err(e)) => {
            warn!("Completion gateway failed: {}; substituting fallback", e);
            FALLBACK_REPLY.to_string()
        }
        Err(_) => {
            warn!(
                "Completion gateway timed out after {:?}; substituting fallback",
                state.config.gateway_timeout
            );
            FALLBACK_REPLY.to_string()
        }
    };

    let reply = if mode == Mode::ScamCheck {
        annotate_if_unsafe(state, message, reply).await
    } else {
        reply
    };

    // Fallback replies are recorded too: an exchange never has empty output.
    let exchange = state
        .db
        .record_exchange(account_id, mode, language, message, &reply)
        .await
        .map_err(|e| {
            error!("Failed to record exchange: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record the exchange".to_string(),
            )
        })?;
    info!(
        "Recorded exchange {} (mode {}, language {})",
        exchange.id,
        mode.as_tag(),
        language.as_tag()
    );

    Ok(exchange.reply)
}

/// Mirrors the degenerate-reply rule: missing, too short, or a reply that
/// itself reports an error all take the fallback path.
fn is_degenerate(reply: &str) -> bool {
    let trimmed = reply.trim();
    trimmed.len() < MIN_REPLY_LEN || trimmed.to_lowercase().contains("error")
}

/// Asks the reputation checker about the submitted content and prepends the
/// warning marker when it comes back unsafe. A failing or absent checker
/// degrades to the unannotated reply.
async fn annotate_if_unsafe(state: &AppState, message: &str, reply: String) -> String {
    let Some(checker) = &state.safety else {
        return reply;
    };

    let candidate = extract_url(message).unwrap_or(message);
    match checker.check(candidate).await {
        Ok(verdict) if verdict.is_unsafe => {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "flagged by the reputation checker".to_string());
            info!("Reputation checker flagged a submission: {}", reason);
            format!("{}: this looks unsafe ({}).\n\n{}", SAFETY_WARNING, reason, reply)
        }
        Ok(_) => reply,
        Err(e) => {
            warn!("Safety checker failed: {}; returning unannotated reply", e);
            reply
        }
    }
}

/// Picks the first http(s) URL out of the message, if any.
fn extract_url(text: &str) -> Option<&str> {
    let re = Regex::new(r"https?://[^\s)>\]]+").ok()?;
    re.find(text).map(|m| m.as_str())
}
