//! services/api/src/web/middleware.rs
//!
//! Authentication middleware and cookie helpers for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// The name of the auth session cookie.
pub const SESSION_COOKIE: &str = "session";

/// The authenticated caller's account id, injected into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountId(pub i64);

/// Extracts a named cookie's value from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

/// Middleware that validates the auth session cookie and extracts the account id.
///
/// If valid, inserts the `AccountId` into request extensions for handlers to use.
/// If invalid, expired or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = cookie_value(req.headers(), SESSION_COOKIE)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_owned();

    let account_id = state
        .db
        .validate_auth_session(&session_id)
        .await
        .map_err(|e| {
            warn!("Rejected auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(AccountId(account_id));

    Ok(next.run(req).await)
}

/// Resolves the caller's identity without requiring one: a missing, invalid
/// or expired session simply means the caller is anonymous.
pub async fn optional_account(state: &AppState, headers: &HeaderMap) -> Option<AccountId> {
    let session_id = cookie_value(headers, SESSION_COOKIE)?;
    state
        .db
        .validate_auth_session(session_id)
        .await
        .ok()
        .map(AccountId)
}
