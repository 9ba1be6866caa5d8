//! services/api/src/web/history.rs
//!
//! The authenticated caller's own exchange history.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sabi_assistant_core::domain::Exchange;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::web::middleware::AccountId;
use crate::web::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

//=========================================================================================
// Response Types
//=========================================================================================

/// One exchange as exposed over the API.
#[derive(Serialize, ToSchema)]
pub struct ExchangeView {
    pub id: i64,
    pub account_id: Option<i64>,
    pub mode: String,
    pub lang: String,
    pub message: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

impl From<Exchange> for ExchangeView {
    fn from(exchange: Exchange) -> Self {
        Self {
            id: exchange.id,
            account_id: exchange.account_id,
            mode: exchange.mode.as_tag().to_string(),
            lang: exchange.language.as_tag().to_string(),
            message: exchange.message,
            reply: exchange.reply,
            created_at: exchange.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum number of exchanges to return (newest first).
    pub limit: Option<i64>,
}

//=========================================================================================
// Handler
//=========================================================================================

/// GET /api/history - The caller's exchanges, newest first
#[utoipa::path(
    get,
    path = "/api/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "The caller's exchanges, newest first", body = [ExchangeView]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(account_id): Extension<AccountId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ExchangeView>>, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let exchanges = state.db.history(account_id.0, limit).await.map_err(|e| {
        error!("Failed to load history: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load history".to_string(),
        )
    })?;

    Ok(Json(exchanges.into_iter().map(ExchangeView::from).collect()))
}
