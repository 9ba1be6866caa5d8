//! services/api/src/web/admin.rs
//!
//! The administrator-only usage report: account and exchange totals,
//! per-mode counts, and the most recent exchanges across all accounts.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::web::history::ExchangeView;
use crate::web::middleware::AccountId;
use crate::web::state::AppState;

const DEFAULT_RECENT: i64 = 10;
const MAX_RECENT: i64 = 100;

//=========================================================================================
// Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UsageResponse {
    pub total_accounts: i64,
    pub total_exchanges: i64,
    pub exchanges_by_mode: BTreeMap<String, i64>,
    pub recent_exchanges: Vec<ExchangeView>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsageQuery {
    /// How many recent exchanges to include.
    pub recent: Option<i64>,
}

//=========================================================================================
// Handler
//=========================================================================================

/// GET /admin/usage - Aggregated usage, administrators only
#[utoipa::path(
    get,
    path = "/admin/usage",
    params(UsageQuery),
    responses(
        (status = 200, description = "Usage report", body = UsageResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn usage_handler(
    State(state): State<Arc<AppState>>,
    Extension(account_id): Extension<AccountId>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageResponse>, (StatusCode, String)> {
    let account = state.db.get_account_by_id(account_id.0).await.map_err(|e| {
        error!("Failed to load account for admin check: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load account".to_string(),
        )
    })?;

    // The configured allow-list is authoritative at request time.
    let allowed = state
        .config
        .admin_emails
        .iter()
        .any(|admin| admin == &account.email);
    if !allowed {
        warn!(
            "Account {} requested the usage report without admin access",
            account.id
        );
        return Err((
            StatusCode::FORBIDDEN,
            "Administrator access required".to_string(),
        ));
    }

    let internal = |e: sabi_assistant_core::ports::PortError| {
        error!("Failed to aggregate usage: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to aggregate usage".to_string(),
        )
    };

    let total_accounts = state.db.count_accounts().await.map_err(internal)?;
    let total_exchanges = state.db.count_exchanges().await.map_err(internal)?;

    let exchanges_by_mode = state
        .db
        .count_exchanges_by_mode()
        .await
        .map_err(internal)?
        .into_iter()
        .map(|c| (c.mode.as_tag().to_string(), c.count))
        .collect();

    let recent = query.recent.unwrap_or(DEFAULT_RECENT).clamp(1, MAX_RECENT);
    let recent_exchanges = state
        .db
        .recent_exchanges(recent)
        .await
        .map_err(internal)?
        .into_iter()
        .map(ExchangeView::from)
        .collect();

    Ok(Json(UsageResponse {
        total_accounts,
        total_exchanges,
        exchanges_by_mode,
        recent_exchanges,
    }))
}
