//! crates/sabi_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{Account, AccountCredentials, Exchange, Language, Mode, ModeCount};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Duplicate(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Completion Gateway Types
//=========================================================================================

/// Whether a gateway failure is worth retrying later or is a hard failure.
/// The chat flow treats both the same way at request level (fallback reply);
/// the distinction matters for logging and for callers that do retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Transient,
    Permanent,
}

/// A failure reported by an external collaborator (LLM gateway, URL checker).
#[derive(Debug, thiserror::Error)]
#[error("{kind:?} gateway failure: {message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Permanent,
            message: message.into(),
        }
    }
}

/// Sampling parameters passed with every completion request.
/// The model selector lives in the adapter, next to its client.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_reply_tokens: u32,
}

/// The verdict returned by the link/content safety checker.
#[derive(Debug, Clone)]
pub struct SafetyVerdict {
    pub is_unsafe: bool,
    pub reason: Option<String>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Accounts ---
    async fn create_account(
        &self,
        display_name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> PortResult<Account>;

    async fn get_account_by_email(&self, email: &str) -> PortResult<AccountCredentials>;

    async fn get_account_by_id(&self, account_id: i64) -> PortResult<Account>;

    /// Removes the account and, by cascade, its auth sessions and exchanges.
    async fn delete_account(&self, account_id: i64) -> PortResult<()>;

    async fn count_accounts(&self) -> PortResult<i64>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        account_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a session id to an account id. Missing or expired sessions
    /// yield `PortError::Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<i64>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Interaction Log ---
    /// Appends one exchange atomically. `account_id` is `None` for
    /// unauthenticated callers.
    async fn record_exchange(
        &self,
        account_id: Option<i64>,
        mode: Mode,
        language: Language,
        message: &str,
        reply: &str,
    ) -> PortResult<Exchange>;

    /// The account's exchanges, newest first.
    async fn history(&self, account_id: i64, limit: i64) -> PortResult<Vec<Exchange>>;

    /// The most recent exchanges across all accounts, newest first.
    async fn recent_exchanges(&self, limit: i64) -> PortResult<Vec<Exchange>>;

    async fn count_exchanges(&self) -> PortResult<i64>;

    async fn count_exchanges_by_mode(&self) -> PortResult<Vec<ModeCount>>;
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a finished prompt to the hosted model and returns the reply text.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, GatewayError>;
}

#[async_trait]
pub trait LinkSafetyService: Send + Sync {
    /// Checks a candidate URL (or raw text) against a reputation service.
    async fn check(&self, candidate: &str) -> Result<SafetyVerdict, GatewayError>;
}
