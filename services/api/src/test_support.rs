//! services/api/src/test_support.rs
//!
//! Shared fixtures for this crate's test modules: a migrated throwaway
//! database, a baseline config, and canned port implementations.

use crate::adapters::db::DbAdapter;
use crate::config::Config;
use crate::web::state::{AppState, GuestQuota};
use async_trait::async_trait;
use sabi_assistant_core::ports::{
    CompletionOptions, CompletionService, GatewayError, LinkSafetyService, SafetyVerdict,
};
use sabi_assistant_core::PasswordPolicy;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::Level;

// A pooled `sqlite::memory:` database hands every connection its own empty
// store, so tests run against a file in a temp directory instead. A single
// connection keeps every query on the same store, so a write is always
// visible to the read that follows it.
pub async fn test_adapter() -> (TempDir, DbAdapter) {
    let dir = tempfile::tempdir().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    let adapter = DbAdapter::new(pool);
    adapter.run_migrations().await.unwrap();
    (dir, adapter)
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: Level::INFO,
        cors_origin: "http://localhost:3000".to_string(),
        openai_api_key: None,
        chat_model: "test-model".to_string(),
        chat_temperature: 0.7,
        max_reply_tokens: 256,
        gateway_timeout: Duration::from_secs(5),
        admin_emails: vec!["root@sabi.app".to_string()],
        password_policy: PasswordPolicy::default(),
        guest_message_limit: None,
        ipqs_api_key: None,
        ipqs_api_url: "https://www.ipqualityscore.com/api/json/url".to_string(),
    }
}

pub async fn test_state(
    gateway: Arc<dyn CompletionService>,
    safety: Option<Arc<dyn LinkSafetyService>>,
    config: Config,
) -> (TempDir, Arc<AppState>) {
    let (dir, db) = test_adapter().await;
    let state = Arc::new(AppState {
        db: Arc::new(db),
        gateway,
        safety,
        config: Arc::new(config),
        guest_quota: GuestQuota::new(),
    });
    (dir, state)
}

pub async fn test_state_default() -> (TempDir, Arc<AppState>) {
    test_state(Arc::new(StubGateway::new("a perfectly helpful reply")), None, test_config()).await
}

//=========================================================================================
// Canned Port Implementations
//=========================================================================================

pub struct StubGateway {
    reply: String,
}

impl StubGateway {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl CompletionService for StubGateway {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        Ok(self.reply.clone())
    }
}

/// A gateway that always reports a transient outage.
pub struct FailingGateway;

#[async_trait]
impl CompletionService for FailingGateway {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::transient("simulated outage"))
    }
}

/// A gateway that answers correctly but only after `delay`.
pub struct SlowGateway {
    pub delay: Duration,
    pub reply: String,
}

#[async_trait]
impl CompletionService for SlowGateway {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

pub struct StubSafety {
    pub verdict: SafetyVerdict,
}

#[async_trait]
impl LinkSafetyService for StubSafety {
    async fn check(&self, _candidate: &str) -> Result<SafetyVerdict, GatewayError> {
        Ok(self.verdict.clone())
    }
}

pub struct FailingSafety;

#[async_trait]
impl LinkSafetyService for FailingSafety {
    async fn check(&self, _candidate: &str) -> Result<SafetyVerdict, GatewayError> {
        Err(GatewayError::transient("checker down"))
    }
}
