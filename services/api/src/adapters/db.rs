//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sabi_assistant_core::domain::{
    Account, AccountCredentials, Exchange, Language, Mode, ModeCount,
};
use sabi_assistant_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::error::ErrorKind;
use sqlx::{FromRow, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.kind() == ErrorKind::UniqueViolation)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    id: i64,
    display_name: String,
    email: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}
impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            id: self.id,
            display_name: self.display_name,
            email: self.email,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: i64,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> AccountCredentials {
        AccountCredentials {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct ExchangeRecord {
    id: i64,
    account_id: Option<i64>,
    mode: String,
    language: String,
    message: String,
    reply: String,
    created_at: DateTime<Utc>,
}
impl ExchangeRecord {
    fn to_domain(self) -> Exchange {
        Exchange {
            id: self.id,
            account_id: self.account_id,
            // Tag parsing is total: rows written by an older mode table
            // decode to the General persona instead of failing.
            mode: Mode::from_tag(&self.mode),
            language: Language::from_tag(&self.language),
            message: self.message,
            reply: self.reply,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_account(
        &self,
        display_name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "INSERT INTO accounts (display_name, email, password_hash, is_admin, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id, display_name, email, is_admin, created_at",
        )
        .bind(display_name)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Duplicate(format!("account with email {}", email))
            } else {
                PortError::Unexpected(e.to_string())
            }
        })?;

        Ok(record.to_domain())
    }

    async fn get_account_by_email(&self, email: &str) -> PortResult<AccountCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM accounts WHERE email = ?1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("account with email {}", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn get_account_by_id(&self, account_id: i64) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "SELECT id, display_name, email, is_admin, created_at FROM accounts WHERE id = ?1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("account {}", account_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn delete_account(&self, account_id: i64) -> PortResult<()> {
        // Auth sessions and exchanges go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("account {}", account_id)));
        }
        Ok(())
    }

    async fn count_accounts(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        account_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, account_id, expires_at) VALUES (?1, ?2, ?3)")
            .bind(session_id)
            .bind(account_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<i64> {
        let row = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "SELECT account_id, expires_at FROM auth_sessions WHERE id = ?1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let (account_id, expires_at) = row.ok_or(PortError::Unauthorized)?;

        if expires_at <= Utc::now() {
            // Expired sessions are dropped on sight so the table stays small.
            sqlx::query("DELETE FROM auth_sessions WHERE id = ?1")
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            return Err(PortError::Unauthorized);
        }

        Ok(account_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn record_exchange(
        &self,
        account_id: Option<i64>,
        mode: Mode,
        language: Language,
        message: &str,
        reply: &str,
    ) -> PortResult<Exchange> {
        // One INSERT: the exchange is either fully visible or not at all.
        let record = sqlx::query_as::<_, ExchangeRecord>(
            "INSERT INTO exchanges (account_id, mode, language, message, reply, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             RETURNING id, account_id, mode, language, message, reply, created_at",
        )
        .bind(account_id)
        .bind(mode.as_tag())
        .bind(language.as_tag())
        .bind(message)
        .bind(reply)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn history(&self, account_id: i64, limit: i64) -> PortResult<Vec<Exchange>> {
        let records = sqlx::query_as::<_, ExchangeRecord>(
            "SELECT id, account_id, mode, language, message, reply, created_at \
             FROM exchanges WHERE account_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn recent_exchanges(&self, limit: i64) -> PortResult<Vec<Exchange>> {
        let records = sqlx::query_as::<_, ExchangeRecord>(
            "SELECT id, account_id, mode, language, message, reply, created_at \
             FROM exchanges ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_exchanges(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exchanges")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn count_exchanges_by_mode(&self) -> PortResult<Vec<ModeCount>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT mode, COUNT(*) FROM exchanges GROUP BY mode ORDER BY mode",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(tag, count)| ModeCount {
                mode: Mode::from_tag(&tag),
                count,
            })
            .collect())
    }
}
