//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and account removal.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use sabi_assistant_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::{cookie_value, AccountId, SESSION_COOKIE};
use crate::web::state::AppState;

const SESSION_TTL_DAYS: i64 = 30;

// Unknown email and wrong password must be indistinguishable.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub account_id: i64,
    pub name: String,
    pub email: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn session_cookie(session_id: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_secs
    )
}

fn hash_password(password: &str) -> Result<String, (StatusCode, String)> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })
}

/// Creates a fresh auth session row and returns the Set-Cookie value for it.
async fn open_session(state: &AppState, account_id: i64) -> Result<String, (StatusCode, String)> {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

    state
        .db
        .create_auth_session(&session_id, account_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create session".to_string(),
            )
        })?;

    Ok(session_cookie(
        &session_id,
        Duration::days(SESSION_TTL_DAYS).num_seconds(),
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AuthResponse),
        (status = 400, description = "Invalid registration input"),
        (status = 409, description = "An account with this email already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the registration input
    let display_name = req.name.trim();
    if display_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Display name must not be empty".to_string(),
        ));
    }

    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err((
            StatusCode::BAD_REQUEST,
            "A valid email address is required".to_string(),
        ));
    }

    if req.password != req.confirm {
        return Err((
            StatusCode::BAD_REQUEST,
            "Passwords do not match".to_string(),
        ));
    }

    if let Err(weakness) = state.config.password_policy.validate(&req.password) {
        return Err((StatusCode::BAD_REQUEST, weakness.to_string()));
    }

    // 2. Hash the password
    let password_hash = hash_password(&req.password)?;

    // 3. Create the account; the configured allow-list decides the admin flag
    let is_admin = state.config.admin_emails.iter().any(|admin| admin == &email);
    let account = state
        .db
        .create_account(display_name, &email, &password_hash, is_admin)
        .await
        .map_err(|e| match e {
            PortError::Duplicate(_) => (
                StatusCode::CONFLICT,
                "An account with this email already exists".to_string(),
            ),
            other => {
                error!("Failed to create account: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create account".to_string(),
                )
            }
        })?;
    info!("Registered account {} ({})", account.id, account.email);

    // 4. Open an auth session and set the cookie
    let cookie = open_session(&state, account.id).await?;

    let response = AuthResponse {
        account_id: account.id,
        name: account.display_name,
        email: account.email,
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let email = req.email.trim().to_lowercase();

    // 1. Get the stored credentials; an unknown email gets the uniform reply
    let creds = state
        .db
        .get_account_by_email(&email)
        .await
        .map_err(|_| (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()))?;

    // 2. Verify the password
    let parsed_hash = PasswordHash::new(&creds.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()));
    }

    let account = state.db.get_account_by_id(creds.id).await.map_err(|e| {
        error!("Failed to load account after login: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    // 3. Open an auth session and set the cookie
    let cookie = open_session(&state, account.id).await?;

    let response = AuthResponse {
        account_id: account.id,
        name: account.display_name,
        email: account.email,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_id = cookie_value(&headers, SESSION_COOKIE)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to logout".to_string(),
            )
        })?;

    Ok((StatusCode::OK, [(header::SET_COOKIE, session_cookie("", 0))]))
}

/// DELETE /auth/account - Remove the caller's account and its exchanges
#[utoipa::path(
    delete,
    path = "/auth/account",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_account_handler(
    State(state): State<Arc<AppState>>,
    Extension(account_id): Extension<AccountId>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_account(account_id.0)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Account not found".to_string()),
            other => {
                error!("Failed to delete account: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to delete account".to_string(),
                )
            }
        })?;
    info!("Deleted account {} and its exchanges", account_id.0);

    Ok((StatusCode::OK, [(header::SET_COOKIE, session_cookie("", 0))]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state_default;
    use axum::http::HeaderValue;
    use axum::response::Response;

    fn signup(name: &str, email: &str, password: &str, confirm: &str) -> Json<SignupRequest> {
        Json(SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm: confirm.to_string(),
        })
    }

    fn login(email: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    fn extract_session_id(response: &Response) -> String {
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        cookie
            .strip_prefix("session=")
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn register_and_login_scenario() {
        let (_dir, state) = test_state_default().await;

        let created = signup_handler(
            State(state.clone()),
            signup("A", "a@x.com", "Abcd1234", "Abcd1234"),
        )
        .await;
        assert!(created.is_ok());

        let duplicate = signup_handler(
            State(state.clone()),
            signup("B", "a@x.com", "Zxcv9999", "Zxcv9999"),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(duplicate.0, StatusCode::CONFLICT);

        let logged_in = login_handler(State(state.clone()), login("a@x.com", "Abcd1234")).await;
        assert!(logged_in.is_ok());

        let wrong_password = login_handler(State(state.clone()), login("a@x.com", "wrong"))
            .await
            .err()
            .unwrap();
        let unknown_email = login_handler(State(state.clone()), login("b@x.com", "Abcd1234"))
            .await
            .err()
            .unwrap();
        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.0, StatusCode::UNAUTHORIZED);
        // Uniform shape: nothing reveals which of the two checks failed.
        assert_eq!(wrong_password.1, unknown_email.1);
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let (_dir, state) = test_state_default().await;
        let err = signup_handler(
            State(state),
            signup("A", "a@x.com", "Abcd1234", "Abcd1235"),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("match"));
    }

    #[tokio::test]
    async fn weak_passwords_are_rejected() {
        let (_dir, state) = test_state_default().await;
        for weak in ["short1A", "abcd1234", "Abcdefgh"] {
            let err = signup_handler(State(state.clone()), signup("A", "a@x.com", weak, weak))
                .await
                .err()
                .unwrap();
            assert_eq!(err.0, StatusCode::BAD_REQUEST, "{weak} should be rejected");
        }
    }

    #[tokio::test]
    async fn emails_are_normalized_before_storage_and_lookup() {
        let (_dir, state) = test_state_default().await;
        signup_handler(
            State(state.clone()),
            signup("A", "  A@X.com ", "Abcd1234", "Abcd1234"),
        )
        .await
        .ok()
        .unwrap();

        assert!(
            login_handler(State(state.clone()), login("a@x.com", "Abcd1234"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn allow_listed_email_gets_the_admin_flag() {
        let (_dir, state) = test_state_default().await;
        signup_handler(
            State(state.clone()),
            signup("Root", "root@sabi.app", "Abcd1234", "Abcd1234"),
        )
        .await
        .ok()
        .unwrap();
        signup_handler(
            State(state.clone()),
            signup("A", "a@x.com", "Abcd1234", "Abcd1234"),
        )
        .await
        .ok()
        .unwrap();

        let root = state.db.get_account_by_email("root@sabi.app").await.unwrap();
        let plain = state.db.get_account_by_email("a@x.com").await.unwrap();
        assert!(state.db.get_account_by_id(root.id).await.unwrap().is_admin);
        assert!(!state.db.get_account_by_id(plain.id).await.unwrap().is_admin);
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let (_dir, state) = test_state_default().await;
        let response = signup_handler(
            State(state.clone()),
            signup("A", "a@x.com", "Abcd1234", "Abcd1234"),
        )
        .await
        .ok()
        .unwrap()
        .into_response();
        let session_id = extract_session_id(&response);

        assert!(state.db.validate_auth_session(&session_id).await.is_ok());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("session={}", session_id)).unwrap(),
        );
        logout_handler(State(state.clone()), headers)
            .await
            .ok()
            .unwrap();

        assert!(state.db.validate_auth_session(&session_id).await.is_err());
    }

    #[tokio::test]
    async fn deleting_the_account_removes_it() {
        let (_dir, state) = test_state_default().await;
        signup_handler(
            State(state.clone()),
            signup("A", "a@x.com", "Abcd1234", "Abcd1234"),
        )
        .await
        .ok()
        .unwrap();
        let creds = state.db.get_account_by_email("a@x.com").await.unwrap();

        delete_account_handler(State(state.clone()), Extension(AccountId(creds.id)))
            .await
            .ok()
            .unwrap();

        assert!(state.db.get_account_by_email("a@x.com").await.is_err());
        assert_eq!(state.db.count_accounts().await.unwrap(), 0);
    }
}
