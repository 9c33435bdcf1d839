//! HTTP routes for authentication
//!
//! - POST /api/auth/register - Create an account and open a session
//! - POST /api/auth/login    - Verify credentials and open a session
//! - POST /api/auth/logout   - Close the session, dropping its verifications
//! - GET  /api/auth/me       - Current user
//!
//! Every successful register or login opens a fresh session, so quiz
//! verification never carries over from an earlier login.

use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, PermissionLevel, TokenInput, MIN_PASSWORD_LEN};
use crate::db::schemas::UserDoc;
use crate::routes::helpers::{authenticate, json_response, ok, ApiRequest, FullBody, SuccessResponse};
use crate::routes::views::UserView;
use crate::server::AppState;
use crate::types::{BookwormError, Result};

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 32;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: u64,
    pub user: UserView,
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(BookwormError::Validation(format!(
            "Username must be {} to {} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(BookwormError::Validation(
            "Username may only contain letters, digits, '.', '_' and '-'".into(),
        ));
    }
    Ok(())
}

/// Open a session for `user` and sign a token pointing at it
fn open_session(state: &AppState, user: &UserDoc) -> Result<AuthResponse> {
    let session_id = if user.is_admin {
        state.sessions.open_pinned(user.id)
    } else {
        state.sessions.open(user.id)
    };
    let (token, expires_at) = state.jwt.generate_token(TokenInput {
        user_id: user.id,
        username: user.username.clone(),
        permission_level: PermissionLevel::for_user(user.is_admin),
        session_id,
    })?;

    Ok(AuthResponse {
        token,
        expires_at,
        user: UserView::from(user),
    })
}

/// POST /api/auth/register
pub async fn handle_register(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let body: RegisterRequest = req.json()?;
    let username = body.username.trim();

    validate_username(username)?;
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(BookwormError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(username)
        .to_string();

    let password_hash = hash_password(&body.password)?;
    let user = state
        .store
        .insert_user(UserDoc::new(
            username.to_string(),
            display_name,
            password_hash,
            false,
        ))
        .await?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok(json_response(StatusCode::CREATED, &open_session(state, &user)?))
}

/// POST /api/auth/login
pub async fn handle_login(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let body: LoginRequest = req.json()?;
    if body.username.is_empty() || body.password.is_empty() {
        return Err(BookwormError::BadRequest(
            "Missing required fields: username, password".into(),
        ));
    }

    let invalid = || BookwormError::Unauthorized("Invalid credentials".into());

    let user = match state.store.find_user_by_username(body.username.trim()).await? {
        Some(user) if user.is_active => user,
        _ => {
            warn!("Login failed - unknown or inactive user: {}", body.username);
            return Err(invalid());
        }
    };

    if !verify_password(&body.password, &user.password_hash)? {
        warn!("Login failed - invalid password: {}", body.username);
        return Err(invalid());
    }

    info!("Login successful: {}", user.username);
    ok(&open_session(state, &user)?)
}

/// POST /api/auth/logout
pub async fn handle_logout(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    state.sessions.destroy(&ctx.session_id);
    info!("Logout: {}", ctx.username);
    ok(&SuccessResponse::new())
}

/// GET /api/auth/me
pub async fn handle_me(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let ctx = authenticate(state, req).await?;
    let user = state
        .store
        .get_user(ctx.user_id)
        .await?
        .ok_or_else(|| BookwormError::Unauthorized("User no longer exists".into()))?;
    ok(&UserView::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("ada").is_ok());
        assert!(validate_username("ada.lovelace_1815").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }
}
