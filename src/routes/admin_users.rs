//! Administrator account management
//!
//! - `PUT /api/admin/users/{id}/status` - Activate/deactivate a user

use hyper::Response;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routes::helpers::{authenticate_admin, ok, ApiRequest, FullBody};
use crate::server::AppState;
use crate::types::{BookwormError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub user_id: i64,
    pub is_active: bool,
    /// Sessions closed by a deactivation
    pub sessions_closed: usize,
}

/// PUT /api/admin/users/{id}/status
///
/// Deactivating a user closes all of their sessions, which also discards
/// their quiz verifications.
pub async fn handle_update_user_status(
    state: &AppState,
    req: &ApiRequest,
    user_id: i64,
) -> Result<Response<FullBody>> {
    let admin = authenticate_admin(state, req).await?;
    let request: UpdateStatusRequest = req.json()?;

    if user_id == admin.user_id && !request.is_active {
        return Err(BookwormError::BadRequest(
            "Administrators cannot deactivate themselves".into(),
        ));
    }

    if !state.store.set_user_active(user_id, request.is_active).await? {
        return Err(BookwormError::NotFound(format!("User {} not found", user_id)));
    }

    let sessions_closed = if request.is_active {
        0
    } else {
        state.sessions.destroy_user(user_id)
    };

    let action = if request.is_active { "activated" } else { "deactivated" };
    info!("User {} {} by admin {}", user_id, action, admin.username);

    ok(&UserStatusResponse {
        user_id,
        is_active: request.is_active,
        sessions_closed,
    })
}
