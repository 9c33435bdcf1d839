//! Administrator bootstrap
//!
//! Creates the configured admin account at startup if it does not exist.

use tracing::{info, warn};

use crate::auth::{hash_password, MIN_PASSWORD_LEN};
use crate::db::schemas::UserDoc;
use crate::db::CatalogStore;
use crate::types::{BookwormError, Result};

pub async fn ensure_admin(store: &dyn CatalogStore, username: &str, password: &str) -> Result<UserDoc> {
    if let Some(existing) = store.find_user_by_username(username).await? {
        if !existing.is_admin {
            warn!(
                "Admin bootstrap: '{}' exists as a regular user and was left unchanged",
                username
            );
        }
        return Ok(existing);
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(BookwormError::Config(format!(
            "ADMIN_PASSWORD must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user = store
        .insert_user(UserDoc::new(
            username.to_string(),
            username.to_string(),
            hash_password(password)?,
            true,
        ))
        .await?;
    info!("Created administrator '{}' (id {})", user.username, user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::db::MemoryCatalogStore;

    #[tokio::test]
    async fn test_creates_once() {
        let store = MemoryCatalogStore::new();
        let first = ensure_admin(&store, "root", "correct horse").await.unwrap();
        assert!(first.is_admin);
        assert!(verify_password("correct horse", &first.password_hash).unwrap());

        let second = ensure_admin(&store, "root", "other password").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_rejects_short_password() {
        let store = MemoryCatalogStore::new();
        assert!(matches!(
            ensure_admin(&store, "root", "short").await,
            Err(BookwormError::Config(_))
        ));
    }
}
