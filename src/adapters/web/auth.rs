//! Authentication backend for axum-login, backed by the users table.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum_login::{AuthUser, AuthnBackend, UserId};
use std::sync::Arc;

use crate::domain::error::PapertradeError;
use crate::ports::store_port::StorePort;

/// Authenticated user held in the session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WebUser {
    pub id: i64,
    pub username: String,
    /// Password hash string as bytes; a password change invalidates the
    /// session.
    pw_hash_bytes: Vec<u8>,
}

impl AuthUser for WebUser {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash_bytes
    }
}

/// Login credentials submitted via the login form.
#[derive(Clone, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Backend {
    store: Arc<dyn StorePort + Send + Sync>,
}

impl Backend {
    pub fn new(store: Arc<dyn StorePort + Send + Sync>) -> Self {
        Self { store }
    }
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

impl AuthnBackend for Backend {
    type User = WebUser;
    type Credentials = Credentials;
    type Error = PapertradeError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let store = self.store.clone();
        let record = tokio::task::spawn_blocking(move || {
            store.find_user_by_username(&creds.username).map(|found| {
                found.filter(|user| verify_password(&creds.password, &user.password_hash))
            })
        })
        .await
        .map_err(|e| PapertradeError::Database {
            reason: format!("auth task failed: {e}"),
        })??;

        Ok(record.map(|user| WebUser {
            id: user.id,
            username: user.username,
            pw_hash_bytes: user.password_hash.into_bytes(),
        }))
    }

    async fn get_user(
        &self,
        user_id: &UserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        let store = self.store.clone();
        let user_id = *user_id;
        let record = tokio::task::spawn_blocking(move || store.find_user(user_id))
            .await
            .map_err(|e| PapertradeError::Database {
                reason: format!("auth task failed: {e}"),
            })??;

        Ok(record.map(|user| WebUser {
            id: user.id,
            username: user.username,
            pw_hash_bytes: user.password_hash.into_bytes(),
        }))
    }
}

/// Argon2id hash for a new password.
pub fn hash_password(password: &str) -> Result<String, PapertradeError> {
    use argon2::password_hash::SaltString;
    use argon2::PasswordHasher;
    use rand::rngs::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PapertradeError::invalid_input(format!("could not hash password: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
