//! Mock authentication
//!
//! Users live in a persistent store under `users`; the signed-in user lives
//! in a session store under `currentUser`. Passwords are kept as salted
//! SHA-256 digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::FinGenieError;
use crate::models::User;
use crate::storage::{get_json, set_json, KeyValueStore};
use crate::Result;

const USERS_KEY: &str = "users";
const CURRENT_USER_KEY: &str = "currentUser";
const MIN_PASSWORD_LEN: usize = 8;

/// User as stored in the persistent store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    #[serde(flatten)]
    user: User,
    salt: String,
    password_hash: String,
}

impl UserRecord {
    fn matches_password(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }
}

pub struct AuthService {
    users: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { users, session }
    }

    /// Create an account and sign it in.
    pub async fn signup(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User> {
        let full_name = full_name.trim();
        let email = email.trim();

        if full_name.is_empty() || email.is_empty() || password.is_empty() || confirm_password.is_empty() {
            return Err(FinGenieError::Auth("Please fill in all fields.".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FinGenieError::Auth(
                "Password must be at least 8 characters long.".to_string(),
            ));
        }
        if password != confirm_password {
            return Err(FinGenieError::Auth("Passwords do not match.".to_string()));
        }

        let mut records = self.load_users().await?;
        if records.iter().any(|r| r.user.email.eq_ignore_ascii_case(email)) {
            warn!("Signup rejected: email already registered");
            return Err(FinGenieError::Auth(
                "An account with this email already exists.".to_string(),
            ));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let record = UserRecord {
            user: User {
                id: Uuid::new_v4().to_string(),
                full_name: full_name.to_string(),
                email: email.to_string(),
            },
            password_hash: hash_password(&salt, password),
            salt,
        };
        let user = record.user.clone();

        records.push(record);
        set_json(self.users.as_ref(), USERS_KEY, &records).await?;
        self.set_current_user(&user).await?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(FinGenieError::Auth("Please fill in all fields.".to_string()));
        }

        let records = self.load_users().await?;
        let user = records
            .into_iter()
            .find(|r| r.user.email.eq_ignore_ascii_case(email))
            .filter(|r| r.matches_password(password))
            .map(|r| r.user)
            .ok_or_else(|| {
                warn!("Login rejected");
                FinGenieError::Auth("Invalid email or password.".to_string())
            })?;

        self.set_current_user(&user).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.remove(CURRENT_USER_KEY).await?;
        info!("User logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<User>> {
        get_json(self.session.as_ref(), CURRENT_USER_KEY).await
    }

    async fn load_users(&self) -> Result<Vec<UserRecord>> {
        Ok(get_json(self.users.as_ref(), USERS_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn set_current_user(&self, user: &User) -> Result<()> {
        set_json(self.session.as_ref(), CURRENT_USER_KEY, user).await
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn service() -> (AuthService, Arc<InMemoryStore>) {
        let users = Arc::new(InMemoryStore::new());
        let session = Arc::new(InMemoryStore::new());
        (AuthService::new(users.clone(), session), users)
    }

    #[tokio::test]
    async fn test_signup_logs_in_and_hides_password() {
        let (auth, users) = service();
        let user = auth
            .signup("Asha Rao", "asha@example.com", "supersecret", "supersecret")
            .await
            .unwrap();

        assert_eq!(user.first_name(), "Asha");
        assert_eq!(auth.current_user().await.unwrap(), Some(user));

        let raw = users.get(USERS_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("supersecret"));
        assert!(raw.contains("passwordHash"));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let (auth, _) = service();

        let cases = vec![
            ("", "a@b.c", "password1", "password1", "Please fill in all fields."),
            ("A", "a@b.c", "short", "short", "Password must be at least 8 characters long."),
            ("A", "a@b.c", "password1", "password2", "Passwords do not match."),
        ];

        for (name, email, pass, confirm, expected) in cases {
            let err = auth.signup(name, email, pass, confirm).await.unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let (auth, _) = service();
        auth.signup("A", "Asha@Example.com", "password1", "password1").await.unwrap();

        let err = auth
            .signup("B", "asha@example.COM", "password2", "password2")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "An account with this email already exists.");
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (auth, _) = service();
        let user = auth.signup("A", "a@example.com", "password1", "password1").await.unwrap();
        auth.logout().await.unwrap();
        assert_eq!(auth.current_user().await.unwrap(), None);

        let err = auth.login("a@example.com", "wrongpass").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password.");
        assert!(auth.login("nobody@example.com", "password1").await.is_err());

        let logged_in = auth.login("A@EXAMPLE.com", "password1").await.unwrap();
        assert_eq!(logged_in, user);
        assert_eq!(auth.current_user().await.unwrap(), Some(user));
    }
}
