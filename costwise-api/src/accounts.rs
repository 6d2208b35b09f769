//! Account registration and password login.
//!
//! Passwords are hashed with Argon2id (PHC string format) on the blocking
//! pool. A successful login yields the stored account; the route layer turns
//! it into a bearer token via [`IdentityVerifier::issue`](crate::auth::IdentityVerifier::issue).

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use costwise_core::{Clock, EmailAddress, OwnerId, Registration, UserAccount};
use costwise_storage::UserStore;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

const BAD_LOGIN: &str = "Invalid email or password";

/// Registers accounts and checks passwords against the user store.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Create an account with a fresh user id. A taken email fails with a
    /// duplicate-account error and nothing is written.
    pub async fn register(&self, registration: Registration) -> ApiResult<UserAccount> {
        if self.users.user_get_by_email(&registration.email).await?.is_some() {
            return Err(ApiError::email_taken(&registration.email));
        }

        let Registration {
            name,
            email,
            password,
        } = registration;
        let password_hash = run_blocking(move || hash_password(&password)).await??;

        let account = UserAccount {
            user_id: OwnerId::new(Uuid::now_v7().to_string())?,
            name,
            email,
            password_hash,
            created_at: self.clock.now(),
        };
        self.users.user_insert(&account).await?;

        tracing::info!(user_id = %account.user_id, "Registered account");
        Ok(account)
    }

    /// Check an email/password pair. Unknown emails and wrong passwords
    /// fail identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<UserAccount> {
        let email = EmailAddress::parse(email).map_err(|_| bad_login())?;
        let account = match self.users.user_get_by_email(&email).await? {
            Some(account) => account,
            None => {
                tracing::debug!("Login for unknown email");
                return Err(bad_login());
            }
        };

        let password = password.to_string();
        let hash = account.password_hash.clone();
        let matches = run_blocking(move || verify_password(&password, &hash)).await?;
        if !matches {
            tracing::debug!(user_id = %account.user_id, "Login with wrong password");
            return Err(bad_login());
        }
        Ok(account)
    }
}

fn bad_login() -> ApiError {
    ApiError::invalid_credential(BAD_LOGIN)
}

async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal_error(format!("Password task failed: {}", e)))
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal_error(format!("Password hashing failed: {}", e)))
}

/// False for a mismatch and for a hash that does not parse.
fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Stored password hash does not parse");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use costwise_core::FixedClock;
    use costwise_storage::InMemoryStore;
    use costwise_test_utils::fixtures;

    fn service() -> (AccountService, InMemoryStore) {
        let store = InMemoryStore::new();
        let service = AccountService::new(
            Arc::new(store.clone()),
            Arc::new(FixedClock(fixtures::reference_time())),
        );
        (service, store)
    }

    fn registration(email: &str) -> Registration {
        Registration::parse("Ana", email, "correct horse").unwrap()
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let (service, store) = service();
        let account = service.register(registration("ana@example.com")).await.unwrap();

        assert_eq!(account.created_at, fixtures::reference_time());
        assert_ne!(account.password_hash, "correct horse");
        let stored = store.user_get_by_email(&account.email).await.unwrap();
        assert_eq!(stored, Some(account));
    }

    #[tokio::test]
    async fn test_register_taken_email_conflicts() {
        let (service, _) = service();
        service.register(registration("ana@example.com")).await.unwrap();
        let err = service
            .register(registration("ANA@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailTaken);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (service, _) = service();
        let account = service.register(registration("ana@example.com")).await.unwrap();

        let found = service
            .authenticate(" Ana@Example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(found.user_id, account.user_id);

        let wrong = service
            .authenticate("ana@example.com", "wrong horse")
            .await
            .unwrap_err();
        let unknown = service
            .authenticate("bob@example.com", "correct horse")
            .await
            .unwrap_err();
        assert_eq!(wrong.code, ErrorCode::InvalidCredential);
        assert_eq!(wrong, unknown);
    }
}
