//! Registration, login and profile management

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::TokenKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::{NewUser, ProfileUpdate, UserChanges, UserProfile, UserSummary};
use crate::store::Store;
use crate::validation::itemize;

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Registration {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please add a name"))]
    pub username: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Please add an email"),
        email(message = "Please add a valid email"),
        custom(function = "crate::validation::check_email_domain")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl Registration {
    const FIELDS: &'static [&'static str] = &["username", "email", "password"];

    /// Trims the username and trims and lower-cases the email
    fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
        }
    }
}

/// Login payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A freshly issued token and the identity it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserSummary,
}

// Verified against when the email is unknown so both login failures cost
// one Argon2 run. Only touched from the blocking pool.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| hash_password("taskmgr-login-timing-placeholder").ok())
        .as_deref()
}

/// Runs a CPU-bound closure on the blocking pool
async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("Blocking task failed: {}", e)))
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, keys: TokenKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Creates an account and signs the new user in
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank username, malformed email or short password
    /// - `DuplicateEmail` if the (normalized) email is already registered
    pub async fn register(&self, input: Registration) -> ServiceResult<AuthSession> {
        let input = input.normalized();
        input
            .validate()
            .map_err(|e| itemize(&e, Registration::FIELDS))?;

        if self.store.find_user_by_email(&input.email).await?.is_some() {
            debug!("Registration rejected: email already registered");
            return Err(ServiceError::DuplicateEmail);
        }

        let password = input.password;
        let password_hash = blocking(move || hash_password(&password)).await??;

        let user = self
            .store
            .insert_user(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
            })
            .await?;

        let token = self.keys.issue(user.id)?;
        info!(user_id = %user.id, "User registered");

        Ok(AuthSession {
            token,
            user: UserSummary::from(&user),
        })
    }

    /// Checks credentials and issues a token
    ///
    /// Unknown email and wrong password produce the same
    /// `InvalidCredentials` error.
    pub async fn login(&self, input: Credentials) -> ServiceResult<AuthSession> {
        let email = input.email.trim().to_lowercase();
        let user = self.store.find_user_by_email(&email).await?;

        let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
        let password = input.password;

        let matches = blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => {
                if let Some(hash) = dummy_hash() {
                    verify_password(&password, hash);
                }
                false
            }
        })
        .await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                debug!("Login rejected");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        if let Err(e) = self.store.touch_last_login(user.id).await {
            warn!(user_id = %user.id, error = %e, "Failed to record last login");
        }

        let token = self.keys.issue(user.id)?;
        info!(user_id = %user.id, "User logged in");

        Ok(AuthSession {
            token,
            user: UserSummary::from(&user),
        })
    }

    /// Public projection of the given user
    pub async fn current_user(&self, user_id: Uuid) -> ServiceResult<UserProfile> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or(ServiceError::NotFound("User not found"))
    }

    /// Applies a partial profile update
    ///
    /// Absent fields are left alone. Present fields are validated and applied
    /// even when empty. An empty `phoneNumber` clears the number.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<UserProfile> {
        let changes = validate_profile_update(update)?;

        let current = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))?;

        if changes.is_empty() {
            return Ok(UserProfile::from(&current));
        }

        if let Some(email) = &changes.email {
            if let Some(holder) = self.store.find_user_by_email(email).await? {
                if holder.id != user_id {
                    return Err(ServiceError::DuplicateEmail);
                }
            }
        }

        let user = self
            .store
            .update_user(user_id, changes)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))?;

        info!(user_id = %user.id, "Profile updated");
        Ok(UserProfile::from(&user))
    }
}

fn validate_profile_update(update: ProfileUpdate) -> ServiceResult<UserChanges> {
    let update = update.normalized();
    update
        .validate()
        .map_err(|e| itemize(&e, ProfileUpdate::FIELDS))?;

    Ok(UserChanges {
        username: update.username,
        email: update.email,
        bio: update.bio,
        phone_number: update
            .phone_number
            .map(|phone| phone.filter(|p| !p.is_empty())),
        location: update.location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::DEFAULT_BIO;
    use crate::store::{MemoryStore, UserStore};
    use crate::validation::FieldError;
    use chrono::Duration;

    fn setup() -> (Arc<MemoryStore>, AuthService) {
        let store = Arc::new(MemoryStore::new());
        let keys = TokenKeys::new("test-secret-key-at-least-32-bytes-long", Duration::days(7));
        let service = AuthService::new(store.clone(), keys);
        (store, service)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            username: "alice".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    fn field_names(err: ServiceError) -> Vec<String> {
        match err {
            ServiceError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (store, service) = setup();

        let session = service.register(registration(" A@X.com ")).await.unwrap();
        assert_eq!(session.user.email, "a@x.com");
        assert_eq!(service.keys().verify(&session.token).unwrap(), session.user.id);

        let stored = store.find_user_by_id(session.user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(verify_password("secret1", &stored.password_hash));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_case_insensitive() {
        let (_, service) = setup();
        service.register(registration("a@x.com")).await.unwrap();

        let err = service.register(registration("A@x.COM")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_register_validation_is_itemized() {
        let (_, service) = setup();

        let err = service
            .register(Registration {
                username: "  ".to_string(),
                email: "not-an-email".to_string(),
                password: "123".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(field_names(err), vec!["username", "email", "password"]);
    }

    #[tokio::test]
    async fn test_register_email_messages() {
        let (store, service) = setup();

        for (email, message) in [
            ("   ", "Please add an email"),
            ("alice.example.com", "Please add a valid email"),
            ("alice@localhost", "Please add a valid email"),
        ] {
            let err = service.register(registration(email)).await.unwrap_err();
            match err {
                ServiceError::Validation(errors) => {
                    assert_eq!(errors, vec![FieldError::new("email", message)])
                }
                other => panic!("expected validation error, got {:?}", other),
            }
        }

        assert!(store.find_user_by_email("alice@localhost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_success_stamps_last_login() {
        let (store, service) = setup();
        let registered = service.register(registration("a@x.com")).await.unwrap();

        let session = service
            .login(Credentials {
                email: "A@X.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, registered.user.id);
        assert_eq!(service.keys().verify(&session.token).unwrap(), registered.user.id);

        let stored = store.find_user_by_id(registered.user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_failures_are_identical() {
        let (_, service) = setup();
        service.register(registration("a@x.com")).await.unwrap();

        let wrong_password = service
            .login(Credentials {
                email: "a@x.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(Credentials {
                email: "ghost@x.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert!(matches!(unknown_email, ServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());

        // The unknown-email path built the placeholder hash on the blocking pool
        assert!(matches!(DUMMY_HASH.get(), Some(Some(_))));
    }

    #[tokio::test]
    async fn test_current_user() {
        let (_, service) = setup();
        let session = service.register(registration("a@x.com")).await.unwrap();

        let profile = service.current_user(session.user.id).await.unwrap();
        assert_eq!(profile.bio, DEFAULT_BIO);
        assert_eq!(profile.location, "");

        let err = service.current_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_profile_partial() {
        let (_, service) = setup();
        let session = service.register(registration("a@x.com")).await.unwrap();

        let profile = service
            .update_profile(
                session.user.id,
                ProfileUpdate {
                    bio: Some(String::new()),
                    phone_number: Some(Some("+1 555 123 4567".to_string())),
                    location: Some("Berlin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.username, "alice");
        assert_eq!(profile.bio, "");
        assert_eq!(profile.phone_number.as_deref(), Some("+1 555 123 4567"));
        assert_eq!(profile.location, "Berlin");

        let profile = service
            .update_profile(
                session.user.id,
                ProfileUpdate {
                    phone_number: Some(Some(String::new())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(profile.phone_number.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_validation() {
        let (_, service) = setup();
        let session = service.register(registration("a@x.com")).await.unwrap();

        let err = service
            .update_profile(
                session.user.id,
                ProfileUpdate {
                    username: Some("al".to_string()),
                    bio: Some("x".repeat(161)),
                    phone_number: Some(Some("call me".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(field_names(err), vec!["username", "bio", "phoneNumber"]);
    }

    #[tokio::test]
    async fn test_update_profile_accepts_long_free_text() {
        let (_, service) = setup();
        let session = service.register(registration("a@x.com")).await.unwrap();
        let phone = "+1 - - - - - - - - - - - - (555) 123 - 4567";
        assert!(phone.len() > 32);

        let profile = service
            .update_profile(
                session.user.id,
                ProfileUpdate {
                    username: Some("u".repeat(300)),
                    location: Some("l".repeat(300)),
                    phone_number: Some(Some(phone.to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.username.len(), 300);
        assert_eq!(profile.location.len(), 300);
        assert_eq!(profile.phone_number.as_deref(), Some(phone));
    }

    #[tokio::test]
    async fn test_update_profile_email_conflict() {
        let (_, service) = setup();
        service.register(registration("a@x.com")).await.unwrap();
        let bob = service.register(registration("b@x.com")).await.unwrap();

        let err = service
            .update_profile(
                bob.user.id,
                ProfileUpdate {
                    email: Some("A@X.COM".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));

        let profile = service
            .update_profile(
                bob.user.id,
                ProfileUpdate {
                    email: Some(" B2@X.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.email, "b2@x.com");
    }

    #[tokio::test]
    async fn test_update_profile_missing_user() {
        let (_, service) = setup();

        let err = service
            .update_profile(Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
