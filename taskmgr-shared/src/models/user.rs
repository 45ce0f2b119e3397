//! User model and database operations
//!
//! This module provides the User model and the queries used by the
//! credential store.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     username TEXT NOT NULL,
//!     email TEXT NOT NULL,
//!     password_hash VARCHAR(255) NOT NULL,
//!     bio VARCHAR(160) NOT NULL DEFAULT 'Hey there! I''m using Task Manager.',
//!     phone_number TEXT,
//!     location TEXT NOT NULL DEFAULT '',
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     last_login_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT users_email_key UNIQUE (email),
//!     CONSTRAINT users_email_lowercase CHECK (email = LOWER(email))
//! );
//! ```
//!
//! Emails are stored lower-cased, which makes the unique constraint
//! case-insensitive.
//!
//! # Example
//!
//! ```no_run
//! use taskmgr_shared::models::user::{NewUser, User};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! let user = User::create(&pool, NewUser {
//!     username: "alice".to_string(),
//!     email: "a@x.com".to_string(),
//!     password_hash: "$argon2id$...".to_string(),
//! }).await?;
//!
//! let found = User::find_by_email(&pool, "a@x.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::double_option;

/// Bio given to every new account
pub const DEFAULT_BIO: &str = "Hey there! I'm using Task Manager.";

/// User model representing an account
///
/// Intentionally not `Serialize`: the password hash must never leave the
/// store. Use [`UserProfile`] or [`UserSummary`] for responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub username: String,

    /// Lower-cased email address, unique across users
    pub email: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    /// Short bio, at most 160 characters
    pub bio: String,

    pub phone_number: Option<String>,

    pub location: String,

    pub is_active: bool,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user: every field except the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub phone_number: Option<String>,
    pub location: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal identity returned alongside a fresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
            phone_number: user.phone_number.clone(),
            location: user.location.clone(),
            is_active: user.is_active,
            last_login: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Trimmed display name
    pub username: String,

    /// Normalized (trimmed, lower-cased) email
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Validated profile changes
///
/// Only non-None fields are written. `phone_number: Some(None)` clears the
/// number. Password and ID are not updatable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<Option<String>>,
    pub location: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.bio.is_none()
            && self.phone_number.is_none()
            && self.location.is_none()
    }

    /// Applies the present fields to `user` and bumps `updated_at`
    pub fn apply_to(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(phone_number) = self.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(location) = self.location {
            user.location = location;
        }
        user.updated_at = Utc::now();
    }
}

/// Raw profile update payload as sent by clients
///
/// An absent field is left alone; a present field is applied even when it is
/// an empty string. `phoneNumber: null` clears the number.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(custom(function = "crate::validation::check_profile_username"))]
    pub username: Option<String>,

    #[validate(
        length(min = 1, message = "Please add an email"),
        email(message = "Please add a valid email"),
        custom(function = "crate::validation::check_email_domain")
    )]
    pub email: Option<String>,

    #[validate(length(max = 160, message = "Bio cannot exceed 160 characters"))]
    pub bio: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(custom(function = "crate::validation::check_phone"))]
    pub phone_number: Option<Option<String>>,

    pub location: Option<String>,
}

impl ProfileUpdate {
    /// Field order for itemized validation errors
    pub const FIELDS: &'static [&'static str] =
        &["username", "email", "bio", "phone_number", "location"];

    /// Trims the identifying fields and lower-cases the email
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.map(|u| u.trim().to_string()),
            email: self.email.map(|e| e.trim().to_lowercase()),
            phone_number: self
                .phone_number
                .map(|p| p.map(|p| p.trim().to_string())),
            ..self
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, bio, phone_number, location, \
                            is_active, last_login_at, created_at, updated_at";

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint `users_email_key`)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.email)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address
    ///
    /// The caller is expected to pass a normalized email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` will be updated. The `updated_at`
    /// timestamp is always refreshed.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if user doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UserChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.bio.is_some() {
            bind_count += 1;
            query.push_str(&format!(", bio = ${}", bind_count));
        }
        if data.phone_number.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone_number = ${}", bind_count));
        }
        if data.location.is_some() {
            bind_count += 1;
            query.push_str(&format!(", location = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(bio) = data.bio {
            q = q.bind(bio);
        }
        if let Some(phone_number) = data.phone_number {
            q = q.bind(phone_number);
        }
        if let Some(location) = data.location {
            q = q.bind(location);
        }

        q.fetch_optional(pool).await
    }

    /// Updates the last login timestamp for a user
    ///
    /// # Returns
    ///
    /// True if user was found and updated, false otherwise
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            bio: DEFAULT_BIO.to_string(),
            phone_number: None,
            location: String::new(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_excludes_password_hash() {
        let user = sample_user();
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["bio"], DEFAULT_BIO);
        assert!(json.get("phoneNumber").is_some());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_summary_fields() {
        let user = sample_user();
        let summary = UserSummary::from(&user);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json.as_object().unwrap().len(), 3);
        assert_eq!(summary.email, "a@x.com");
    }

    #[test]
    fn test_changes_apply() {
        let mut user = sample_user();
        let before = user.updated_at;

        UserChanges {
            bio: Some(String::new()),
            phone_number: Some(Some("+15551234567".to_string())),
            ..Default::default()
        }
        .apply_to(&mut user);

        assert_eq!(user.bio, "");
        assert_eq!(user.phone_number.as_deref(), Some("+15551234567"));
        assert_eq!(user.username, "alice");
        assert!(user.updated_at >= before);
    }

    #[test]
    fn test_profile_update_presence() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"bio":"","phoneNumber":null}"#).unwrap();

        assert_eq!(update.bio.as_deref(), Some(""));
        assert_eq!(update.phone_number, Some(None));
        assert!(update.username.is_none());
        assert!(update.location.is_none());
    }
}
