//! Registration, login and bearer-token resolution.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AuthSession, Role, User};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{CredentialHasher, DatabaseService, PortError};
use crate::validation::{decode_object, is_valid_email, loose_text, Issues};

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCredentials {
    pub email: Value,
    pub password: Value,
    pub name: Value,
}

/// A freshly issued bearer token and the account it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn DatabaseService>,
    hasher: Arc<dyn CredentialHasher>,
    session_ttl: Duration,
}

impl AccountService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        hasher: Arc<dyn CredentialHasher>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            db,
            hasher,
            session_ttl,
        }
    }

    pub async fn register(&self, payload: &Value) -> ServiceResult<AuthGrant> {
        let raw: RawCredentials = decode_object(payload);
        let email = loose_text(&raw.email).to_lowercase();
        let name = loose_text(&raw.name);
        let password = raw_password(&raw.password);

        let mut issues = Issues::default();
        if name.is_empty() {
            issues.push("name", "Name is required");
        }
        if !is_valid_email(&email) {
            issues.push("email", "Must be a valid email address");
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            issues.push("password", "Password must be at least 8 characters");
        }
        if !issues.is_empty() {
            return Err(issues.into_vec().into());
        }

        if self.db.get_credentials_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = self.hasher.hash(&password)?;
        let user = self
            .db
            .create_user(&email, &password_hash, &name, Role::User)
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => email_taken(),
                other => other.into(),
            })?;

        info!(user_id = user.id, "User registered");
        self.issue(user).await
    }

    pub async fn login(&self, payload: &Value) -> ServiceResult<AuthGrant> {
        let raw: RawCredentials = decode_object(payload);
        let email = loose_text(&raw.email).to_lowercase();
        let password = raw_password(&raw.password);

        let mut issues = Issues::default();
        if !is_valid_email(&email) {
            issues.push("email", "Must be a valid email address");
        }
        if password.is_empty() {
            issues.push("password", "Password is required");
        }
        if !issues.is_empty() {
            return Err(issues.into_vec().into());
        }

        let Some(credentials) = self.db.get_credentials_by_email(&email).await? else {
            return Err(ServiceError::InvalidCredentials);
        };

        if credentials.password_hash.is_empty()
            || !self.hasher.verify(&password, &credentials.password_hash)?
        {
            warn!(user_id = credentials.user.id, "Rejected login with a wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        self.issue(credentials.user).await
    }

    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        self.db.delete_auth_session(token).await?;
        Ok(())
    }

    /// Maps a bearer token to its user. Unknown, expired, or orphaned tokens
    /// are all `UNAUTHORIZED`.
    pub async fn resolve(&self, token: &str) -> ServiceResult<User> {
        let user_id = self
            .db
            .resolve_auth_session(token, Utc::now())
            .await?
            .ok_or_else(|| {
                ServiceError::Unauthorized("Authorization token is invalid or expired.".to_string())
            })?;

        self.db.get_user_by_id(user_id).await?.ok_or_else(|| {
            ServiceError::Unauthorized("Authenticated user does not exist.".to_string())
        })
    }

    async fn issue(&self, user: User) -> ServiceResult<AuthGrant> {
        let session = AuthSession {
            token: Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            expires_at: Utc::now() + self.session_ttl,
        };
        self.db.create_auth_session(&session).await?;

        Ok(AuthGrant {
            token: session.token,
            user,
        })
    }
}

/// Passwords are taken verbatim; only strings count.
fn raw_password(value: &Value) -> String {
    value.as_str().map(str::to_string).unwrap_or_default()
}

fn email_taken() -> ServiceError {
    ServiceError::Conflict {
        code: "EMAIL_TAKEN",
        message: "Email is already registered.",
    }
}
