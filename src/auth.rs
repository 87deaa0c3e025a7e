// ABOUTME: Bearer token issuing and validation producing an explicit AccountContext
// ABOUTME: Also hashes and verifies account passwords with bcrypt off the async runtime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Every ledger operation receives an [`AccountContext`] derived from a
//! validated HS256 token. There is no ambient session state.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::constants::service::SERVICE_NAME;
use crate::errors::{AppError, AppResult};
use crate::models::{Account, Role};

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller identity passed to every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountContext {
    /// Caller's account id
    pub account_id: Uuid,
    /// Caller's role
    pub role: Role,
}

impl AccountContext {
    /// Build a context directly, used by trusted callers and tests
    #[must_use]
    pub const fn new(account_id: Uuid, role: Role) -> Self {
        Self { account_id, role }
    }

    /// Whether the caller is an administrator
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// `JWT` claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account `ID`
    pub sub: String,
    /// Account role
    pub role: Role,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience
    pub aud: String,
}

/// Issued token returned at login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Bearer token
    pub token: String,
    /// Expiration as a unix timestamp
    pub expires_at: i64,
}

/// Token and password manager
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
    bcrypt_cost: u32,
}

impl AuthManager {
    /// Create a manager for an HMAC secret
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_hours,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Create a manager from configuration
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.jwt_expiry_hours)
    }

    /// Override the bcrypt cost factor
    #[must_use]
    pub const fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Issue a token for an account
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails
    pub fn generate_token(&self, account: &Account) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);
        let claims = Claims {
            sub: account.id.to_string(),
            role: account.role,
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            aud: SERVICE_NAME.to_owned(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Validate a raw token
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for expired, forged or malformed tokens
    pub fn validate_token(&self, token: &str) -> AppResult<AccountContext> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SERVICE_NAME]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Token validation failed: {e}");
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::auth_invalid("Token has expired"),
                ErrorKind::InvalidSignature => AppError::auth_invalid("Token signature is invalid"),
                _ => AppError::auth_invalid("Token is malformed"),
            }
        })?;

        let account_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::auth_invalid("Invalid account id in token"))?;
        Ok(AccountContext::new(account_id, data.claims.role))
    }

    /// Validate an `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the header is missing and `AuthInvalid`
    /// when it is not a valid bearer token
    pub fn authenticate(&self, authorization: Option<&str>) -> AppResult<AccountContext> {
        let header = authorization.ok_or_else(AppError::auth_required)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::auth_invalid("Authorization header must be a Bearer token"))?;
        self.validate_token(token)
    }

    /// Hash a password with bcrypt on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a password against its bcrypt hash on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an internal error if the hash is unreadable
    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::SubscriptionTier;

    fn account(role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            username: "jinwoo".into(),
            email: "jinwoo@example.com".into(),
            password_hash: String::new(),
            goal: "Not Set".into(),
            gym_id: None,
            role,
            subscription_tier: SubscriptionTier::Bronze,
            points: 0,
            level: 1,
            streak: 0,
            last_completed_quest_at: None,
            last_logged_diet_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip_carries_role() {
        let auth = AuthManager::new(b"an-exceptionally-long-test-secret-value", 1);
        let account = account(Role::GymOwner);
        let issued = auth.generate_token(&account).unwrap();

        let header = format!("Bearer {}", issued.token);
        let context = auth.authenticate(Some(&header)).unwrap();
        assert_eq!(context.account_id, account.id);
        assert_eq!(context.role, Role::GymOwner);
    }

    #[test]
    fn test_missing_and_foreign_tokens() {
        let auth = AuthManager::new(b"an-exceptionally-long-test-secret-value", 1);
        let other = AuthManager::new(b"a-different-but-equally-long-secret!!", 1);
        let issued = other.generate_token(&account(Role::User)).unwrap();

        assert_eq!(
            auth.authenticate(None).unwrap_err().code,
            ErrorCode::AuthRequired
        );
        assert_eq!(
            auth.authenticate(Some("Basic abc")).unwrap_err().code,
            ErrorCode::AuthInvalid
        );
        assert_eq!(
            auth.validate_token(&issued.token).unwrap_err().code,
            ErrorCode::AuthInvalid
        );
    }

    #[tokio::test]
    async fn test_password_hashing() {
        let auth = AuthManager::new(b"an-exceptionally-long-test-secret-value", 1)
            .with_bcrypt_cost(4);
        let hash = auth.hash_password("arise").await.unwrap();
        assert!(auth.verify_password("arise", &hash).await.unwrap());
        assert!(!auth.verify_password("kneel", &hash).await.unwrap());
    }
}
