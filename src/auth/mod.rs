/*!
 * # Authentication Module
 *
 * Bearer-token identity for the API. Tokens are HS256 JWTs carrying the
 * user id, phone and superuser flag; issuing them belongs to the identity
 * provider, so [`AuthService::issue_token`] exists for tooling and tests.
 *
 * Handlers take an [`AuthUser`] argument; requests without a valid token are
 * rejected with 401 before the handler runs.
 */

use crate::{errors::ServiceError, services::Actor};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Claim structure for JWT tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub phone: String,
    #[serde(default)]
    pub is_superuser: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller extracted from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub phone: String,
    pub is_superuser: bool,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            is_superuser: self.is_superuser,
        }
    }

    pub fn require_superuser(&self) -> Result<(), ServiceError> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "administrator privileges required".into(),
            ))
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No authentication token provided")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(msg) => ServiceError::JwtError(msg),
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_ttl: Duration) -> Self {
        Self {
            jwt_secret,
            token_ttl,
        }
    }
}

/// Issues and validates bearer tokens
#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn issue_token(
        &self,
        user_id: Uuid,
        phone: &str,
        is_superuser: bool,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.token_ttl)
            .map_err(|_| AuthError::TokenCreation("invalid token lifetime".into()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            phone: phone.to_string(),
            is_superuser,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            phone: claims.phone,
            is_superuser: claims.is_superuser,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AuthService>: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = Arc::<AuthService>::from_ref(state);
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let user = auth.authenticate(token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            e
        })?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "q8Zr2mVx7LpT4nWc9yHk3sJd6fGb1aQe5uRt0oPi8lKj2hGf4dSa6zXc9vBn3mQw";

    fn service(ttl: Duration) -> AuthService {
        AuthService::new(AuthConfig::new(SECRET.to_string(), ttl))
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let auth = service(Duration::from_secs(600));
        let user_id = Uuid::new_v4();
        let token = auth.issue_token(user_id, "+99655512345", true).unwrap();

        let user = auth.authenticate(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.phone, "+99655512345");
        assert!(user.is_superuser);
        assert!(user.actor().is_superuser);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let other = AuthService::new(AuthConfig::new(
            "x".repeat(64),
            Duration::from_secs(600),
        ));
        let token = other.issue_token(Uuid::new_v4(), "0555123456", false).unwrap();

        assert_matches!(
            service(Duration::from_secs(600)).authenticate(&token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn rejects_expired_token() {
        let auth = service(Duration::from_secs(600));
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            phone: "0555123456".into(),
            is_superuser: false,
            iat: 0,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_matches!(auth.authenticate(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn auth_errors_become_unauthorized() {
        assert_eq!(
            ServiceError::from(AuthError::MissingToken)
                .status_code()
                .as_u16(),
            401
        );
    }
}
