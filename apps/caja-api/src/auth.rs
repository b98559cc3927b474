//! JWT authentication and password hashing.
//!
//! HS256 access tokens carry the operator id and role; handlers derive the
//! acting principal exclusively from the verified claims, never from the
//! request body. Passwords are argon2id PHC strings.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use caja_core::{Operator, OperatorRole};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Operator id.
    pub sub: i64,

    /// Operator display name.
    pub name: String,

    /// Role at issue time.
    pub role: OperatorRole,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generates an access token for an operator.
    pub fn generate_token(&self, operator: &Operator) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: operator.id,
            name: operator.name.clone(),
            role: operator.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("failed to generate token: {e}")))
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| ApiError::AuthFailed(format!("invalid token: {e}")))
    }
}

/// Hashes a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Verifies a password against a stored PHC string. A malformed stored hash
/// counts as a failed verification, not an internal error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// The authenticated principal, extracted from the bearer token. Using this
/// as a handler argument makes the route require authentication.
#[derive(Debug, Clone)]
pub struct AuthOperator {
    pub id: i64,
    pub name: String,
    pub role: OperatorRole,
}

impl AuthOperator {
    /// Admin-only gate for destructive and corrective operations.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == OperatorRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "this operation requires the admin role".to_string(),
            ))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthOperator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::AuthFailed("missing authorization header".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::AuthFailed("expected a bearer token".to_string()))?;

        let claims = state.jwt.validate_token(token)?;

        Ok(AuthOperator {
            id: claims.sub,
            name: claims.name,
            role: claims.role,
        })
    }
}

/// Extracts the token from an `Authorization: Bearer ...` header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}
