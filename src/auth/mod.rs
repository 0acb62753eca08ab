pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Claims embedded in every access token. The subject id is the only claim
/// the rest of the pipeline trusts; role and tenant binding are always
/// re-fetched from the database so a token cannot outlive a role change.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(subject_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signing secret unset. This is a deployment fault and must surface as a
    /// server error, never as a client auth failure.
    #[error("JWT signing secret is not configured")]
    ConfigMissing,
}

/// Sign claims with the given secret (HS256).
pub fn issue(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::ConfigMissing);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| TokenError::Malformed(e.to_string()))
}

/// Verify signature and expiry, returning the embedded claims.
pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::ConfigMissing);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(e.to_string()),
        })
}

/// Issue a token for a subject using the configured secret and TTL.
pub fn generate_token(subject_id: Uuid) -> Result<String, TokenError> {
    let security = &config::config().security;
    let claims = Claims::new(subject_id, Duration::hours(security.jwt_expiry_hours as i64));
    issue(&claims, &security.jwt_secret)
}

/// Decode a token using the configured secret.
pub fn decode_token(token: &str) -> Result<Claims, TokenError> {
    verify(token, &config::config().security.jwt_secret)
}
