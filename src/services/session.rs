//! Session management: JWT access and refresh tokens
//!
//! Access tokens are short-lived HS256 JWTs carried in a cookie. The
//! refresh token is also a signed JWT but is additionally persisted on
//! the user row; a refresh is only honored when the presented token
//! matches the stored one, which makes rotation revoke older tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims for both token kinds
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub exp: i64,    // expiry timestamp
    pub iat: i64,    // issued at
    pub kind: TokenKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug)]
pub enum SessionError {
    InvalidToken,
    Expired,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidToken => write!(f, "invalid token"),
            SessionError::Expired => write!(f, "token expired"),
        }
    }
}

const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

fn create_token(
    user_id: i64,
    secret: &[u8],
    kind: TokenKind,
    lifetime: Duration,
) -> Result<String, SessionError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
        kind,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|_| SessionError::InvalidToken)
}

/// Create a JWT access token valid for 15 minutes
pub fn create_access_token(user_id: i64, secret: &[u8]) -> Result<String, SessionError> {
    create_token(
        user_id,
        secret,
        TokenKind::Access,
        Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES),
    )
}

/// Create a JWT refresh token valid for 30 days. The caller persists it
/// on the user row so rotation can compare against the stored value.
pub fn create_refresh_token(user_id: i64, secret: &[u8]) -> Result<String, SessionError> {
    create_token(
        user_id,
        secret,
        TokenKind::Refresh,
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
    )
}

fn validate_token(token: &str, secret: &[u8], kind: TokenKind) -> Result<i64, SessionError> {
    // HS256 only, to prevent algorithm confusion attacks
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub", "iat"]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::InvalidToken,
        })?;

    if token_data.claims.kind != kind {
        return Err(SessionError::InvalidToken);
    }

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| SessionError::InvalidToken)
}

/// Validate an access token and return the user_id
pub fn validate_access_token(token: &str, secret: &[u8]) -> Result<i64, SessionError> {
    validate_token(token, secret, TokenKind::Access)
}

/// Validate a refresh token and return the user_id. Callers must also
/// compare against the token stored on the user row.
pub fn validate_refresh_token(token: &str, secret: &[u8]) -> Result<i64, SessionError> {
    validate_token(token, secret, TokenKind::Refresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn test_access_token_round_trip() {
        let token = create_access_token(42, SECRET).unwrap();
        assert_eq!(validate_access_token(&token, SECRET).unwrap(), 42);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let token = create_refresh_token(7, SECRET).unwrap();
        assert_eq!(validate_refresh_token(&token, SECRET).unwrap(), 7);
    }

    #[test]
    fn test_token_kind_is_enforced() {
        let refresh = create_refresh_token(1, SECRET).unwrap();
        assert!(matches!(
            validate_access_token(&refresh, SECRET),
            Err(SessionError::InvalidToken)
        ));
        let access = create_access_token(1, SECRET).unwrap();
        assert!(matches!(
            validate_refresh_token(&access, SECRET),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_access_token(1, SECRET).unwrap();
        assert!(validate_access_token(&token, b"other-secret").is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let mut token = create_access_token(1, SECRET).unwrap();
        token.push('x');
        assert!(validate_access_token(&token, SECRET).is_err());
    }
}
