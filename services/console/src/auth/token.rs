//! Console bearer tokens.
//!
//! # Purpose
//! Mint and verify the HS256 tokens the console accepts as proof of identity.
//! The subject claim carries the user id; everything else about the caller
//! (role, blocked flag) is loaded from the store on every request.
//!
//! # Key invariants
//! - The algorithm is pinned to HS256.
//! - `iss` is `gatehouse-console` and `aud` is `gatehouse-admin`; both are
//!   validated along with `exp`.
//! - `sub` must parse as a positive user id.
//!
//! # Examples
//! ```rust
//! use admin_console::auth::token::TokenKeys;
//!
//! let keys = TokenKeys::new(b"secret", 60);
//! let token = keys.mint(7).expect("mint");
//! assert_eq!(keys.verify(&token).expect("verify"), 7);
//! ```
//!
//! # Common pitfalls
//! - Logging tokens. Log the user id instead.
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const TOKEN_ISSUER: &str = "gatehouse-console";
pub const TOKEN_AUDIENCE: &str = "gatehouse-admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid subject: {0}")]
    InvalidSubject(String),
    #[error("token lifetime of {0:?} overflows the expiry claim")]
    Lifetime(Duration),
}

/// Signing material and lifetime for console tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
    leeway: u64,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            ttl: Duration::from_secs(ttl_secs),
            leeway: 30,
        }
    }

    /// Issue a token whose subject is `user_id`.
    pub fn mint(&self, user_id: i64) -> Result<String, TokenError> {
        self.mint_at(user_id, now_epoch_seconds())
    }

    fn mint_at(&self, user_id: i64, issued_at: i64) -> Result<String, TokenError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| issued_at.checked_add(ttl))
            .ok_or(TokenError::Lifetime(self.ttl))?;
        let claims = ConsoleClaims {
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            sub: user_id.to_string(),
            iat: issued_at,
            exp,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Validate `token` and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.leeway;
        let data = jsonwebtoken::decode::<ConsoleClaims>(token, &self.decoding, &validation)?;
        match data.claims.sub.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(TokenError::InvalidSubject(data.claims.sub)),
        }
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
