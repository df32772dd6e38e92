//! Identity resolution: who is calling.
//!
//! # Purpose
//! [`IdentityResolver`] turns request headers into a [`Principal`]. The
//! console treats it as an external collaborator; [`TokenIdentityResolver`]
//! is the shipped implementation, verifying a console bearer token and
//! loading the user it names.
//!
//! # Key invariants
//! - Blocked users and users that no longer exist do not authenticate.
//! - The role id in the principal comes from the store, never from the token,
//!   so role reassignment takes effect on the next request.
use crate::auth::principal::Principal;
use crate::auth::token::TokenKeys;
use crate::store::{ConsoleStore, StoreError};
use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid bearer token")]
    InvalidToken,
    #[error("unknown user")]
    UnknownUser,
    #[error("user is blocked")]
    Blocked,
    #[error(transparent)]
    Store(StoreError),
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;
}

/// Resolve callers from `Authorization: Bearer <token>` headers.
pub struct TokenIdentityResolver {
    keys: TokenKeys,
    store: Arc<dyn ConsoleStore + Send + Sync>,
}

impl TokenIdentityResolver {
    pub fn new(keys: TokenKeys, store: Arc<dyn ConsoleStore + Send + Sync>) -> Self {
        Self { keys, store }
    }
}

#[async_trait]
impl IdentityResolver for TokenIdentityResolver {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        let user_id = self.keys.verify(token).map_err(|err| {
            tracing::debug!(error = %err, "bearer token rejected");
            AuthError::InvalidToken
        })?;
        let user = match self.store.get_user(user_id).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => return Err(AuthError::UnknownUser),
            Err(err) => return Err(AuthError::Store(err)),
        };
        if user.blocked {
            return Err(AuthError::Blocked);
        }
        Ok(Principal::from(&user))
    }
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
