//! Authenticated caller identity.
use crate::model::User;
use serde::{Deserialize, Serialize};

/// The caller of one request: a user and the single role it holds.
///
/// Inserted into request extensions by the gate after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub role_id: i64,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal {
            user_id: user.id,
            role_id: user.role_id,
        }
    }
}
