//! Role naming rules.
//!
//! # Purpose
//! Derives the normalized role `type` token from an administrator-supplied
//! role name and defines the reserved super-admin marker.
//!
//! # Key invariants
//! - [`derive_role_type`] is idempotent: deriving from a derived type returns it unchanged.
//! - Two roles collide when their names are equal ignoring case and their
//!   types are equal ignoring case ([`identity_key`] builds the comparison key).
//!
//! # Examples
//! ```rust
//! use gatehouse_authz::derive_role_type;
//!
//! assert_eq!(derive_role_type("  Content   editor ").unwrap(), "CONTENT_EDITOR");
//! ```
use crate::{AuthzError, AuthzResult};

/// Role type that bypasses route checks and can never be deleted.
pub const SUPER_ADMIN_TYPE: &str = "SUPER_ADMIN";

/// Trim a role name and reject names that are empty after trimming.
pub fn normalize_role_name(name: &str) -> AuthzResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AuthzError::EmptyRoleName);
    }
    Ok(trimmed.to_string())
}

/// Derive the role type: uppercase, trimmed, whitespace runs replaced by `_`.
pub fn derive_role_type(name: &str) -> AuthzResult<String> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.is_empty() {
        return Err(AuthzError::EmptyRoleName);
    }
    Ok(parts.join("_").to_uppercase())
}

pub fn is_super_admin(role_type: &str) -> bool {
    role_type == SUPER_ADMIN_TYPE
}

/// Case-insensitive `(name, type)` key used for duplicate detection.
pub fn identity_key(name: &str, role_type: &str) -> (String, String) {
    (name.trim().to_lowercase(), role_type.to_lowercase())
}
