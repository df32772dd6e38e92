//! Route grants and role grant sets.
//!
//! # Purpose
//! Projects stored API permissions and roles onto the fields the evaluator
//! needs: the HTTP method, the route pattern, and the role type.
//!
//! # How it fits
//! The console loads a role with its API permissions and converts each
//! permission into a [`RouteGrant`]. A [`RoleGrants`] is the complete input
//! the evaluator needs for one principal.
//!
//! # Key invariants
//! - `route` is stored in normalized form (see [`crate::normalize_route`]).
//! - `role_type` is compared verbatim against [`crate::SUPER_ADMIN_TYPE`].
use crate::{HttpMethod, is_super_admin, normalize_route};
use serde::{Deserialize, Serialize};

/// Grant to call `method` on routes matching `route`.
///
/// # Example
/// ```rust
/// use gatehouse_authz::{HttpMethod, RouteGrant};
///
/// let grant = RouteGrant::new(HttpMethod::Get, "/v1/roles/");
/// assert_eq!(grant.route, "/v1/roles");
/// assert_eq!(grant.as_string(), "GET /v1/roles");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteGrant {
    pub method: HttpMethod,
    pub route: String,
}

impl RouteGrant {
    pub fn new(method: HttpMethod, route: impl AsRef<str>) -> Self {
        Self {
            method,
            route: normalize_route(route.as_ref()),
        }
    }

    /// Render the grant as `METHOD route`.
    pub fn as_string(&self) -> String {
        format!("{} {}", self.method.as_str(), self.route)
    }
}

impl std::fmt::Display for RouteGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// A role's type together with every route grant it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrants {
    pub role_type: String,
    pub grants: Vec<RouteGrant>,
}

impl RoleGrants {
    pub fn new(role_type: impl Into<String>, grants: Vec<RouteGrant>) -> Self {
        Self {
            role_type: role_type.into(),
            grants,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        is_super_admin(&self.role_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_grant_normalizes_route() {
        let grant = RouteGrant::new(HttpMethod::Delete, "v1//users/:id/");
        assert_eq!(grant.route, "/v1/users/:id");
        assert_eq!(grant.to_string(), "DELETE /v1/users/:id");
    }

    #[test]
    fn role_grants_detect_super_admin() {
        assert!(RoleGrants::new("SUPER_ADMIN", vec![]).is_super_admin());
        assert!(!RoleGrants::new("ADMIN", vec![]).is_super_admin());
    }
}
