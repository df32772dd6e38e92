//! Per-request authorization decisions.
//!
//! # Purpose
//! Decides whether a role may call a `(method, route)` pair.
//!
//! # Key invariants
//! - [`evaluate`] reads only its arguments; identical inputs give identical verdicts.
//! - The super-admin role is authorized without consulting its grants.
//! - Any other role is authorized only by a grant with the same method and a
//!   matching route (see [`crate::route_matches`]).
//!
//! # Examples
//! ```rust
//! use gatehouse_authz::{HttpMethod, RequestDescriptor, RoleGrants, RouteGrant, Verdict, evaluate};
//!
//! let role = RoleGrants::new("EDITOR", vec![RouteGrant::new(HttpMethod::Get, "/v1/roles")]);
//! let denied = RequestDescriptor::new(HttpMethod::Delete, "/v1/roles");
//! assert_eq!(evaluate(&role, &denied), Verdict::Unauthorized);
//! ```
use crate::{HttpMethod, RoleGrants, normalize_route, route_matches};
use serde::{Deserialize, Serialize};

/// Method and normalized route of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub route: String,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, route: impl AsRef<str>) -> Self {
        Self {
            method,
            route: normalize_route(route.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Unauthorized,
    Authorized,
}

impl Verdict {
    pub fn is_authorized(self) -> bool {
        matches!(self, Verdict::Authorized)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Unauthorized => "unauthorized",
            Verdict::Authorized => "authorized",
        }
    }
}

/// Decide whether `role` may perform `request`.
pub fn evaluate(role: &RoleGrants, request: &RequestDescriptor) -> Verdict {
    if role.is_super_admin() {
        return Verdict::Authorized;
    }
    let allowed = role
        .grants
        .iter()
        .any(|grant| grant.method == request.method && route_matches(&grant.route, &request.route));
    if allowed {
        Verdict::Authorized
    } else {
        Verdict::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GrantMatcher, RouteGrant};

    fn editor() -> RoleGrants {
        RoleGrants::new(
            "EDITOR",
            vec![RouteGrant::new(HttpMethod::Get, "/v1/client-permissions")],
        )
    }

    #[test]
    fn granted_method_and_route_is_authorized() {
        let role = editor();
        let request = RequestDescriptor::new(HttpMethod::Get, "/v1/client-permissions");
        assert_eq!(evaluate(&role, &request), Verdict::Authorized);
    }

    #[test]
    fn method_mismatch_is_unauthorized() {
        let role = editor();
        let request = RequestDescriptor::new(HttpMethod::Delete, "/v1/client-permissions");
        assert_eq!(evaluate(&role, &request), Verdict::Unauthorized);
    }

    #[test]
    fn role_without_grants_is_denied_everything() {
        let role = RoleGrants::new("EDITOR", vec![]);
        for method in HttpMethod::ALL {
            for route in ["/", "/v1/roles", "/v1/roles/1"] {
                let request = RequestDescriptor::new(method, route);
                assert_eq!(evaluate(&role, &request), Verdict::Unauthorized);
            }
        }
    }

    #[test]
    fn super_admin_is_authorized_without_grants() {
        let role = RoleGrants::new("SUPER_ADMIN", vec![]);
        let request = RequestDescriptor::new(HttpMethod::Delete, "/v1/roles/1");
        assert_eq!(evaluate(&role, &request), Verdict::Authorized);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let role = RoleGrants::new(
            "EDITOR",
            vec![RouteGrant::new(HttpMethod::Put, "/v1/roles/:id")],
        );
        let request = RequestDescriptor::new(HttpMethod::Put, "/v1/roles/4");
        let first = evaluate(&role, &request);
        let second = evaluate(&role, &request);
        assert_eq!(first, second);
        assert!(first.is_authorized());
    }

    #[test]
    fn evaluate_agrees_with_grant_matcher() {
        let role = RoleGrants::new(
            "EDITOR",
            vec![
                RouteGrant::new(HttpMethod::Get, "/v1/roles"),
                RouteGrant::new(HttpMethod::Put, "/v1/roles/:id"),
                RouteGrant::new(HttpMethod::Delete, "/v1/users/*"),
            ],
        );
        let matcher = GrantMatcher::new(&role);
        for method in HttpMethod::ALL {
            for route in ["/v1/roles", "/v1/roles/3", "/v1/users/3", "/v1/users", "/v1/x"] {
                let request = RequestDescriptor::new(method, route);
                assert_eq!(
                    evaluate(&role, &request).is_authorized(),
                    matcher.allows(method, route),
                    "{method} {route}"
                );
            }
        }
    }
}
