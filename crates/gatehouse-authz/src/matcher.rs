use crate::{HttpMethod, RoleGrants, RouteGrant, RoutePattern, Verdict, is_pattern, normalize_route};
use std::collections::{HashMap, HashSet};

/// Grants indexed by method for repeated checks against one role.
///
/// Literal routes are looked up in a set; pattern routes are compiled once
/// and only those are scanned.
#[derive(Debug, Clone, Default)]
pub struct GrantMatcher {
    super_admin: bool,
    exact: HashMap<HttpMethod, HashSet<String>>,
    patterns: HashMap<HttpMethod, Vec<RoutePattern>>,
}

impl GrantMatcher {
    pub fn new(role: &RoleGrants) -> Self {
        let mut matcher = Self {
            super_admin: role.is_super_admin(),
            ..Self::default()
        };
        for grant in &role.grants {
            matcher.insert(grant);
        }
        matcher
    }

    fn insert(&mut self, grant: &RouteGrant) {
        let route = normalize_route(&grant.route);
        if is_pattern(&route) {
            self.patterns
                .entry(grant.method)
                .or_default()
                .push(RoutePattern::compile(&route));
        } else {
            self.exact.entry(grant.method).or_default().insert(route);
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    pub fn allows(&self, method: HttpMethod, route: &str) -> bool {
        if self.super_admin {
            return true;
        }
        let route = normalize_route(route);
        if self
            .exact
            .get(&method)
            .is_some_and(|routes| routes.contains(&route))
        {
            return true;
        }
        self.patterns
            .get(&method)
            .is_some_and(|patterns| patterns.iter().any(|pattern| pattern.matches(&route)))
    }

    pub fn verdict(&self, method: HttpMethod, route: &str) -> Verdict {
        if self.allows(method, route) {
            Verdict::Authorized
        } else {
            Verdict::Unauthorized
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.super_admin && self.exact.is_empty() && self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> RoleGrants {
        RoleGrants::new(
            "EDITOR",
            vec![
                RouteGrant::new(HttpMethod::Get, "/v1/roles"),
                RouteGrant::new(HttpMethod::Get, "/v1/roles/:id"),
                RouteGrant::new(HttpMethod::Put, "/v1/permissions/*"),
            ],
        )
    }

    #[test]
    fn matcher_allows_exact_and_pattern_routes() {
        let matcher = GrantMatcher::new(&editor());
        assert!(matcher.allows(HttpMethod::Get, "/v1/roles"));
        assert!(matcher.allows(HttpMethod::Get, "/v1/roles/12?expand=true"));
        assert!(matcher.allows(HttpMethod::Put, "/v1/permissions/3"));
    }

    #[test]
    fn matcher_requires_method_match() {
        let matcher = GrantMatcher::new(&editor());
        assert!(!matcher.allows(HttpMethod::Delete, "/v1/roles/12"));
        assert!(!matcher.allows(HttpMethod::Post, "/v1/roles"));
        assert!(!matcher.allows(HttpMethod::Get, "/v1/permissions/3"));
    }

    #[test]
    fn empty_role_allows_nothing() {
        let matcher = GrantMatcher::new(&RoleGrants::new("VIEWER", vec![]));
        assert!(matcher.is_empty());
        for method in HttpMethod::ALL {
            assert!(!matcher.allows(method, "/v1/roles"));
        }
    }

    #[test]
    fn regex_like_grants_are_compared_literally() {
        let role = RoleGrants::new(
            "REPORTER",
            vec![
                RouteGrant::new(HttpMethod::Get, "/v1/reports(/:id"),
                RouteGrant::new(HttpMethod::Get, "/v1/a.b/:id"),
            ],
        );
        let matcher = GrantMatcher::new(&role);
        assert!(!matcher.allows(HttpMethod::Get, "/v1/reports/7"));
        assert!(!matcher.allows(HttpMethod::Get, "/v1/axb/7"));
        assert!(matcher.allows(HttpMethod::Get, "/v1/a.b/7"));
        assert_eq!(
            matcher.verdict(HttpMethod::Get, "/v1/a.b/7"),
            Verdict::Authorized
        );
    }

    #[test]
    fn super_admin_allows_everything() {
        let matcher = GrantMatcher::new(&RoleGrants::new("SUPER_ADMIN", vec![]));
        assert!(!matcher.is_empty());
        assert!(matcher.allows(HttpMethod::Delete, "/v1/anything/at/all"));
    }
}
