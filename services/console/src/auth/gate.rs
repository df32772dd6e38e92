//! Request gate: authenticate, then authorize, before a handler runs.
//!
//! # How it fits
//! Both steps are axum middleware installed with
//! `axum::middleware::from_fn_with_state`. [`authenticate`] resolves the
//! caller and stores the [`Principal`] in request extensions; [`authorize`]
//! loads the caller's role, compiles its grants into a `GrantMatcher`, and
//! checks the request's method and path against it. Routes that need only authentication (`/v1/me`) skip
//! [`authorize`].
//!
//! # Key invariants
//! - No handler behind [`authorize`] runs on an `Unauthorized` verdict.
//! - Methods outside the permission catalog's vocabulary are allowed only for
//!   the super-admin role.
//! - Denials are logged at `info` with user id, method, and path; tokens are
//!   never logged.
use crate::api::error::{ApiError, api_forbidden, api_internal, api_unauthorized};
use crate::app::AppState;
use crate::auth::identity::AuthError;
use crate::auth::principal::Principal;
use crate::model::Role;
use crate::observability::record_decision;
use crate::store::StoreError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use gatehouse_authz::{GrantMatcher, HttpMethod, Verdict};

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = state
        .identity
        .authenticate(request.headers())
        .await
        .map_err(auth_error)?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

pub async fn authorize(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .copied()
        .ok_or_else(|| api_unauthorized("authentication required"))?;
    let role = match state.store.get_role(principal.role_id).await {
        Ok(role) => role,
        Err(StoreError::NotFound(_)) => {
            tracing::info!(user_id = principal.user_id, "caller role no longer exists");
            return Err(api_forbidden("forbidden"));
        }
        Err(err) => return Err(api_internal("failed to load role", &err)),
    };

    let path = request.uri().path();
    let verdict = decide(&role, request.method().as_str(), path);
    record_decision(verdict);
    if !verdict.is_authorized() {
        tracing::info!(
            user_id = principal.user_id,
            role = %role.role_type,
            method = %request.method(),
            path = %path,
            "authorization denied"
        );
        return Err(api_forbidden("forbidden"));
    }
    Ok(next.run(request).await)
}

/// Verdict for `method path` under `role`.
pub fn decide(role: &Role, method: &str, path: &str) -> Verdict {
    let matcher = GrantMatcher::new(&role.grants());
    match method.parse::<HttpMethod>() {
        Ok(method) => matcher.verdict(method, path),
        Err(_) if matcher.is_super_admin() => Verdict::Authorized,
        Err(_) => Verdict::Unauthorized,
    }
}

fn auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::Store(err) => api_internal("failed to resolve identity", &err),
        other => {
            tracing::debug!(reason = %other, "authentication failed");
            api_unauthorized("authentication required")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiPermission;
    use chrono::Utc;

    fn role(role_type: &str, grants: &[(HttpMethod, &str)]) -> Role {
        let now = Utc::now();
        Role {
            id: 1,
            name: role_type.to_string(),
            role_type: role_type.to_string(),
            description: None,
            permissions: grants
                .iter()
                .enumerate()
                .map(|(index, (method, route))| ApiPermission {
                    id: index as i64 + 1,
                    name: route.to_string(),
                    method: *method,
                    route: route.to_string(),
                    description: None,
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
            client_permissions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn decide_uses_role_grants() {
        let editor = role("EDITOR", &[(HttpMethod::Get, "/v1/roles/:id")]);
        assert_eq!(decide(&editor, "GET", "/v1/roles/7"), Verdict::Authorized);
        assert_eq!(decide(&editor, "DELETE", "/v1/roles/7"), Verdict::Unauthorized);
        assert_eq!(decide(&editor, "GET", "/v1/users"), Verdict::Unauthorized);
    }

    #[test]
    fn decide_compares_stored_routes_literally() {
        let reporter = role(
            "REPORTER",
            &[
                (HttpMethod::Get, "/v1/reports(/:id"),
                (HttpMethod::Get, "/v1/a.b/:id"),
            ],
        );
        assert_eq!(decide(&reporter, "GET", "/v1/reports/7"), Verdict::Unauthorized);
        assert_eq!(decide(&reporter, "GET", "/v1/axb/7"), Verdict::Unauthorized);
        assert_eq!(decide(&reporter, "GET", "/v1/a.b/7"), Verdict::Authorized);
    }

    #[test]
    fn unknown_methods_need_super_admin() {
        let editor = role("EDITOR", &[(HttpMethod::Get, "/v1/roles")]);
        assert_eq!(decide(&editor, "PATCH", "/v1/roles"), Verdict::Unauthorized);
        let admin = role("SUPER_ADMIN", &[]);
        assert_eq!(decide(&admin, "PATCH", "/v1/roles"), Verdict::Authorized);
        assert_eq!(decide(&admin, "DELETE", "/v1/anything"), Verdict::Authorized);
    }

    #[test]
    fn auth_errors_become_unauthorized() {
        let err = auth_error(AuthError::Blocked);
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        let err = auth_error(AuthError::Store(StoreError::Unexpected(anyhow::anyhow!("db"))));
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
