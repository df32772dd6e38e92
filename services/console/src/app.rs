//! Console HTTP application wiring.
//!
//! # Purpose
//! Builds the axum routers and defines the shared state injected into
//! handlers and gate middleware.
//!
//! # Route groups
//! - public: system info/health and the OpenAPI document;
//! - authenticated: `/v1/me*`, which needs a caller but no route grant;
//! - authorized: every catalog/role/user route, behind both gate layers.
//!
//! Gate layers are attached with `route_layer` so unknown paths still 404
//! instead of 401.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::api::types::FeatureFlags;
use crate::auth::gate;
use crate::auth::identity::IdentityResolver;
use crate::auth::token::TokenKeys;
use crate::observability;
use crate::store::ConsoleStore;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub features: FeatureFlags,
    pub store: Arc<dyn ConsoleStore + Send + Sync>,
    pub identity: Arc<dyn IdentityResolver + Send + Sync>,
    pub tokens: TokenKeys,
    pub bootstrap_enabled: bool,
    pub bootstrap_token: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    let authorized = Router::new()
        .route(
            "/v1/roles",
            get(api::roles::list_roles).post(api::roles::create_role),
        )
        .route(
            "/v1/roles/:id",
            get(api::roles::get_role)
                .put(api::roles::update_role)
                .delete(api::roles::delete_role),
        )
        .route(
            "/v1/permissions",
            get(api::permissions::list_permissions).post(api::permissions::create_permission),
        )
        .route(
            "/v1/permissions/:id",
            get(api::permissions::get_permission)
                .put(api::permissions::update_permission)
                .delete(api::permissions::delete_permission),
        )
        .route(
            "/v1/client-permissions",
            get(api::client_permissions::list_client_permissions)
                .post(api::client_permissions::create_client_permission),
        )
        .route(
            "/v1/client-permissions/:id",
            get(api::client_permissions::get_client_permission)
                .put(api::client_permissions::update_client_permission)
                .delete(api::client_permissions::delete_client_permission),
        )
        .route(
            "/v1/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route(
            "/v1/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        // Layers run outside-in: authenticate, then authorize.
        .route_layer(from_fn_with_state(state.clone(), gate::authorize))
        .route_layer(from_fn_with_state(state.clone(), gate::authenticate));

    let authenticated = Router::new()
        .route("/v1/me", get(api::me::me))
        .route("/v1/me/affordances", get(api::me::affordances))
        .route_layer(from_fn_with_state(state.clone(), gate::authenticate));

    Router::new()
        .route("/v1/system/info", get(api::system::system_info))
        .route("/v1/system/health", get(api::system::system_health))
        .merge(authenticated)
        .merge(authorized)
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}

pub fn build_bootstrap_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/internal/bootstrap/initialize",
            axum::routing::post(api::bootstrap::initialize),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
