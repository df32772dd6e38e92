//! OpenAPI document for the console API.
use crate::api::types::{
    AffordanceResponse, BootstrapInitializeRequest, BootstrapInitializeResponse, ErrorResponse,
    FeatureFlags, HealthStatus, MeResponse, SystemInfo,
};
use crate::api::{bootstrap, client_permissions, me, permissions, roles, system, users};
use crate::model::{
    ApiPermission, ApiPermissionPage, ApiPermissionRequest, ClientPermission,
    ClientPermissionPage, ClientPermissionRequest, Role, RoleCreateRequest, RolePage,
    RoleSummary, RoleUpdateRequest, User, UserPage, UserRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "gatehouse-console",
        version = "v1",
        description = "Gatehouse admin console HTTP API"
    ),
    paths(
        system::system_info,
        system::system_health,
        me::me,
        me::affordances,
        roles::list_roles,
        roles::get_role,
        roles::create_role,
        roles::update_role,
        roles::delete_role,
        permissions::list_permissions,
        permissions::get_permission,
        permissions::create_permission,
        permissions::update_permission,
        permissions::delete_permission,
        client_permissions::list_client_permissions,
        client_permissions::get_client_permission,
        client_permissions::create_client_permission,
        client_permissions::update_client_permission,
        client_permissions::delete_client_permission,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        bootstrap::initialize
    ),
    components(schemas(
        FeatureFlags,
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        MeResponse,
        AffordanceResponse,
        BootstrapInitializeRequest,
        BootstrapInitializeResponse,
        Role,
        RoleSummary,
        RoleCreateRequest,
        RoleUpdateRequest,
        RolePage,
        ApiPermission,
        ApiPermissionRequest,
        ApiPermissionPage,
        ClientPermission,
        ClientPermissionRequest,
        ClientPermissionPage,
        User,
        UserRequest,
        UserPage
    )),
    tags(
        (name = "system", description = "System and health endpoints"),
        (name = "me", description = "Caller profile and UI affordances"),
        (name = "roles", description = "Role management"),
        (name = "permissions", description = "API permission catalog"),
        (name = "client-permissions", description = "Client permission (menu) catalog"),
        (name = "users", description = "User management"),
        (name = "bootstrap", description = "One-time console initialization")
    )
)]
pub struct ApiDoc;
