//! Console storage abstraction.
//!
//! # Purpose
//! [`ConsoleStore`] is the single storage seam for users, roles, and both
//! permission catalogs. Handlers hold it as `Arc<dyn ConsoleStore + Send + Sync>`.
//!
//! # Key invariants
//! - Role mutations are atomic: the duplicate check, permission resolution,
//!   and write (including both membership sets) commit together or not at all.
//! - Role membership ids are resolved strictly; unknown ids fail the whole
//!   mutation with [`StoreError::UnknownPermission`].
//! - Deleting a catalog entry detaches it from every role.
//! - The `SUPER_ADMIN` role cannot be deleted; neither can a role users hold.
use crate::model::{
    ApiPermission, ClientPermission, ListQuery, NewApiPermission, NewClientPermission, NewUser,
    Page, Role, RoleChanges, RoleDraft, User,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod paging;
pub mod postgres;

pub use paging::PageRequest;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// Which catalog an unknown id was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Api,
    Client,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::Api => f.write_str("api permission"),
            PermissionKind::Client => f.write_str("client permission"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate role name: {0}")]
    DuplicateName(String),
    #[error("protected role: {0}")]
    ProtectedRole(String),
    #[error("unknown {kind} ids: {ids:?}")]
    UnknownPermission { kind: PermissionKind, ids: Vec<i64> },
    #[error("role {role_id} is assigned to {users} user(s)")]
    RoleInUse { role_id: i64, users: u64 },
    #[error("unknown role: {0}")]
    UnknownRole(i64),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ConsoleStore: Send + Sync {
    async fn list_permissions(&self, query: &ListQuery) -> StoreResult<Page<ApiPermission>>;
    async fn get_permission(&self, id: i64) -> StoreResult<ApiPermission>;
    async fn create_permission(&self, permission: NewApiPermission)
    -> StoreResult<ApiPermission>;
    async fn update_permission(
        &self,
        id: i64,
        permission: NewApiPermission,
    ) -> StoreResult<ApiPermission>;
    async fn delete_permission(&self, id: i64) -> StoreResult<()>;

    async fn list_client_permissions(
        &self,
        query: &ListQuery,
    ) -> StoreResult<Page<ClientPermission>>;
    async fn get_client_permission(&self, id: i64) -> StoreResult<ClientPermission>;
    async fn create_client_permission(
        &self,
        permission: NewClientPermission,
    ) -> StoreResult<ClientPermission>;
    async fn update_client_permission(
        &self,
        id: i64,
        permission: NewClientPermission,
    ) -> StoreResult<ClientPermission>;
    async fn delete_client_permission(&self, id: i64) -> StoreResult<()>;

    async fn list_roles(&self, query: &ListQuery) -> StoreResult<Page<Role>>;
    async fn get_role(&self, id: i64) -> StoreResult<Role>;
    async fn find_role_by_type(&self, role_type: &str) -> StoreResult<Option<Role>>;
    async fn create_role(&self, draft: RoleDraft) -> StoreResult<Role>;
    async fn update_role(&self, id: i64, changes: RoleChanges) -> StoreResult<Role>;
    async fn delete_role(&self, id: i64) -> StoreResult<()>;

    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<User>>;
    async fn get_user(&self, id: i64) -> StoreResult<User>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: i64, user: NewUser) -> StoreResult<User>;
    async fn delete_user(&self, id: i64) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
