//! In-memory implementation of the console store.
//!
//! # Purpose
//! Implements [`ConsoleStore`] entirely in memory for local development,
//! tests, and deployments that do not need durability.
//!
//! # Consistency
//! All records live in one [`State`] behind a single `tokio::sync::RwLock`.
//! Every mutation takes the write lock once and performs its checks and
//! writes under it, so a role's duplicate check, permission resolution, and
//! both membership sets change atomically. Reads take the read lock and never
//! observe a half-applied mutation.
//!
//! # Durability
//! Not durable: all state is lost on process restart.
use super::{ConsoleStore, PermissionKind, StoreConfig, StoreError, StoreResult};
use crate::model::{
    ApiPermission, ClientPermission, ListQuery, NewApiPermission, NewClientPermission, NewUser,
    Page, Role, RoleChanges, RoleDraft, User,
};
use crate::observability::{record_role_mutation, set_role_total};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_authz::{derive_role_type, identity_key, is_super_admin};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stored role with membership kept as id lists; expanded on read.
#[derive(Debug, Clone)]
struct RoleRecord {
    id: i64,
    name: String,
    role_type: String,
    description: Option<String>,
    permission_ids: Vec<i64>,
    client_permission_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Sequences {
    permission: i64,
    client_permission: i64,
    role: i64,
    user: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct State {
    sequences: Sequences,
    permissions: BTreeMap<i64, ApiPermission>,
    client_permissions: BTreeMap<i64, ClientPermission>,
    roles: BTreeMap<i64, RoleRecord>,
    users: BTreeMap<i64, User>,
}

impl State {
    fn expand(&self, record: &RoleRecord) -> Role {
        let mut permissions: Vec<ApiPermission> = record
            .permission_ids
            .iter()
            .filter_map(|id| self.permissions.get(id))
            .cloned()
            .collect();
        permissions.sort_by_key(|permission| permission.id);
        let mut client_permissions: Vec<ClientPermission> = record
            .client_permission_ids
            .iter()
            .filter_map(|id| self.client_permissions.get(id))
            .cloned()
            .collect();
        client_permissions.sort_by_key(|permission| (permission.sort, permission.id));
        Role {
            id: record.id,
            name: record.name.clone(),
            role_type: record.role_type.clone(),
            description: record.description.clone(),
            permissions,
            client_permissions,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn ensure_unique_role(
        &self,
        name: &str,
        role_type: &str,
        exclude: Option<i64>,
    ) -> StoreResult<()> {
        let key = identity_key(name, role_type);
        let duplicate = self.roles.values().any(|record| {
            Some(record.id) != exclude && identity_key(&record.name, &record.role_type) == key
        });
        if duplicate {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn ensure_permissions_exist(&self, api: &[i64], client: &[i64]) -> StoreResult<()> {
        let missing: Vec<i64> = api
            .iter()
            .copied()
            .filter(|id| !self.permissions.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::UnknownPermission {
                kind: PermissionKind::Api,
                ids: missing,
            });
        }
        let missing: Vec<i64> = client
            .iter()
            .copied()
            .filter(|id| !self.client_permissions.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::UnknownPermission {
                kind: PermissionKind::Client,
                ids: missing,
            });
        }
        Ok(())
    }

    fn ensure_email_free(&self, email: &str, exclude: Option<i64>) -> StoreResult<()> {
        if self
            .users
            .values()
            .any(|user| Some(user.id) != exclude && user.email == email)
        {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        Ok(())
    }

    fn record_role_total(&self) {
        set_role_total(self.roles.len() as u64);
    }
}

/// In-memory console store.
pub struct InMemoryStore {
    config: StoreConfig,
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(State::default())),
        }
    }
}

#[async_trait]
impl ConsoleStore for InMemoryStore {
    async fn list_permissions(&self, query: &ListQuery) -> StoreResult<Page<ApiPermission>> {
        let request = self.config.page_request(query);
        let state = self.state.read().await;
        Ok(request.slice(state.permissions.values().cloned()))
    }

    async fn get_permission(&self, id: i64) -> StoreResult<ApiPermission> {
        self.state
            .read()
            .await
            .permissions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("api permission".into()))
    }

    async fn create_permission(
        &self,
        permission: NewApiPermission,
    ) -> StoreResult<ApiPermission> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let created = ApiPermission {
            id: next_id(&mut state.sequences.permission),
            name: permission.name,
            method: permission.method,
            route: permission.route,
            description: permission.description,
            created_at: now,
            updated_at: now,
        };
        state.permissions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_permission(
        &self,
        id: i64,
        permission: NewApiPermission,
    ) -> StoreResult<ApiPermission> {
        let mut state = self.state.write().await;
        let existing = state
            .permissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("api permission".into()))?;
        existing.name = permission.name;
        existing.method = permission.method;
        existing.route = permission.route;
        existing.description = permission.description;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_permission(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.permissions.remove(&id).is_none() {
            return Err(StoreError::NotFound("api permission".into()));
        }
        for record in state.roles.values_mut() {
            record.permission_ids.retain(|existing| *existing != id);
        }
        Ok(())
    }

    async fn list_client_permissions(
        &self,
        query: &ListQuery,
    ) -> StoreResult<Page<ClientPermission>> {
        let request = self.config.page_request(query);
        let state = self.state.read().await;
        let mut ordered: Vec<ClientPermission> =
            state.client_permissions.values().cloned().collect();
        ordered.sort_by_key(|permission| (permission.sort, permission.id));
        Ok(request.slice(ordered))
    }

    async fn get_client_permission(&self, id: i64) -> StoreResult<ClientPermission> {
        self.state
            .read()
            .await
            .client_permissions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("client permission".into()))
    }

    async fn create_client_permission(
        &self,
        permission: NewClientPermission,
    ) -> StoreResult<ClientPermission> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let created = ClientPermission {
            id: next_id(&mut state.sequences.client_permission),
            name: permission.name,
            menu: permission.menu,
            path: permission.path,
            sort: permission.sort,
            description: permission.description,
            created_at: now,
            updated_at: now,
        };
        state.client_permissions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_client_permission(
        &self,
        id: i64,
        permission: NewClientPermission,
    ) -> StoreResult<ClientPermission> {
        let mut state = self.state.write().await;
        let existing = state
            .client_permissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("client permission".into()))?;
        existing.name = permission.name;
        existing.menu = permission.menu;
        existing.path = permission.path;
        existing.sort = permission.sort;
        existing.description = permission.description;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_client_permission(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.client_permissions.remove(&id).is_none() {
            return Err(StoreError::NotFound("client permission".into()));
        }
        for record in state.roles.values_mut() {
            record.client_permission_ids.retain(|existing| *existing != id);
        }
        Ok(())
    }

    async fn list_roles(&self, query: &ListQuery) -> StoreResult<Page<Role>> {
        let request = self.config.page_request(query);
        let state = self.state.read().await;
        let roles: Vec<Role> = state
            .roles
            .values()
            .map(|record| state.expand(record))
            .collect();
        Ok(request.slice(roles))
    }

    async fn get_role(&self, id: i64) -> StoreResult<Role> {
        let state = self.state.read().await;
        state
            .roles
            .get(&id)
            .map(|record| state.expand(record))
            .ok_or_else(|| StoreError::NotFound("role".into()))
    }

    async fn find_role_by_type(&self, role_type: &str) -> StoreResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .find(|record| record.role_type == role_type)
            .map(|record| state.expand(record)))
    }

    async fn create_role(&self, draft: RoleDraft) -> StoreResult<Role> {
        let role_type =
            derive_role_type(&draft.name).map_err(|err| StoreError::Unexpected(anyhow!(err)))?;
        let mut state = self.state.write().await;
        state.ensure_unique_role(&draft.name, &role_type, None)?;
        state.ensure_permissions_exist(&draft.permission_ids, &draft.client_permission_ids)?;

        let now = Utc::now();
        let record = RoleRecord {
            id: next_id(&mut state.sequences.role),
            name: draft.name,
            role_type,
            description: draft.description,
            permission_ids: draft.permission_ids,
            client_permission_ids: draft.client_permission_ids,
            created_at: now,
            updated_at: now,
        };
        let role = state.expand(&record);
        state.roles.insert(record.id, record);
        state.record_role_total();
        record_role_mutation("created");
        Ok(role)
    }

    async fn update_role(&self, id: i64, changes: RoleChanges) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        let existing = state
            .roles
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("role".into()))?;
        let name = changes.name.unwrap_or_else(|| existing.name.clone());
        let role_type =
            derive_role_type(&name).map_err(|err| StoreError::Unexpected(anyhow!(err)))?;
        if is_super_admin(&existing.role_type) && role_type != existing.role_type {
            return Err(StoreError::ProtectedRole(existing.name));
        }
        state.ensure_unique_role(&name, &role_type, Some(id))?;
        state.ensure_permissions_exist(&changes.permission_ids, &changes.client_permission_ids)?;

        let record = RoleRecord {
            id,
            name,
            role_type,
            description: changes.description.unwrap_or(existing.description),
            permission_ids: changes.permission_ids,
            client_permission_ids: changes.client_permission_ids,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        let role = state.expand(&record);
        state.roles.insert(id, record);
        record_role_mutation("updated");
        Ok(role)
    }

    async fn delete_role(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let record = state
            .roles
            .get(&id)
            .ok_or_else(|| StoreError::NotFound("role".into()))?;
        if is_super_admin(&record.role_type) {
            return Err(StoreError::ProtectedRole(record.name.clone()));
        }
        let users = state.users.values().filter(|user| user.role_id == id).count() as u64;
        if users > 0 {
            return Err(StoreError::RoleInUse { role_id: id, users });
        }
        state.roles.remove(&id);
        state.record_role_total();
        record_role_mutation("deleted");
        Ok(())
    }

    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<User>> {
        let request = self.config.page_request(query);
        let state = self.state.read().await;
        Ok(request.slice(state.users.values().cloned()))
    }

    async fn get_user(&self, id: i64) -> StoreResult<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&user.role_id) {
            return Err(StoreError::UnknownRole(user.role_id));
        }
        state.ensure_email_free(&user.email, None)?;
        let now = Utc::now();
        let created = User {
            id: next_id(&mut state.sequences.user),
            name: user.name,
            email: user.email,
            role_id: user.role_id,
            blocked: user.blocked,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Err(StoreError::NotFound("user".into()));
        }
        if !state.roles.contains_key(&user.role_id) {
            return Err(StoreError::UnknownRole(user.role_id));
        }
        state.ensure_email_free(&user.email, Some(id))?;
        let existing = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("user".into()))?;
        existing.name = user.name;
        existing.email = user.email;
        existing.role_id = user.role_id;
        existing.blocked = user.blocked;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
