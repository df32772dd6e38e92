//! Postgres-backed implementation of the console store.
//!
//! # Data model
//! - `api_permissions`, `client_permissions`, `roles`, and `users` hold the
//!   records; ids are `BIGSERIAL`.
//! - `role_permissions` and `role_client_permissions` are attribute-free join
//!   tables that cascade on delete of either side, so deleting a catalog entry
//!   detaches it from every role.
//! - `users.role_id` is `ON DELETE RESTRICT`.
//! - The unique index on `(lower(name), lower(type))` is the authoritative
//!   duplicate guard for roles; the explicit check in the transaction only
//!   produces a friendlier error first.
//!
//! # Consistency
//! Each mutation runs in one transaction. Role mutations lock the role row
//! (`FOR UPDATE`) and the referenced catalog rows (`FOR KEY SHARE`) before
//! replacing memberships, so concurrent deletes cannot slip in between the
//! existence check and the join-table insert.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`.
//! - Database URLs may contain credentials; never log them.
use super::{ConsoleStore, PermissionKind, StoreConfig, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{
    ApiPermission, ClientPermission, ListQuery, NewApiPermission, NewClientPermission, NewUser,
    Page, Role, RoleChanges, RoleDraft, User,
};
use crate::observability::{record_role_mutation, set_role_total};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_authz::{HttpMethod, derive_role_type, is_super_admin};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

const API_PERMISSION_COLUMNS: &str =
    "id, name, method, route, description, created_at, updated_at";
const CLIENT_PERMISSION_COLUMNS: &str =
    "id, name, menu, path, sort, description, created_at, updated_at";
const ROLE_COLUMNS: &str = "id, name, type AS role_type, description, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, role_id, blocked, created_at, updated_at";

/// Durable console store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use admin_console::config::PostgresConfig;
/// use admin_console::store::{StoreConfig, postgres::PostgresStore};
///
/// async fn open(pg: PostgresConfig, cfg: StoreConfig) {
///     let _ = PostgresStore::connect(&pg, cfg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
    config: StoreConfig,
}

#[derive(Debug, Clone, FromRow)]
struct DbApiPermission {
    id: i64,
    name: String,
    method: String,
    route: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbClientPermission {
    id: i64,
    name: String,
    menu: String,
    path: String,
    sort: i32,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbRole {
    id: i64,
    name: String,
    role_type: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbRolePermission {
    role_id: i64,
    #[sqlx(flatten)]
    permission: DbApiPermission,
}

#[derive(Debug, Clone, FromRow)]
struct DbRoleClientPermission {
    role_id: i64,
    #[sqlx(flatten)]
    permission: DbClientPermission,
}

#[derive(Debug, Clone, FromRow)]
struct DbUser {
    id: i64,
    name: String,
    email: String,
    role_id: i64,
    blocked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl PostgresStore {
    /// Connect, apply migrations, and return a ready store.
    pub async fn connect(pg: &PostgresConfig, config: StoreConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connect = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
            .await
            .map_err(|_| StoreError::Unexpected(anyhow!("timed out connecting to postgres")))??;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let store = Self { pool, config };
        store.refresh_role_total().await?;
        Ok(store)
    }

    /// Post-commit gauge refresh. The write has already landed, so a failed
    /// count is logged rather than surfaced to the caller.
    async fn refresh_role_gauge(&self) {
        if let Err(err) = self.refresh_role_total().await {
            tracing::warn!(error = %err, "failed to refresh role gauge");
        }
    }

    async fn refresh_role_total(&self) -> StoreResult<()> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await?;
        set_role_total(total.max(0) as u64);
        Ok(())
    }

    async fn load_role(&self, conn: &mut PgConnection, row: DbRole) -> StoreResult<Role> {
        expand_roles(conn, vec![row])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Unexpected(anyhow!("role expansion returned no rows")))
    }
}

#[async_trait]
impl ConsoleStore for PostgresStore {
    async fn list_permissions(&self, query: &ListQuery) -> StoreResult<Page<ApiPermission>> {
        let request = self.config.page_request(query);
        let pattern = request.like_pattern();
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM api_permissions WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;
        let rows: Vec<DbApiPermission> = sqlx::query_as(&format!(
            "SELECT {API_PERMISSION_COLUMNS} FROM api_permissions \
             WHERE ($1::text IS NULL OR name ILIKE $1) ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(i64::from(request.limit))
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let items = rows
            .into_iter()
            .map(api_permission_from_db)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(request.page_of(items, total as u64))
    }

    async fn get_permission(&self, id: i64) -> StoreResult<ApiPermission> {
        let row: Option<DbApiPermission> = sqlx::query_as(&format!(
            "SELECT {API_PERMISSION_COLUMNS} FROM api_permissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(api_permission_from_db)
            .ok_or_else(|| StoreError::NotFound("api permission".into()))?
    }

    async fn create_permission(
        &self,
        permission: NewApiPermission,
    ) -> StoreResult<ApiPermission> {
        let row: DbApiPermission = sqlx::query_as(&format!(
            "INSERT INTO api_permissions (name, method, route, description) \
             VALUES ($1, $2, $3, $4) RETURNING {API_PERMISSION_COLUMNS}"
        ))
        .bind(&permission.name)
        .bind(permission.method.as_str())
        .bind(&permission.route)
        .bind(&permission.description)
        .fetch_one(&self.pool)
        .await?;
        api_permission_from_db(row)
    }

    async fn update_permission(
        &self,
        id: i64,
        permission: NewApiPermission,
    ) -> StoreResult<ApiPermission> {
        let row: Option<DbApiPermission> = sqlx::query_as(&format!(
            "UPDATE api_permissions SET name = $2, method = $3, route = $4, description = $5, \
             updated_at = now() WHERE id = $1 RETURNING {API_PERMISSION_COLUMNS}"
        ))
        .bind(id)
        .bind(&permission.name)
        .bind(permission.method.as_str())
        .bind(&permission.route)
        .bind(&permission.description)
        .fetch_optional(&self.pool)
        .await?;
        row.map(api_permission_from_db)
            .ok_or_else(|| StoreError::NotFound("api permission".into()))?
    }

    async fn delete_permission(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM api_permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("api permission".into()));
        }
        Ok(())
    }

    async fn list_client_permissions(
        &self,
        query: &ListQuery,
    ) -> StoreResult<Page<ClientPermission>> {
        let request = self.config.page_request(query);
        let pattern = request.like_pattern();
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM client_permissions WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;
        let rows: Vec<DbClientPermission> = sqlx::query_as(&format!(
            "SELECT {CLIENT_PERMISSION_COLUMNS} FROM client_permissions \
             WHERE ($1::text IS NULL OR name ILIKE $1) ORDER BY sort, id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(i64::from(request.limit))
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let items = rows.into_iter().map(client_permission_from_db).collect();
        Ok(request.page_of(items, total as u64))
    }

    async fn get_client_permission(&self, id: i64) -> StoreResult<ClientPermission> {
        let row: Option<DbClientPermission> = sqlx::query_as(&format!(
            "SELECT {CLIENT_PERMISSION_COLUMNS} FROM client_permissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(client_permission_from_db)
            .ok_or_else(|| StoreError::NotFound("client permission".into()))
    }

    async fn create_client_permission(
        &self,
        permission: NewClientPermission,
    ) -> StoreResult<ClientPermission> {
        let row: DbClientPermission = sqlx::query_as(&format!(
            "INSERT INTO client_permissions (name, menu, path, sort, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CLIENT_PERMISSION_COLUMNS}"
        ))
        .bind(&permission.name)
        .bind(&permission.menu)
        .bind(&permission.path)
        .bind(permission.sort)
        .bind(&permission.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(client_permission_from_db(row))
    }

    async fn update_client_permission(
        &self,
        id: i64,
        permission: NewClientPermission,
    ) -> StoreResult<ClientPermission> {
        let row: Option<DbClientPermission> = sqlx::query_as(&format!(
            "UPDATE client_permissions SET name = $2, menu = $3, path = $4, sort = $5, \
             description = $6, updated_at = now() WHERE id = $1 \
             RETURNING {CLIENT_PERMISSION_COLUMNS}"
        ))
        .bind(id)
        .bind(&permission.name)
        .bind(&permission.menu)
        .bind(&permission.path)
        .bind(permission.sort)
        .bind(&permission.description)
        .fetch_optional(&self.pool)
        .await?;
        row.map(client_permission_from_db)
            .ok_or_else(|| StoreError::NotFound("client permission".into()))
    }

    async fn delete_client_permission(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM client_permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("client permission".into()));
        }
        Ok(())
    }

    async fn list_roles(&self, query: &ListQuery) -> StoreResult<Page<Role>> {
        let request = self.config.page_request(query);
        let pattern = request.like_pattern();
        let mut conn = self.pool.acquire().await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM roles WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&mut *conn)
        .await?;
        let rows: Vec<DbRole> = sqlx::query_as(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles \
             WHERE ($1::text IS NULL OR name ILIKE $1) ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(i64::from(request.limit))
        .bind(request.offset() as i64)
        .fetch_all(&mut *conn)
        .await?;
        let items = expand_roles(&mut conn, rows).await?;
        Ok(request.page_of(items, total as u64))
    }

    async fn get_role(&self, id: i64) -> StoreResult<Role> {
        let mut conn = self.pool.acquire().await?;
        let row: DbRole = sqlx::query_as(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::NotFound("role".into()))?;
        self.load_role(&mut conn, row).await
    }

    async fn find_role_by_type(&self, role_type: &str) -> StoreResult<Option<Role>> {
        let mut conn = self.pool.acquire().await?;
        let row: Option<DbRole> = sqlx::query_as(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE type = $1 ORDER BY id LIMIT 1"
        ))
        .bind(role_type)
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => Ok(Some(self.load_role(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn create_role(&self, draft: RoleDraft) -> StoreResult<Role> {
        let role_type =
            derive_role_type(&draft.name).map_err(|err| StoreError::Unexpected(anyhow!(err)))?;
        let mut tx = self.pool.begin().await?;
        ensure_unique_role(&mut tx, &draft.name, &role_type, None).await?;
        ensure_permissions_exist(&mut tx, &draft.permission_ids, &draft.client_permission_ids)
            .await?;

        let row: DbRole = sqlx::query_as(&format!(
            "INSERT INTO roles (name, type, description) VALUES ($1, $2, $3) \
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(&role_type)
        .bind(&draft.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| role_write_error(err, &draft.name))?;
        replace_memberships(
            &mut tx,
            row.id,
            &draft.permission_ids,
            &draft.client_permission_ids,
        )
        .await?;
        let role = self.load_role(&mut tx, row).await?;
        tx.commit().await?;

        record_role_mutation("created");
        self.refresh_role_gauge().await;
        Ok(role)
    }

    async fn update_role(&self, id: i64, changes: RoleChanges) -> StoreResult<Role> {
        let mut tx = self.pool.begin().await?;
        let existing: DbRole = sqlx::query_as(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("role".into()))?;

        let name = changes.name.unwrap_or_else(|| existing.name.clone());
        let role_type =
            derive_role_type(&name).map_err(|err| StoreError::Unexpected(anyhow!(err)))?;
        if is_super_admin(&existing.role_type) && role_type != existing.role_type {
            return Err(StoreError::ProtectedRole(existing.name));
        }
        let description = changes.description.unwrap_or(existing.description);
        ensure_unique_role(&mut tx, &name, &role_type, Some(id)).await?;
        ensure_permissions_exist(&mut tx, &changes.permission_ids, &changes.client_permission_ids)
            .await?;

        let row: DbRole = sqlx::query_as(&format!(
            "UPDATE roles SET name = $2, type = $3, description = $4, updated_at = now() \
             WHERE id = $1 RETURNING {ROLE_COLUMNS}"
        ))
        .bind(id)
        .bind(&name)
        .bind(&role_type)
        .bind(&description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| role_write_error(err, &name))?;
        replace_memberships(
            &mut tx,
            id,
            &changes.permission_ids,
            &changes.client_permission_ids,
        )
        .await?;
        let role = self.load_role(&mut tx, row).await?;
        tx.commit().await?;

        record_role_mutation("updated");
        Ok(role)
    }

    async fn delete_role(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let existing: DbRole = sqlx::query_as(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("role".into()))?;
        if is_super_admin(&existing.role_type) {
            return Err(StoreError::ProtectedRole(existing.name));
        }
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if users > 0 {
            return Err(StoreError::RoleInUse {
                role_id: id,
                users: users as u64,
            });
        }
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    StoreError::RoleInUse {
                        role_id: id,
                        users: 1,
                    }
                } else {
                    err.into()
                }
            })?;
        tx.commit().await?;

        record_role_mutation("deleted");
        self.refresh_role_gauge().await;
        Ok(())
    }

    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<User>> {
        let request = self.config.page_request(query);
        let pattern = request.like_pattern();
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;
        let rows: Vec<DbUser> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::text IS NULL OR name ILIKE $1) ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(i64::from(request.limit))
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let items = rows.into_iter().map(user_from_db).collect();
        Ok(request.page_of(items, total as u64))
    }

    async fn get_user(&self, id: i64) -> StoreResult<User> {
        let row: Option<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(user_from_db)
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row: DbUser = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, role_id, blocked) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role_id)
        .bind(user.blocked)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| user_write_error(err, user.role_id))?;
        Ok(user_from_db(row))
    }

    async fn update_user(&self, id: i64, user: NewUser) -> StoreResult<User> {
        let row: Option<DbUser> = sqlx::query_as(&format!(
            "UPDATE users SET name = $2, email = $3, role_id = $4, blocked = $5, \
             updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role_id)
        .bind(user.blocked)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| user_write_error(err, user.role_id))?;
        row.map(user_from_db)
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user".into()));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

async fn ensure_unique_role(
    conn: &mut PgConnection,
    name: &str,
    role_type: &str,
    exclude: Option<i64>,
) -> StoreResult<()> {
    let duplicate: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM roles WHERE lower(name) = lower($1) \
         AND lower(type) = lower($2) AND ($3::bigint IS NULL OR id <> $3))",
    )
    .bind(name.trim())
    .bind(role_type)
    .bind(exclude)
    .fetch_one(&mut *conn)
    .await?;
    if duplicate {
        return Err(StoreError::DuplicateName(name.to_string()));
    }
    Ok(())
}

async fn ensure_permissions_exist(
    conn: &mut PgConnection,
    api: &[i64],
    client: &[i64],
) -> StoreResult<()> {
    if !api.is_empty() {
        let found: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM api_permissions WHERE id = ANY($1) FOR KEY SHARE",
        )
        .bind(api)
        .fetch_all(&mut *conn)
        .await?;
        let missing = missing_ids(api, &found);
        if !missing.is_empty() {
            return Err(StoreError::UnknownPermission {
                kind: PermissionKind::Api,
                ids: missing,
            });
        }
    }
    if !client.is_empty() {
        let found: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM client_permissions WHERE id = ANY($1) FOR KEY SHARE",
        )
        .bind(client)
        .fetch_all(&mut *conn)
        .await?;
        let missing = missing_ids(client, &found);
        if !missing.is_empty() {
            return Err(StoreError::UnknownPermission {
                kind: PermissionKind::Client,
                ids: missing,
            });
        }
    }
    Ok(())
}

async fn replace_memberships(
    conn: &mut PgConnection,
    role_id: i64,
    api: &[i64],
    client: &[i64],
) -> StoreResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id) \
         SELECT $1, UNNEST($2::bigint[])",
    )
    .bind(role_id)
    .bind(api)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM role_client_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO role_client_permissions (role_id, client_permission_id) \
         SELECT $1, UNNEST($2::bigint[])",
    )
    .bind(role_id)
    .bind(client)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Attach both permission sets to each role row, preserving row order.
async fn expand_roles(conn: &mut PgConnection, rows: Vec<DbRole>) -> StoreResult<Vec<Role>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

    let permission_rows: Vec<DbRolePermission> = sqlx::query_as(
        "SELECT rp.role_id, p.id, p.name, p.method, p.route, p.description, \
         p.created_at, p.updated_at \
         FROM role_permissions rp JOIN api_permissions p ON p.id = rp.permission_id \
         WHERE rp.role_id = ANY($1) ORDER BY p.id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let mut permissions: HashMap<i64, Vec<ApiPermission>> = HashMap::new();
    for row in permission_rows {
        permissions
            .entry(row.role_id)
            .or_default()
            .push(api_permission_from_db(row.permission)?);
    }

    let client_rows: Vec<DbRoleClientPermission> = sqlx::query_as(
        "SELECT rc.role_id, c.id, c.name, c.menu, c.path, c.sort, c.description, \
         c.created_at, c.updated_at \
         FROM role_client_permissions rc \
         JOIN client_permissions c ON c.id = rc.client_permission_id \
         WHERE rc.role_id = ANY($1) ORDER BY c.sort, c.id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let mut client_permissions: HashMap<i64, Vec<ClientPermission>> = HashMap::new();
    for row in client_rows {
        client_permissions
            .entry(row.role_id)
            .or_default()
            .push(client_permission_from_db(row.permission));
    }

    Ok(rows
        .into_iter()
        .map(|row| Role {
            permissions: permissions.remove(&row.id).unwrap_or_default(),
            client_permissions: client_permissions.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            role_type: row.role_type,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

fn missing_ids(requested: &[i64], found: &[i64]) -> Vec<i64> {
    let found: HashSet<i64> = found.iter().copied().collect();
    requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}

fn role_write_error(err: sqlx::Error, name: &str) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::DuplicateName(name.to_string());
    }
    err.into()
}

fn user_write_error(err: sqlx::Error, role_id: i64) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::Conflict("email already registered".into());
    }
    if is_foreign_key_violation(&err) {
        return StoreError::UnknownRole(role_id);
    }
    err.into()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    database_code(err).as_deref() == Some("23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    database_code(err).as_deref() == Some("23503")
}

fn database_code(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code.into_owned());
    }
    None
}

fn api_permission_from_db(row: DbApiPermission) -> StoreResult<ApiPermission> {
    let method = row
        .method
        .parse::<HttpMethod>()
        .map_err(|err| StoreError::Unexpected(anyhow!(err)))?;
    Ok(ApiPermission {
        id: row.id,
        name: row.name,
        method,
        route: row.route,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn client_permission_from_db(row: DbClientPermission) -> ClientPermission {
    ClientPermission {
        id: row.id,
        name: row.name,
        menu: row.menu,
        path: row.path,
        sort: row.sort,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn user_from_db(row: DbUser) -> User {
    User {
        id: row.id,
        name: row.name,
        email: row.email,
        role_id: row.role_id,
        blocked: row.blocked,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
