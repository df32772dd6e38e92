#![allow(dead_code)]

use admin_console::api::types::FeatureFlags;
use admin_console::app::AppState;
use admin_console::auth::identity::TokenIdentityResolver;
use admin_console::auth::token::TokenKeys;
use admin_console::model::{NewUser, Role, RoleDraft, User};
use admin_console::store::memory::InMemoryStore;
use admin_console::store::{ConsoleStore, StoreConfig};
use std::sync::Arc;

pub const TOKEN_SECRET: &[u8] = b"integration-secret";
pub const BOOTSTRAP_TOKEN: &str = "bootstrap-token";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn keys() -> TokenKeys {
    TokenKeys::new(TOKEN_SECRET, 300)
}

/// Console state over a fresh in-memory store.
pub fn test_state(bootstrap_enabled: bool) -> (AppState, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new(StoreConfig {
        default_page_size: 10,
        max_page_size: 50,
    }));
    let tokens = keys();
    let state = AppState {
        api_version: "v1".to_string(),
        features: FeatureFlags {
            durable_storage: false,
            strict_membership: true,
        },
        store: store.clone(),
        identity: Arc::new(TokenIdentityResolver::new(tokens.clone(), store.clone())),
        tokens,
        bootstrap_enabled,
        bootstrap_token: bootstrap_enabled.then(|| BOOTSTRAP_TOKEN.to_string()),
    };
    (state, store)
}

pub async fn seed_role(
    store: &InMemoryStore,
    name: &str,
    permission_ids: Vec<i64>,
    client_permission_ids: Vec<i64>,
) -> Role {
    store
        .create_role(RoleDraft {
            name: name.to_string(),
            description: None,
            permission_ids,
            client_permission_ids,
        })
        .await
        .expect("seed role")
}

pub async fn seed_user(store: &InMemoryStore, email: &str, role_id: i64, blocked: bool) -> User {
    store
        .create_user(NewUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            role_id,
            blocked,
        })
        .await
        .expect("seed user")
}

/// Seed a super-admin role and user; returns the user's bearer token.
pub async fn seed_admin(store: &InMemoryStore) -> String {
    let role = seed_role(store, "Super Admin", Vec::new(), Vec::new()).await;
    let user = seed_user(store, "root@example.com", role.id, false).await;
    keys().mint(user.id).expect("mint")
}
