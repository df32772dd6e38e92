mod common;

use admin_console::model::{NewApiPermission, NewClientPermission};
use admin_console::store::ConsoleStore;
use axum::http::StatusCode;
use common::{keys, read_json, seed_role, seed_user, test_state};
use gatehouse_authz::HttpMethod;
use http_helpers::{authed_json_request, authed_request, empty_request};
use serde_json::json;
use tower::ServiceExt;

type App = axum::routing::RouterIntoService<axum::body::Body, ()>;

struct Fixture {
    app: App,
    editor_token: String,
    blocked_token: String,
    editor_role: i64,
}

/// An "Editor" role that may list roles and read one role by id, with two
/// menu entries.
async fn fixture() -> Fixture {
    let (state, store) = test_state(false);
    let list = store
        .create_permission(NewApiPermission {
            name: "List roles".to_string(),
            method: HttpMethod::Get,
            route: "/v1/roles".to_string(),
            description: None,
        })
        .await
        .expect("permission");
    let read = store
        .create_permission(NewApiPermission {
            name: "Read role".to_string(),
            method: HttpMethod::Get,
            route: "/v1/roles/:id".to_string(),
            description: None,
        })
        .await
        .expect("permission");
    let mut menu = Vec::new();
    for (name, path, sort) in [("Roles", "/roles", 2), ("Dashboard", "/dashboard", 1)] {
        let entry = store
            .create_client_permission(NewClientPermission {
                name: name.to_string(),
                menu: "Main".to_string(),
                path: path.to_string(),
                sort,
                description: None,
            })
            .await
            .expect("client permission");
        menu.push(entry.id);
    }
    let role = seed_role(&store, "Editor", vec![list.id, read.id], menu).await;
    let editor = seed_user(&store, "editor@example.com", role.id, false).await;
    let blocked = seed_user(&store, "blocked@example.com", role.id, true).await;
    Fixture {
        app: admin_console::app::build_router(state).into_service(),
        editor_token: keys().mint(editor.id).expect("mint"),
        blocked_token: keys().mint(blocked.id).expect("mint"),
        editor_role: role.id,
    }
}

async fn status_and_code(app: &App, request: axum::http::Request<axum::body::Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = read_json(response).await;
    (status, body["code"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let fixture = fixture().await;
    let (status, code) = status_and_code(&fixture.app, empty_request("GET", "/v1/roles")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "unauthorized");

    let (status, _) = status_and_code(&fixture.app, authed_request("GET", "/v1/roles", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = admin_console::auth::token::TokenKeys::new(b"other-secret", 60)
        .mint(1)
        .expect("mint");
    let (status, _) = status_and_code(&fixture.app, authed_request("GET", "/v1/roles", &foreign)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = status_and_code(
        &fixture.app,
        authed_request("GET", "/v1/roles", &fixture.blocked_token),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = status_and_code(&fixture.app, empty_request("GET", "/v1/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn grants_decide_access() {
    let fixture = fixture().await;
    let token = &fixture.editor_token;

    let response = fixture
        .app
        .clone()
        .oneshot(authed_request("GET", "/v1/roles", token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = fixture
        .app
        .clone()
        .oneshot(authed_request("GET", "/v1/roles?page=1&limit=5", token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // The `:id` grant passes the gate; the role itself does not exist.
    let (status, code) = status_and_code(&fixture.app, authed_request("GET", "/v1/roles/7", token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code, "not_found");

    let (status, _) = status_and_code(
        &fixture.app,
        authed_request("GET", &format!("/v1/roles/{}", fixture.editor_role), token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = fixture
        .app
        .clone()
        .oneshot(authed_request("GET", "/v1/roles/7/extra", token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for (method, uri) in [
        ("DELETE", "/v1/roles/7"),
        ("GET", "/v1/users"),
        ("GET", "/v1/permissions"),
    ] {
        let (status, code) = status_and_code(&fixture.app, authed_request(method, uri, token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(code, "forbidden");
    }

    let (status, code) = status_and_code(
        &fixture.app,
        authed_json_request("POST", "/v1/roles", token, json!({ "name": "Escalate" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code, "forbidden");
}

#[tokio::test]
async fn me_returns_profile_and_menu() {
    let fixture = fixture().await;
    let response = fixture
        .app
        .clone()
        .oneshot(authed_request("GET", "/v1/me", &fixture.editor_token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["user"]["email"], "editor@example.com");
    assert_eq!(body["role"]["type"], "EDITOR");
    assert_eq!(body["menu"][0]["menu"], "Main");
    let items: Vec<_> = body["menu"][0]["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item["path"].as_str().expect("path").to_string())
        .collect();
    assert_eq!(items, vec!["/dashboard", "/roles"]);
}

#[tokio::test]
async fn affordances_follow_client_permissions() {
    let fixture = fixture().await;
    for (path, allowed) in [("/roles", true), ("/roles/", true), ("/users", false)] {
        let response = fixture
            .app
            .clone()
            .oneshot(authed_request(
                "GET",
                &format!("/v1/me/affordances?path={path}"),
                &fixture.editor_token,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["allowed"], allowed, "{path}");
    }

    let (status, code) = status_and_code(
        &fixture.app,
        authed_request("GET", "/v1/me/affordances", &fixture.editor_token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "validation_error");
}
