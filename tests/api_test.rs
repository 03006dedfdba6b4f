//! HTTP API integration tests
//!
//! Auth, project, member and event endpoints through `axum-test`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use calsync::backend::server::{build_app, AppState};
use calsync::backend::sync::MemoryBroker;
use calsync::shared::{Membership, Project, ProjectEvent, Role};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

async fn create_test_server() -> (TestServer, AppState) {
    let (app, state) = build_app(common::test_config(), Arc::new(MemoryBroker::new()))
        .await
        .unwrap();
    (TestServer::new(app).unwrap(), state)
}

async fn signup(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/signup")
        .json(&json!({ "username": username, "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

async fn project_with_member(server: &TestServer) -> (Project, String, String) {
    let alice = signup(server, "alice").await;
    let bob = signup(server, "bob").await;
    let project: Project = server
        .post("/api/projects")
        .authorization_bearer(&alice)
        .json(&json!({ "name": "P1" }))
        .await
        .json();
    server
        .post(&format!("/api/projects/{}/members", project.id))
        .authorization_bearer(&alice)
        .json(&json!({ "username": "bob" }))
        .await;
    (project, alice, bob)
}

#[tokio::test]
async fn test_signup_login_me() {
    let (server, _state) = create_test_server().await;
    let token = signup(&server, "alice").await;

    let me = server.get("/api/auth/me").authorization_bearer(&token).await;
    assert_eq!(me.status_code(), StatusCode::OK);
    assert_eq!(me.json::<Value>()["username"], "alice");

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "password123" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let body: Value = login.json();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_bad_input() {
    let (server, _state) = create_test_server().await;
    signup(&server, "alice").await;

    let duplicate = server
        .post("/api/auth/signup")
        .json(&json!({ "username": "alice", "password": "password456" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let short = server
        .post("/api/auth/signup")
        .json(&json!({ "username": "bob", "password": "short" }))
        .await;
    assert_eq!(short.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(short.json::<Value>()["code"], "validation");

    let bad_name = server
        .post("/api/auth/signup")
        .json(&json!({ "username": "9lives", "password": "password123" }))
        .await;
    assert_eq!(bad_name.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let (server, _state) = create_test_server().await;
    signup(&server, "alice").await;

    for (username, password) in [("alice", "wrong-password"), ("nobody", "password123")] {
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "Invalid username or password");
    }

    let me = server.get("/api/auth/me").await;
    assert_eq!(me.status_code(), StatusCode::UNAUTHORIZED);

    let me = server.get("/api/auth/me").authorization_bearer("garbage").await;
    assert_eq!(me.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_projects_and_members() {
    let (server, _state) = create_test_server().await;
    let (project, alice, bob) = project_with_member(&server).await;
    let carol = signup(&server, "carol").await;
    assert_eq!(project.owner, "alice");

    let listed: Value = server.get("/api/projects").authorization_bearer(&bob).await.json();
    assert_eq!(listed[0]["id"], project.id);
    assert_eq!(listed[0]["role"], "member");

    let members: Vec<Membership> = server
        .get(&format!("/api/projects/{}/members", project.id))
        .authorization_bearer(&bob)
        .await
        .json();
    let roles: Vec<(String, Role)> = members.into_iter().map(|m| (m.user_id, m.role)).collect();
    assert_eq!(
        roles,
        vec![("alice".to_string(), Role::Owner), ("bob".to_string(), Role::Member)]
    );

    // only the owner adds members
    let by_member = server
        .post(&format!("/api/projects/{}/members", project.id))
        .authorization_bearer(&bob)
        .json(&json!({ "username": "carol" }))
        .await;
    assert_eq!(by_member.status_code(), StatusCode::FORBIDDEN);

    let unknown_user = server
        .post(&format!("/api/projects/{}/members", project.id))
        .authorization_bearer(&alice)
        .json(&json!({ "username": "nobody" }))
        .await;
    assert_eq!(unknown_user.status_code(), StatusCode::NOT_FOUND);

    let duplicate = server
        .post(&format!("/api/projects/{}/members", project.id))
        .authorization_bearer(&alice)
        .json(&json!({ "username": "bob" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let outsider = server
        .get(&format!("/api/projects/{}/members", project.id))
        .authorization_bearer(&carol)
        .await;
    assert_eq!(outsider.status_code(), StatusCode::FORBIDDEN);

    let missing = server
        .get("/api/projects/999/members")
        .authorization_bearer(&alice)
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_lifecycle_with_version_conflict() {
    let (server, _state) = create_test_server().await;
    let (project, alice, bob) = project_with_member(&server).await;
    let events_path = format!("/api/projects/{}/events", project.id);

    let created = server
        .post(&events_path)
        .authorization_bearer(&alice)
        .json(&json!({ "title": "Standup", "date": "2024-01-10" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let event: ProjectEvent = created.json();
    assert_eq!(event.version, 1);

    let event_path = format!("{}/{}", events_path, event.id);
    let updated = server
        .put(&event_path)
        .authorization_bearer(&bob)
        .json(&json!({ "title": "Standup (moved)", "date": "2024-01-11", "version": 1 }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let updated: ProjectEvent = updated.json();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.owner, "alice");

    let stale = server
        .put(&event_path)
        .authorization_bearer(&alice)
        .json(&json!({ "title": "Too late", "date": "2024-01-12", "version": 1 }))
        .await;
    assert_eq!(stale.status_code(), StatusCode::CONFLICT);
    let body: Value = stale.json();
    assert_eq!(body["code"], "version_conflict");
    assert_eq!(body["current_version"], 2);

    let listed: Vec<ProjectEvent> = server.get(&events_path).authorization_bearer(&alice).await.json();
    assert_eq!(listed, vec![updated]);

    let deleted = server.delete(&event_path).authorization_bearer(&bob).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let again = server.delete(&event_path).authorization_bearer(&bob).await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_member_cannot_touch_events() {
    let (server, _state) = create_test_server().await;
    let (project, alice, _bob) = project_with_member(&server).await;
    let carol = signup(&server, "carol").await;
    let events_path = format!("/api/projects/{}/events", project.id);

    let event: ProjectEvent = server
        .post(&events_path)
        .authorization_bearer(&alice)
        .json(&json!({ "title": "Private", "date": "2024-02-01" }))
        .await
        .json();
    let event_path = format!("{}/{}", events_path, event.id);

    let list = server.get(&events_path).authorization_bearer(&carol).await;
    assert_eq!(list.status_code(), StatusCode::FORBIDDEN);

    let create = server
        .post(&events_path)
        .authorization_bearer(&carol)
        .json(&json!({ "title": "Intrusion", "date": "2024-02-01" }))
        .await;
    assert_eq!(create.status_code(), StatusCode::FORBIDDEN);

    let update = server
        .put(&event_path)
        .authorization_bearer(&carol)
        .json(&json!({ "title": "Hijack", "date": "2024-02-01", "version": 1 }))
        .await;
    assert_eq!(update.status_code(), StatusCode::FORBIDDEN);

    let delete = server.delete(&event_path).authorization_bearer(&carol).await;
    assert_eq!(delete.status_code(), StatusCode::FORBIDDEN);

    // existence is not revealed to non-members
    let probe = server
        .delete(&format!("{}/999", events_path))
        .authorization_bearer(&carol)
        .await;
    assert_eq!(probe.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_event_validation() {
    let (server, _state) = create_test_server().await;
    let (project, alice, _bob) = project_with_member(&server).await;
    let events_path = format!("/api/projects/{}/events", project.id);

    let blank = server
        .post(&events_path)
        .authorization_bearer(&alice)
        .json(&json!({ "title": "   ", "date": "2024-02-01" }))
        .await;
    assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);

    let bad_date = server
        .post(&events_path)
        .authorization_bearer(&alice)
        .json(&json!({ "title": "Sync", "date": "01/02/2024" }))
        .await;
    assert!(bad_date.status_code().is_client_error());
}

#[tokio::test]
async fn test_presence_reflects_registry() {
    let (server, state) = create_test_server().await;
    let (project, alice, _bob) = project_with_member(&server).await;
    let carol = signup(&server, "carol").await;

    let (tab, _rx) = calsync::backend::sync::LiveConnection::new("bob", 4);
    state.registry.join(project.id, tab);

    let presence: Value = server
        .get(&format!("/api/projects/{}/presence", project.id))
        .authorization_bearer(&alice)
        .await
        .json();
    assert_eq!(presence["online"], json!(["bob"]));
    assert_eq!(presence["connections"], 1);

    let outsider = server
        .get(&format!("/api/projects/{}/presence", project.id))
        .authorization_bearer(&carol)
        .await;
    assert_eq!(outsider.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (server, _state) = create_test_server().await;
    let response = server.get("/api/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
