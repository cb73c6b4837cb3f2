//! Tenant isolation integration tests.
//!
//! Every tenant operation must be invisible across organization
//! boundaries: foreign roles read as missing, foreign users as
//! forbidden.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn role_listing_is_organization_scoped() {
    let app = TestApp::spawn().await;
    let agent_b = app.tenant_token("agent@beta.test").await;

    let (status, body) = app.get("/roles", Some(&agent_b)).await;
    assert_eq!(status, StatusCode::OK);

    let roles = body.as_array().unwrap();
    assert_eq!(roles.len(), 2);
    for role in roles {
        let id = role["id"].as_str().unwrap();
        assert_ne!(id, app.agent_role_a.to_string());
        assert_ne!(id, app.admin_role_a.to_string());
    }
}

#[tokio::test]
async fn foreign_roles_read_as_not_found() {
    let app = TestApp::spawn().await;
    let admin_a = app.tenant_token("admin@acme.test").await;

    // Org B's agent role exists, but not for this tenant.
    let (status, body) = app
        .request(
            "PATCH",
            &format!("/roles/{}", app.agent_role_b),
            Some(&admin_a),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/roles/{}", app.agent_role_b),
            Some(&admin_a),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cross_tenant_override_writes_are_forbidden() {
    let app = TestApp::spawn().await;
    let admin_a = app.tenant_token("admin@acme.test").await;

    let (status, body) = app
        .request(
            "PUT",
            &format!("/users/{}/permissions", app.agent_b),
            Some(&admin_a),
            Some(json!({ "grant": ["contacts.view"], "revoke": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "cross_tenant_access");
}

#[tokio::test]
async fn duplicate_slugs_are_allowed_across_organizations() {
    let app = TestApp::spawn().await;
    let admin_a = app.tenant_token("admin@acme.test").await;

    // "agent" exists in both orgs already; a new slug created in A
    // does not collide with anything in B.
    let (status, _) = app
        .post(
            "/roles",
            Some(&admin_a),
            json!({ "name": "Billing", "permissions": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let agent_b = app.tenant_token("agent@beta.test").await;
    let (_, body) = app.get("/roles", Some(&agent_b)).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["slug"] != "billing"));
}
