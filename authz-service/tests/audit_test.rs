//! Audit trail integration tests.

mod common;

use axum::http::StatusCode;
use common::{drain_audit_tasks, TestApp, PASSWORD};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn successful_org_suspension_is_audited() {
    let app = TestApp::spawn().await;
    let token = app.super_admin_token().await;

    let (status, _) = app
        .post(
            &format!("/admin/organizations/{}/suspend", app.org_b),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    drain_audit_tasks().await;

    let entries = app.store.audit_entries();
    let entry = entries
        .iter()
        .find(|e| e.action == "organization.suspend")
        .expect("suspend entry");
    assert_eq!(entry.actor_id, Some(app.super_admin));
    assert_eq!(entry.resource_type, "organization");
    assert_eq!(entry.resource_id.as_deref(), Some(app.org_b.to_string().as_str()));
    assert_eq!(entry.details["status"], "suspended");
}

#[tokio::test]
async fn failed_admin_actions_leave_no_trail() {
    let app = TestApp::spawn().await;
    let token = app.super_admin_token().await;

    let (status, _) = app
        .post(
            &format!("/admin/organizations/{}/suspend", Uuid::new_v4()),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    drain_audit_tasks().await;

    assert!(app
        .store
        .audit_entries()
        .iter()
        .all(|e| e.action != "organization.suspend"));
}

#[tokio::test]
async fn admin_login_attempts_are_audited_with_reasons() {
    let app = TestApp::spawn().await;

    let (_, _) = app
        .post(
            "/admin/login",
            None,
            json!({ "email": "root@platform.test", "password": "wrong" }),
        )
        .await;
    let _ = app.super_admin_token().await;
    drain_audit_tasks().await;

    let entries = app.store.audit_entries();
    let failure = entries
        .iter()
        .find(|e| e.action == "auth.login_failed")
        .expect("failure entry");
    assert_eq!(failure.details["reason"], "invalid_password");
    assert_eq!(failure.actor_id, None);

    let success = entries
        .iter()
        .find(|e| e.action == "auth.login")
        .expect("success entry");
    assert_eq!(success.actor_id, Some(app.super_admin));
}

#[tokio::test]
async fn organization_provisioning_is_audited_once() {
    let app = TestApp::spawn().await;
    let token = app.super_admin_token().await;

    let (status, body) = app
        .post(
            "/admin/organizations",
            Some(&token),
            json!({
                "name": "Gamma LLC",
                "admin_email": "admin@gamma.test",
                "admin_password": "a-long-password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["organization"]["name"], "Gamma LLC");
    assert_eq!(body["admin_user"]["email"], "admin@gamma.test");
    drain_audit_tasks().await;

    let entries = app.store.audit_entries();
    let creates: Vec<_> = entries
        .iter()
        .filter(|e| e.action == "organization.create")
        .collect();
    assert_eq!(creates.len(), 1);
    // Sensitive fields never reach the trail.
    assert!(creates[0].details.get("admin_password").is_none());

    // The new org's admin can log in right away.
    let (status, _) = app
        .post(
            "/admin/login",
            None,
            json!({ "email": "root@platform.test", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "admin@gamma.test", "password": "a-long-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role_slug"], "admin");
}

#[tokio::test]
async fn audit_failures_never_fail_the_request() {
    let app = TestApp::spawn().await;
    let token = app.super_admin_token().await;

    app.store.set_fail_audit(true);

    let (status, _) = app
        .post(
            &format!("/admin/organizations/{}/suspend", app.org_b),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    drain_audit_tasks().await;
    assert!(app
        .store
        .audit_entries()
        .iter()
        .all(|e| e.action != "organization.suspend"));
}

#[tokio::test]
async fn tenant_role_and_override_changes_are_audited() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (status, _) = app
        .post(
            "/roles",
            Some(&admin),
            json!({ "name": "Auditors", "permissions": ["reports.view"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request(
            "PUT",
            &format!("/users/{}/permissions", app.agent_a),
            Some(&admin),
            Some(json!({ "grant": ["reports.view"], "revoke": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    drain_audit_tasks().await;

    let entries = app.store.audit_entries();
    assert!(entries.iter().any(|e| e.action == "role.create"));
    let override_entry = entries
        .iter()
        .find(|e| e.action == "user.permissions_updated")
        .expect("override entry");
    assert_eq!(override_entry.actor_id, Some(app.admin_a));
    assert_eq!(
        override_entry.resource_id.as_deref(),
        Some(app.agent_a.to_string().as_str())
    );
}

#[tokio::test]
async fn audit_log_listing_is_newest_first_and_limited() {
    let app = TestApp::spawn().await;
    let token = app.super_admin_token().await;

    for org in [app.org_a, app.org_b] {
        let (status, _) = app
            .post(
                &format!("/admin/organizations/{}/suspend", org),
                Some(&token),
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    drain_audit_tasks().await;

    let (status, body) = app.get("/admin/audit-logs?limit=2", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
}
