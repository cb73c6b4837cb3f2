//! Role management integration tests.

mod common;

use authz_service::store::Store;
use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn list_roles_shows_system_roles_first_with_counts() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (status, body) = app.get("/roles", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let roles = body.as_array().unwrap();
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0]["slug"], "admin");
    assert_eq!(roles[0]["is_system"], true);
    assert_eq!(roles[0]["user_count"], 1);
    // agent role: agent@acme.test and inactive@acme.test hold it.
    assert_eq!(roles[1]["slug"], "agent");
    assert_eq!(roles[1]["user_count"], 2);
}

#[tokio::test]
async fn create_role_derives_slug_and_enforces_per_org_uniqueness() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (status, body) = app
        .post(
            "/roles",
            Some(&admin),
            json!({ "name": "Sales Manager", "permissions": ["deals.view", "deals.update"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "sales-manager");
    assert_eq!(body["permission_count"], 2);
    assert_eq!(body["is_system"], false);

    // Same slug again in the same organization.
    let (status, body) = app
        .post(
            "/roles",
            Some(&admin),
            json!({ "name": "Sales Manager", "permissions": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_slug");

    // The agent slug already exists in both orgs, so uniqueness is
    // clearly per-tenant: creating "agent" fails here but a fresh
    // slug works even though org B uses it too.
    let (status, _) = app
        .post(
            "/roles",
            Some(&admin),
            json!({ "name": "Agent", "permissions": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn duplicate_slug_insert_is_caught_at_the_store() {
    use authz_service::models::Role;
    use authz_service::store::StoreError;

    let app = TestApp::spawn().await;

    // A create racing past the handler's slug check hits the
    // uniqueness constraint instead of a bare database error.
    let first = Role::new(
        app.org_a,
        "billing".to_string(),
        "Billing".to_string(),
        None,
        vec![],
    );
    app.store.insert_role(&first).await.unwrap();

    let second = Role::new(
        app.org_a,
        "billing".to_string(),
        "Billing Clone".to_string(),
        None,
        vec![],
    );
    let err = app.store.insert_role(&second).await.unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation));

    // The same slug in another organization is not a conflict.
    let other_org = Role::new(
        app.org_b,
        "billing".to_string(),
        "Billing".to_string(),
        None,
        vec![],
    );
    app.store.insert_role(&other_org).await.unwrap();
}

#[tokio::test]
async fn create_role_rejects_unknown_permissions() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (status, body) = app
        .post(
            "/roles",
            Some(&admin),
            json!({ "name": "Broken", "permissions": ["deals.teleport"] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "unknown_permission");
    assert!(body["error"].as_str().unwrap().contains("deals.teleport"));
}

#[tokio::test]
async fn system_admin_role_is_immutable() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/roles/{}", app.admin_role_a),
            Some(&admin),
            Some(json!({ "name": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "system_role_immutable");

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/roles/{}", app.admin_role_a),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "system_role_immutable");
}

#[tokio::test]
async fn update_role_patches_fields_and_clears_description() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (_, created) = app
        .post(
            "/roles",
            Some(&admin),
            json!({
                "name": "Support",
                "description": "First line support",
                "permissions": ["contacts.view"]
            }),
        )
        .await;
    let role_id = created["id"].as_str().unwrap().to_string();

    // Patch permissions only; description stays.
    let (status, body) = app
        .request(
            "PATCH",
            &format!("/roles/{}", role_id),
            Some(&admin),
            Some(json!({ "permissions": ["contacts.view", "tags.view"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "First line support");
    assert_eq!(body["permission_count"], 2);

    // Explicit null clears the description.
    let (status, body) = app
        .request(
            "PATCH",
            &format!("/roles/{}", role_id),
            Some(&admin),
            Some(json!({ "description": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].is_null());
}

#[tokio::test]
async fn delete_role_in_use_is_a_conflict() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/roles/{}", app.agent_role_a),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "role_in_use");
    assert_eq!(body["details"]["user_count"], 2);
}

#[tokio::test]
async fn delete_unassigned_role_succeeds() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    let (_, created) = app
        .post(
            "/roles",
            Some(&admin),
            json!({ "name": "Ephemeral", "permissions": [] }),
        )
        .await;
    let role_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request("DELETE", &format!("/roles/{}", role_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/roles", Some(&admin)).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["slug"] != "ephemeral"));
}

#[tokio::test]
async fn unassigning_users_unblocks_role_deletion() {
    let app = TestApp::spawn().await;
    let admin = app.tenant_token("admin@acme.test").await;

    app.store.set_user_role(app.agent_a, None).await.unwrap();
    app.store.set_user_role(app.inactive_a, None).await.unwrap();

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/roles/{}", app.agent_role_a),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
