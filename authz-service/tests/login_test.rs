//! Tenant login and password reset integration tests.

mod common;

use axum::http::StatusCode;
use common::{TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn login_returns_token_and_role_snapshot() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "agent@acme.test", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["role_slug"], "agent");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "agent@acme.test");
    // Sanitized payload never carries credential material.
    assert!(body["user"].get("password_hash").is_none());
    assert_eq!(body["expires_in"], 7 * 24 * 3600);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;

    // Wrong password, unknown account, and deactivated account all
    // produce the same envelope.
    for (email, password) in [
        ("agent@acme.test", "wrong-password"),
        ("nobody@acme.test", PASSWORD),
        ("inactive@acme.test", PASSWORD),
    ] {
        let (status, body) = app
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "case: {}", email);
        assert_eq!(body["code"], "invalid_credentials", "case: {}", email);
    }
}

#[tokio::test]
async fn suspended_organization_blocks_member_logins() {
    let app = TestApp::spawn().await;

    use authz_service::models::OrgStatus;
    use authz_service::store::Store;
    app.store
        .set_organization_status(app.org_a, OrgStatus::Suspended)
        .await
        .unwrap();

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "agent@acme.test", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_credentials");

    // The other organization is unaffected.
    let (status, _) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "agent@beta.test", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_login_payload_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "not-an-email", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post(
            "/auth/password-reset/request",
            None,
            json!({ "email": "agent@acme.test" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The token is delivered out of band; the harness mints it the
    // same way the service does.
    let reset_token = app
        .state
        .tokens
        .issue_password_reset("agent@acme.test")
        .unwrap();

    let (status, _) = app
        .post(
            "/auth/password-reset/confirm",
            None,
            json!({ "token": reset_token, "new_password": "a-brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does.
    let (status, _) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "agent@acme.test", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "agent@acme.test", "password": "a-brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_does_not_reveal_account_existence() {
    let app = TestApp::spawn().await;

    // Real, unknown, and deactivated accounts all get the exact same
    // status and body.
    let mut responses = Vec::new();
    for email in ["agent@acme.test", "nobody@acme.test", "inactive@acme.test"] {
        let (status, body) = app
            .post("/auth/password-reset/request", None, json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::OK, "case: {}", email);
        responses.push(body);
    }
    assert_eq!(responses[0], responses[1]);
    assert_eq!(responses[1], responses[2]);
}

#[tokio::test]
async fn reset_request_never_hands_out_the_token() {
    let app = TestApp::spawn().await;

    // An anonymous caller asking for an admin account gets nothing
    // usable back.
    let (status, body) = app
        .post(
            "/auth/password-reset/request",
            None,
            json!({ "email": "admin@acme.test" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("reset_token").is_none());
    assert_eq!(body.as_object().map(|o| o.len()), Some(1));

    // Nothing in the response authorizes a confirm.
    let message = body["message"].as_str().unwrap().to_string();
    let (status, body) = app
        .post(
            "/auth/password-reset/confirm",
            None,
            json!({ "token": message, "new_password": "attacker-chosen-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_token");

    // The account is untouched.
    let (status, _) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "admin@acme.test", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "admin@acme.test", "password": "attacker-chosen-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_token_is_not_a_reset_authorization() {
    let app = TestApp::spawn().await;
    let token = app.tenant_token("agent@acme.test").await;

    let (status, body) = app
        .post(
            "/auth/password-reset/confirm",
            None,
            json!({ "token": token, "new_password": "whatever-else" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "wrong_token_type");
}
