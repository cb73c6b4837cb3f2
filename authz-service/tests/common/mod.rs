//! Shared harness for the integration tests.
//!
//! Runs the full router against the in-process memory store, seeded
//! with two organizations so cross-tenant behavior is always testable.

#![allow(dead_code)]

use std::sync::Arc;

use authz_service::{
    build_router,
    config::{AuthConfig, DatabaseConfig, Environment, JwtConfig, SecurityConfig},
    models::{Organization, Role, SuperAdmin, TenantUser},
    store::{MemoryStore, Store},
    utils::password::{hash_password, Password},
    AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,

    pub org_a: Uuid,
    pub org_b: Uuid,

    pub admin_role_a: Uuid,
    pub agent_role_a: Uuid,
    pub agent_role_b: Uuid,

    pub admin_a: Uuid,
    pub agent_a: Uuid,
    pub inactive_a: Uuid,
    pub agent_b: Uuid,
    pub super_admin: Uuid,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());

        let org_a = Organization::new("Acme CRM".to_string());
        let org_b = Organization::new("Beta Corp".to_string());
        store.insert_organization(&org_a).await.unwrap();
        store.insert_organization(&org_b).await.unwrap();

        let admin_role_a = Role::system_admin(org_a.id);
        let admin_role_b = Role::system_admin(org_b.id);
        let agent_role_a = Role::new(
            org_a.id,
            "agent".to_string(),
            "Agent".to_string(),
            None,
            vec![
                "contacts.view".to_string(),
                "contacts.create".to_string(),
                "roles.view".to_string(),
            ],
        );
        let agent_role_b = Role::new(
            org_b.id,
            "agent".to_string(),
            "Agent".to_string(),
            None,
            vec!["contacts.view".to_string(), "roles.view".to_string()],
        );
        store.insert_role(&admin_role_a).await.unwrap();
        store.insert_role(&admin_role_b).await.unwrap();
        store.insert_role(&agent_role_a).await.unwrap();
        store.insert_role(&agent_role_b).await.unwrap();

        let hash = hash_password(&Password::new(PASSWORD.to_string()))
            .unwrap()
            .into_string();

        let admin_a = TenantUser::new(
            org_a.id,
            "admin@acme.test".to_string(),
            hash.clone(),
            Some(admin_role_a.id),
        );
        let agent_a = TenantUser::new(
            org_a.id,
            "agent@acme.test".to_string(),
            hash.clone(),
            Some(agent_role_a.id),
        );
        let mut inactive_a = TenantUser::new(
            org_a.id,
            "inactive@acme.test".to_string(),
            hash.clone(),
            Some(agent_role_a.id),
        );
        inactive_a.active = false;
        let agent_b = TenantUser::new(
            org_b.id,
            "agent@beta.test".to_string(),
            hash.clone(),
            Some(agent_role_b.id),
        );
        store.insert_user(&admin_a).await.unwrap();
        store.insert_user(&agent_a).await.unwrap();
        store.insert_user(&inactive_a).await.unwrap();
        store.insert_user(&agent_b).await.unwrap();

        let super_admin = SuperAdmin::new("root@platform.test".to_string(), hash);
        store.insert_super_admin(&super_admin).await.unwrap();

        let state = AppState::new(test_config(), store.clone());
        let router = build_router(state.clone());

        Self {
            router,
            state,
            store,
            org_a: org_a.id,
            org_b: org_b.id,
            admin_role_a: admin_role_a.id,
            agent_role_a: agent_role_a.id,
            agent_role_b: agent_role_b.id,
            admin_a: admin_a.id,
            agent_a: agent_a.id,
            inactive_a: inactive_a.id,
            agent_b: agent_b.id,
            super_admin: super_admin.id,
        }
    }

    /// Tenant session token issued directly, bypassing the login
    /// endpoint, for tests that are not about login itself.
    pub async fn tenant_token(&self, email: &str) -> String {
        self.state
            .auth
            .tenant_login(email, PASSWORD)
            .await
            .expect("tenant login should succeed")
            .token
    }

    pub async fn super_admin_token(&self) -> String {
        self.state
            .auth
            .super_admin_login("root@platform.test", PASSWORD, "127.0.0.1", "tests")
            .await
            .expect("super admin login should succeed")
            .token
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.request("POST", uri, token, Some(body)).await
    }
}

fn test_config() -> AuthConfig {
    AuthConfig {
        common: platform_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "authz-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        database: DatabaseConfig {
            url: "memory".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new("integration-test-secret".to_string()),
            tenant_token_expiry_days: 7,
            super_admin_token_expiry_minutes: 60,
            password_reset_expiry_minutes: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

/// Give spawned audit tasks a chance to run before asserting on the
/// trail.
pub async fn drain_audit_tasks() {
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}
