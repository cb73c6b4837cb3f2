pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use platform_core::middleware::{request_id_middleware, security_headers_middleware};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::middleware::PermissionGate;
use crate::services::{AuditService, AuthService, TokenService};
use crate::store::Store;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::request_password_reset,
        handlers::auth::confirm_password_reset,
        handlers::user::me,
        handlers::user::update_overrides,
        handlers::role::list_permissions,
        handlers::role::list_roles,
        handlers::role::create_role,
        handlers::role::update_role,
        handlers::role::delete_role,
        handlers::admin::login,
        handlers::admin::list_organizations,
        handlers::admin::create_organization,
        handlers::admin::suspend_organization,
        handlers::admin::activate_organization,
        handlers::admin::list_audit_logs,
    ),
    components(
        schemas(
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::auth::PasswordResetRequest,
            handlers::auth::PasswordResetResponse,
            handlers::auth::PasswordResetConfirmRequest,
            handlers::auth::MessageResponse,
            handlers::user::MeResponse,
            handlers::user::RoleSummary,
            handlers::user::UpdateOverridesRequest,
            handlers::user::OverridesResponse,
            handlers::role::CreateRoleRequest,
            handlers::role::UpdateRoleRequest,
            handlers::role::PermissionGroupResponse,
            handlers::role::PermissionCatalogResponse,
            handlers::admin::AdminLoginRequest,
            handlers::admin::AdminLoginResponse,
            handlers::admin::CreateOrganizationRequest,
            handlers::admin::CreateOrganizationResponse,
            models::RoleResponse,
            models::OrganizationResponse,
            models::AuditLogEntry,
            models::SanitizedUser,
            models::SanitizedSuperAdmin,
            models::PermissionOverride,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Tenant authentication"),
        (name = "Users", description = "Tenant user profile and overrides"),
        (name = "Roles", description = "Role management"),
        (name = "Permissions", description = "Permission catalog"),
        (name = "Admin", description = "Platform administration"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub auth: AuthService,
    pub audit: AuditService,
}

impl AppState {
    pub fn new(config: AuthConfig, store: Arc<dyn Store>) -> Self {
        let tokens = TokenService::new(&config.jwt);
        let audit = AuditService::new(store.clone());
        let auth = AuthService::new(store.clone(), tokens.clone(), audit.clone());
        Self {
            config,
            store,
            tokens,
            auth,
            audit,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Gated tenant route groups. Each group re-checks the live
    // permission set behind the session verifier and tenant binder.
    let role_read_routes = Router::new()
        .route("/roles", get(handlers::role::list_roles))
        .layer(from_fn_with_state(
            PermissionGate::any(state.clone(), &["roles.view", "roles.manage"]),
            middleware::permission_gate,
        ));

    let role_write_routes = Router::new()
        .route("/roles", post(handlers::role::create_role))
        .route(
            "/roles/:role_id",
            axum::routing::patch(handlers::role::update_role)
                .delete(handlers::role::delete_role),
        )
        .layer(from_fn_with_state(
            PermissionGate::all(state.clone(), &["roles.manage"]),
            middleware::permission_gate,
        ));

    let override_routes = Router::new()
        .route(
            "/users/:user_id/permissions",
            put(handlers::user::update_overrides),
        )
        .layer(from_fn_with_state(
            PermissionGate::all(state.clone(), &["permissions.manage"]),
            middleware::permission_gate,
        ));

    let tenant_routes = Router::new()
        .route("/users/me", get(handlers::user::me))
        .merge(role_read_routes)
        .merge(role_write_routes)
        .merge(override_routes)
        .layer(from_fn(middleware::tenant_context_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    // Catalog is public; the effective set appears only with a token.
    let catalog_route = Router::new()
        .route("/permissions", get(handlers::role::list_permissions))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::optional_auth_middleware,
        ));

    // Elevated realm. The audit layer wraps the verifier so it sees
    // the verified actor in request extensions.
    let admin_routes = Router::new()
        .route(
            "/admin/organizations",
            get(handlers::admin::list_organizations).post(handlers::admin::create_organization),
        )
        .route(
            "/admin/organizations/:org_id/suspend",
            post(handlers::admin::suspend_organization),
        )
        .route(
            "/admin/organizations/:org_id/activate",
            post(handlers::admin::activate_organization),
        )
        .route("/admin/audit-logs", get(handlers::admin::list_audit_logs))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::audit_trail_middleware,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::super_admin_middleware,
        ));

    let mut app = Router::new().route("/health", get(health_check));

    // Swagger UI in dev; the raw document is always served.
    if state.config.environment == config::Environment::Dev {
        app = app.merge(
            SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()),
        );
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let allowed_origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    app.route("/auth/login", post(handlers::auth::login))
        .route(
            "/auth/password-reset/request",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::auth::confirm_password_reset),
        )
        .route("/admin/login", post(handlers::admin::login))
        .merge(catalog_route)
        .merge(tenant_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(platform_core::middleware::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AuthError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AuthError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": { "store": "up" }
    })))
}
