//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::memory::{
    MemoryApplicationService, MemoryAuditService, MemoryAuthorizationEngineService,
    MemoryCertificateService, MemoryDomainService, MemoryIdentityProviderService,
    MemoryMembershipService, MemoryPasswordPolicyService, MemoryPermissionService,
    MemoryPolicyService, MemoryStore, MemoryUserService,
};
use crate::middleware::{security_headers_middleware, ObservabilityLayer};
use crate::openapi::ApiDoc;
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

/// Root of every management route
pub const DOMAINS_PATH: &str =
    "/management/organizations/{organizationId}/environments/{environmentId}/domains";

/// Application state backed by the in-memory store
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt_manager: Arc<JwtManager>,
    pub store: Arc<MemoryStore>,
    pub domain_service: Arc<MemoryDomainService>,
    pub application_service: Arc<MemoryApplicationService>,
    pub certificate_service: Arc<MemoryCertificateService>,
    pub identity_provider_service: Arc<MemoryIdentityProviderService>,
    pub user_service: Arc<MemoryUserService>,
    pub policy_service: Arc<MemoryPolicyService>,
    pub membership_service: Arc<MemoryMembershipService>,
    pub permission_service: Arc<MemoryPermissionService>,
    pub password_policy_service: Arc<MemoryPasswordPolicyService>,
    pub authorization_engine_service: Arc<MemoryAuthorizationEngineService>,
    pub audit_service: Arc<MemoryAuditService>,
}

impl AppState {
    /// Wire every service onto a freshly seeded store
    pub fn new(config: Config) -> crate::error::Result<Self> {
        let jwt_manager = JwtManager::new(config.jwt.clone())?;
        let store = MemoryStore::new(&config.bootstrap);

        Ok(Self {
            config: Arc::new(config),
            jwt_manager: Arc::new(jwt_manager),
            domain_service: Arc::new(MemoryDomainService::new(store.clone())),
            application_service: Arc::new(MemoryApplicationService::new(store.clone())),
            certificate_service: Arc::new(MemoryCertificateService::new(store.clone())),
            identity_provider_service: Arc::new(MemoryIdentityProviderService::new(store.clone())),
            user_service: Arc::new(MemoryUserService::new(store.clone())),
            policy_service: Arc::new(MemoryPolicyService::new(store.clone())),
            membership_service: Arc::new(MemoryMembershipService::new(store.clone())),
            permission_service: Arc::new(MemoryPermissionService::new(store.clone())),
            password_policy_service: Arc::new(MemoryPasswordPolicyService::new(store.clone())),
            authorization_engine_service: Arc::new(MemoryAuthorizationEngineService::new(
                store.clone(),
            )),
            audit_service: Arc::new(MemoryAuditService::new(store.clone())),
            store,
        })
    }
}

impl HasServices for AppState {
    type Domains = MemoryDomainService;
    type Applications = MemoryApplicationService;
    type Certificates = MemoryCertificateService;
    type IdentityProviders = MemoryIdentityProviderService;
    type Users = MemoryUserService;
    type Policies = MemoryPolicyService;
    type Memberships = MemoryMembershipService;
    type Permissions = MemoryPermissionService;
    type PasswordPolicies = MemoryPasswordPolicyService;
    type AuthorizationEngines = MemoryAuthorizationEngineService;
    type Audits = MemoryAuditService;

    fn config(&self) -> &Config {
        &self.config
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn domain_service(&self) -> &Self::Domains {
        &self.domain_service
    }

    fn application_service(&self) -> &Self::Applications {
        &self.application_service
    }

    fn certificate_service(&self) -> &Self::Certificates {
        &self.certificate_service
    }

    fn identity_provider_service(&self) -> &Self::IdentityProviders {
        &self.identity_provider_service
    }

    fn user_service(&self) -> &Self::Users {
        &self.user_service
    }

    fn policy_service(&self) -> &Self::Policies {
        &self.policy_service
    }

    fn membership_service(&self) -> &Self::Memberships {
        &self.membership_service
    }

    fn permission_service(&self) -> &Self::Permissions {
        &self.permission_service
    }

    fn password_policy_service(&self) -> &Self::PasswordPolicies {
        &self.password_policy_service
    }

    fn authorization_engine_service(&self) -> &Self::AuthorizationEngines {
        &self.authorization_engine_service
    }

    fn audit_service(&self) -> &Self::Audits {
        &self.audit_service
    }

    async fn check_ready(&self) -> bool {
        self.store.is_ready().await
    }
}

pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let http_addr = config.http_addr();
    let swagger = !config.is_production();
    let state = AppState::new(config)?;

    let mut app = build_router(state).merge(
        Router::new()
            .route("/metrics", get(api::metrics::metrics_handler))
            .with_state(Arc::new(prometheus_handle)),
    );
    if swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::build()));
        info!("Swagger UI available at /swagger-ui");
    }

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors.allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    cors.allow_origin(origins)
}

/// Build the management router for any state implementing `HasServices`
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = cors_layer(state.config());
    let security_headers = state.config().security_headers.clone();
    let domain = format!("{}/{{domain}}", DOMAINS_PATH);
    let application = format!("{}/applications/{{application}}", domain);

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // Domains
        .route(
            DOMAINS_PATH,
            get(api::domain::list::<S>).post(api::domain::create::<S>),
        )
        .route(
            &format!("{}/_hrid/{{hrid}}", DOMAINS_PATH),
            get(api::domain::get_by_hrid::<S>),
        )
        .route(
            &domain,
            get(api::domain::get::<S>)
                .patch(api::domain::patch::<S>)
                .put(api::domain::patch::<S>)
                .delete(api::domain::delete::<S>),
        )
        .route(
            &format!("{}/entrypoints", domain),
            get(api::domain::entrypoints::<S>),
        )
        // Applications
        .route(
            &format!("{}/applications", domain),
            get(api::application::list::<S>).post(api::application::create::<S>),
        )
        .route(
            &application,
            get(api::application::get::<S>)
                .patch(api::application::patch::<S>)
                .put(api::application::patch::<S>)
                .delete(api::application::delete::<S>),
        )
        .route(
            &format!("{}/type", application),
            put(api::application::update_type::<S>),
        )
        .route(
            &format!("{}/secret/_renew", application),
            post(api::application::renew_secret::<S>),
        )
        // Certificates
        .route(
            &format!("{}/certificates", domain),
            get(api::certificate::list::<S>).post(api::certificate::create::<S>),
        )
        .route(
            &format!("{}/certificates/rotate", domain),
            post(api::certificate::rotate::<S>),
        )
        .route(
            &format!("{}/certificates/{{certificate}}", domain),
            get(api::certificate::get::<S>)
                .put(api::certificate::update::<S>)
                .delete(api::certificate::delete::<S>),
        )
        .route(
            &format!("{}/certificates/{{certificate}}/key", domain),
            get(api::certificate::key::<S>),
        )
        .route(
            &format!("{}/certificates/{{certificate}}/keys", domain),
            get(api::certificate::keys::<S>),
        )
        // Identity providers
        .route(
            &format!("{}/identities", domain),
            get(api::identity_provider::list::<S>).post(api::identity_provider::create::<S>),
        )
        .route(
            &format!("{}/identities/{{identity}}", domain),
            get(api::identity_provider::get::<S>)
                .put(api::identity_provider::update::<S>)
                .delete(api::identity_provider::delete::<S>),
        )
        // Users
        .route(
            &format!("{}/users", domain),
            get(api::user::list::<S>).post(api::user::create::<S>),
        )
        .route(
            &format!("{}/users/{{user}}", domain),
            get(api::user::get::<S>)
                .put(api::user::update::<S>)
                .delete(api::user::delete::<S>),
        )
        .route(
            &format!("{}/users/{{user}}/status", domain),
            put(api::user::update_status::<S>),
        )
        .route(
            &format!("{}/users/{{user}}/resetPassword", domain),
            post(api::user::reset_password::<S>),
        )
        .route(
            &format!("{}/users/{{user}}/lock", domain),
            post(api::user::lock::<S>),
        )
        .route(
            &format!("{}/users/{{user}}/unlock", domain),
            post(api::user::unlock::<S>),
        )
        .route(
            &format!("{}/users/{{user}}/username", domain),
            axum::routing::patch(api::user::update_username::<S>),
        )
        // Extension point policies
        .route(
            &format!("{}/policies", domain),
            get(api::policy::list::<S>)
                .post(api::policy::create::<S>)
                .put(api::policy::update_all::<S>),
        )
        .route(
            &format!("{}/policies/{{policy}}", domain),
            get(api::policy::get::<S>)
                .put(api::policy::update::<S>)
                .delete(api::policy::delete::<S>),
        )
        // Domain members
        .route(
            &format!("{}/members", domain),
            get(api::member::list_domain::<S>).post(api::member::add_domain::<S>),
        )
        .route(
            &format!("{}/members/permissions", domain),
            get(api::member::domain_permissions::<S>),
        )
        .route(
            &format!("{}/members/{{member}}", domain),
            delete(api::member::remove_domain::<S>),
        )
        // Application members
        .route(
            &format!("{}/members", application),
            get(api::member::list_application::<S>).post(api::member::add_application::<S>),
        )
        .route(
            &format!("{}/members/permissions", application),
            get(api::member::application_permissions::<S>),
        )
        .route(
            &format!("{}/members/{{member}}", application),
            delete(api::member::remove_application::<S>),
        )
        // Password policies
        .route(
            &format!("{}/password-policies", domain),
            get(api::password_policy::list::<S>).post(api::password_policy::create::<S>),
        )
        .route(
            &format!("{}/password-policies/{{policy}}", domain),
            get(api::password_policy::get::<S>)
                .put(api::password_policy::update::<S>)
                .delete(api::password_policy::delete::<S>),
        )
        .route(
            &format!("{}/password-policies/{{policy}}/default", domain),
            post(api::password_policy::set_default::<S>),
        )
        // Authorization engines
        .route(
            &format!("{}/authorization-engines", domain),
            get(api::authorization_engine::list::<S>)
                .post(api::authorization_engine::create::<S>),
        )
        .route(
            &format!("{}/authorization-engines/{{engine}}", domain),
            get(api::authorization_engine::get::<S>)
                .put(api::authorization_engine::update::<S>)
                .delete(api::authorization_engine::delete::<S>),
        )
        // Audits
        .route(&format!("{}/audits", domain), get(api::audit::list::<S>))
        .route(
            &format!("{}/audits/{{audit}}", domain),
            get(api::audit::get::<S>),
        )
        // Add middleware
        .layer(axum::middleware::from_fn_with_state(
            security_headers,
            security_headers_middleware,
        ))
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
