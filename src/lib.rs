pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::{Config, StorageConfig};
use crate::error::Result;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::{
    application_service::ApplicationService,
    application_store::{ApplicationStore, PgApplicationStore},
    captcha_service::{CaptchaVerifier, SiteVerifyCaptcha},
    notification_service::{EmailNotifier, Notifier},
    resume_service::ResumeService,
    resume_storage::{LocalResumeStorage, ResumeStorage, SupabaseResumeStorage},
};

/// The swappable edges of the service. Production wiring lives in
/// [`AppState::new`]; tests hand in their own.
pub struct Backends {
    pub store: Arc<dyn ApplicationStore>,
    pub storage: Arc<dyn ResumeStorage>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub application_service: ApplicationService,
    pub application_store: Arc<dyn ApplicationStore>,
    pub resume_service: ResumeService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        let storage: Arc<dyn ResumeStorage> = match &config.storage {
            StorageConfig::Local { root } => Arc::new(LocalResumeStorage::new(root.clone())),
            StorageConfig::Supabase {
                url,
                service_key,
                bucket,
            } => Arc::new(SupabaseResumeStorage::new(
                http_client.clone(),
                url.clone(),
                service_key.clone(),
                bucket.clone(),
            )),
        };

        let backends = Backends {
            store: Arc::new(PgApplicationStore::new(pool)),
            storage,
            captcha: Arc::new(SiteVerifyCaptcha::new(&config.captcha, http_client.clone())),
            notifier: Arc::new(EmailNotifier::new(config.email.clone(), http_client)),
        };
        Ok(Self::with_backends(config, backends))
    }

    pub fn with_backends(config: Config, backends: Backends) -> Self {
        let resume_service = ResumeService::new(backends.storage, config.resume.clone());
        let application_service = ApplicationService::new(
            RateLimiter::new(config.rate_limit),
            backends.captcha,
            resume_service.clone(),
            backends.store.clone(),
            backends.notifier,
        );
        Self {
            config: Arc::new(config),
            application_service,
            application_store: backends.store,
            resume_service,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/openapi.json", get(routes::openapi_json))
        .route(
            "/api/applications",
            post(routes::applications::submit_application).fallback(routes::applications::method_not_allowed),
        );

    let admin_api = Router::new()
        .route("/api/resumes", get(routes::resumes::view_resume))
        .route(
            "/api/admin/applications",
            get(routes::admin::list_applications),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    public_api
        .merge(admin_api)
        .with_state(state)
        .layer(middleware::cors::cors_layer(&config.allowed_origin))
        .layer(axum::middleware::from_fn(middleware::cors::preflight_no_content))
        .layer(axum::middleware::from_fn(
            middleware::security_headers::security_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_request_bytes))
}
