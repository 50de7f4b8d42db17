#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use applications_backend::{
    build_router,
    config::{CaptchaConfig, Config, EmailConfig, LogFormat, StorageConfig},
    error::{Error, Result},
    middleware::rate_limit::RateLimitConfig,
    models::application::{Application, NewApplication},
    services::{
        application_store::{ApplicationPage, ApplicationStore},
        captcha_service::CaptchaVerifier,
        notification_service::Notifier,
        resume_storage::ResumeStorage,
    },
    utils::validation::ResumeRules,
    AppState, Backends,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_admin_secret";
pub const PEPPER: &str = "test_pepper";
pub const PDF_BASE64: &str = "JVBERi0xLjQK";

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        admin_jwt_secret: JWT_SECRET.into(),
        pepper: PEPPER.into(),
        allowed_origin: "*".into(),
        max_request_bytes: 8 * 1024 * 1024,
        rate_limit: RateLimitConfig::default(),
        captcha: CaptchaConfig {
            secret: Some("captcha-secret".into()),
            verify_url: "http://127.0.0.1:9/siteverify".into(),
        },
        resume: ResumeRules::default(),
        storage: StorageConfig::Local {
            root: PathBuf::from("./uploads-test"),
        },
        email: EmailConfig::default(),
        log_format: LogFormat::Pretty,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<Application>>,
    pub fail: AtomicBool,
}

impl MemoryStore {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Application> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn save(&self, application: NewApplication) -> Result<Application> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Persistence("database unavailable".into()));
        }
        let row = application.into_application(Uuid::new_v4(), Utc::now());
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list(&self, page: i64, limit: i64) -> Result<ApplicationPage> {
        let rows = self.rows.lock().unwrap();
        let mut newest_first: Vec<Application> = rows.iter().rev().cloned().collect();
        let total = newest_first.len() as i64;
        let skip = ((page - 1) * limit) as usize;
        newest_first = newest_first.into_iter().skip(skip).take(limit as usize).collect();
        Ok(ApplicationPage {
            applications: newest_first,
            total,
        })
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    pub files: Mutex<HashMap<String, Bytes>>,
    pub fail: AtomicBool,
}

impl MemoryStorage {
    pub fn count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn put(&self, path: &str, data: &'static [u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), Bytes::from_static(data));
    }
}

#[async_trait]
impl ResumeStorage for MemoryStorage {
    async fn upload(&self, path: &str, data: Bytes, _content_type: &str) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::UploadFailed("bucket unavailable".into()));
        }
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(path.to_string())
    }

    async fn download(&self, path: &str) -> Result<Option<Bytes>> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }
}

pub struct StaticCaptcha {
    pub pass: AtomicBool,
    pub calls: AtomicUsize,
}

impl Default for StaticCaptcha {
    fn default() -> Self {
        Self {
            pass: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

impl StaticCaptcha {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaVerifier for StaticCaptcha {
    async fn verify(&self, _token: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pass.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub owner: AtomicUsize,
    pub applicant: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_owner(&self, _application: &Application) -> Result<()> {
        self.owner.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Notification("provider down".into()));
        }
        Ok(())
    }

    async fn notify_applicant(&self, _application: &Application) -> Result<()> {
        self.applicant.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Notification("provider down".into()));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub captcha: Arc<StaticCaptcha>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::default());
        let storage = Arc::new(MemoryStorage::default());
        let captcha = Arc::new(StaticCaptcha::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let state = AppState::with_backends(
            config,
            Backends {
                store: store.clone(),
                storage: storage.clone(),
                captcha: captcha.clone(),
                notifier: notifier.clone(),
            },
        );

        Self {
            router: build_router(state),
            store,
            storage,
            captcha,
            notifier,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn submit(&self, body: &JsonValue) -> (u16, JsonValue) {
        self.submit_from("203.0.113.7", body).await
    }

    pub async fn submit_from(&self, ip: &str, body: &JsonValue) -> (u16, JsonValue) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/applications")
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.send(request).await;
        let status = response.status().as_u16();
        (status, body_json(response).await)
    }
}

pub async fn body_json(response: Response<Body>) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn valid_submission() -> JsonValue {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "phone": "(832) 555-0100",
        "position": "Braider",
        "availability": "Mon-Fri",
        "experience": "5 years of braiding",
        "consent": true,
        "captchaToken": "10000000-aaaa-bbbb-cccc-000000000001",
        "resumeData": format!("data:application/pdf;base64,{PDF_BASE64}"),
        "resumeName": "resume.pdf"
    })
}

pub fn short_window_config(max: u32, window: Duration) -> Config {
    Config {
        rate_limit: RateLimitConfig {
            enabled: true,
            max_per_window: max,
            window,
        },
        ..test_config()
    }
}
