use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use applications_backend::{
    config::{CaptchaConfig, EmailConfig},
    error::Error,
    models::application::Application,
    services::{
        captcha_service::{CaptchaVerifier, SiteVerifyCaptcha},
        notification_service::{EmailNotifier, Notifier},
        resume_storage::{ResumeStorage, SupabaseResumeStorage},
    },
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Clone, Default)]
struct Recorded {
    emails: Arc<Mutex<Vec<(Option<String>, JsonValue)>>>,
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
    upload_headers: Arc<Mutex<Vec<HeaderMap>>>,
}

async fn siteverify(Form(form): Form<HashMap<String, String>>) -> (StatusCode, Json<JsonValue>) {
    match form.get("response").map(String::as_str) {
        Some("explode") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        Some(token) => {
            let ok = token == "good" && form.get("secret").map(String::as_str) == Some("s3cret");
            let codes: Vec<&str> = if ok { vec![] } else { vec!["invalid-input-response"] };
            (
                StatusCode::OK,
                Json(json!({ "success": ok, "error-codes": codes })),
            )
        }
        None => (StatusCode::BAD_REQUEST, Json(json!({}))),
    }
}

async fn emails(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> (StatusCode, Json<JsonValue>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let failing = body["to"][0] == "bounce@example.com";
    rec.emails.lock().unwrap().push((auth, body));
    if failing {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"message": "rejected"})))
    } else {
        (StatusCode::OK, Json(json!({"id": "email_1"})))
    }
}

async fn put_object(
    State(rec): State<Recorded>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    rec.upload_headers.lock().unwrap().push(headers);
    let key = format!("{bucket}/{path}");
    let mut objects = rec.objects.lock().unwrap();
    if objects.contains_key(&key) {
        return StatusCode::CONFLICT;
    }
    objects.insert(key, body);
    StatusCode::OK
}

async fn get_object(
    State(rec): State<Recorded>,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<Bytes, StatusCode> {
    rec.objects
        .lock()
        .unwrap()
        .get(&format!("{bucket}/{path}"))
        .cloned()
        .ok_or(StatusCode::BAD_REQUEST)
}

async fn spawn_fake_providers() -> (String, Recorded) {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/siteverify", post(siteverify))
        .route("/emails", post(emails))
        .route(
            "/storage/v1/object/:bucket/*path",
            post(put_object).get(get_object),
        )
        .with_state(rec.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), rec)
}

fn application(email: &str) -> Application {
    Application {
        id: Uuid::new_v4(),
        full_name: "Jane Doe".into(),
        email: email.into(),
        phone: "(832) 555-0100".into(),
        position: "Braider".into(),
        availability: "Mon-Fri".into(),
        experience: "5 years of braiding".into(),
        resume_path: Some("resumes/abc.pdf".into()),
        consent: true,
        ip_hash: "0".repeat(64),
        user_agent: "test".into(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn captcha_passes_only_on_provider_success() {
    let (base, _) = spawn_fake_providers().await;
    let captcha = SiteVerifyCaptcha::new(
        &CaptchaConfig {
            secret: Some("s3cret".into()),
            verify_url: format!("{base}/siteverify"),
        },
        reqwest::Client::new(),
    );

    assert!(captcha.verify("good").await);
    assert!(!captcha.verify("bad").await);
    assert!(!captcha.verify("explode").await);
}

#[tokio::test]
async fn captcha_fails_closed_without_secret() {
    let (base, _) = spawn_fake_providers().await;
    let captcha = SiteVerifyCaptcha::new(
        &CaptchaConfig {
            secret: None,
            verify_url: format!("{base}/siteverify"),
        },
        reqwest::Client::new(),
    );
    assert!(!captcha.verify("good").await);
}

fn email_config(base: &str) -> EmailConfig {
    EmailConfig {
        api_url: base.to_string(),
        api_key: Some("re_test".into()),
        owner_email: Some("owner@salon803.example".into()),
        ..EmailConfig::default()
    }
}

#[tokio::test]
async fn owner_and_applicant_emails_are_sent() {
    let (base, rec) = spawn_fake_providers().await;
    let notifier = EmailNotifier::new(email_config(&base), reqwest::Client::new());
    let app = application("jane@example.com");

    notifier.notify_owner(&app).await.unwrap();
    notifier.notify_applicant(&app).await.unwrap();

    let sent = rec.emails.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    let (auth, owner) = &sent[0];
    assert_eq!(auth.as_deref(), Some("Bearer re_test"));
    assert_eq!(owner["to"], json!(["owner@salon803.example"]));
    assert_eq!(owner["subject"], "New Application: Jane Doe");
    assert!(owner["html"].as_str().unwrap().contains("Braider"));

    let (_, applicant) = &sent[1];
    assert_eq!(applicant["to"], json!(["jane@example.com"]));
    assert!(applicant["html"].as_str().unwrap().contains("Salon 803"));
}

#[tokio::test]
async fn applicant_confirmation_can_be_disabled() {
    let (base, rec) = spawn_fake_providers().await;
    let config = EmailConfig {
        send_applicant_confirmation: false,
        ..email_config(&base)
    };
    let notifier = EmailNotifier::new(config, reqwest::Client::new());

    notifier
        .notify_applicant(&application("jane@example.com"))
        .await
        .unwrap();
    assert!(rec.emails.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provider_rejection_is_a_notification_error() {
    let (base, _) = spawn_fake_providers().await;
    let notifier = EmailNotifier::new(email_config(&base), reqwest::Client::new());

    let err = notifier
        .notify_applicant(&application("bounce@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Notification(_)));
}

#[tokio::test]
async fn supabase_storage_round_trip() {
    let (base, rec) = spawn_fake_providers().await;
    let storage = SupabaseResumeStorage::new(
        reqwest::Client::new(),
        format!("{base}/"),
        "service-key".into(),
        "applications".into(),
    );

    let stored = storage
        .upload(
            "resumes/one.pdf",
            bytes::Bytes::from_static(b"%PDF-1.4"),
            "application/pdf",
        )
        .await
        .unwrap();
    assert_eq!(stored, "resumes/one.pdf");

    {
        let headers = rec.upload_headers.lock().unwrap();
        let h = &headers[0];
        assert_eq!(h["authorization"], "Bearer service-key");
        assert_eq!(h["apikey"], "service-key");
        assert_eq!(h["x-upsert"], "false");
        assert_eq!(h["content-type"], "application/pdf");
    }

    let data = storage.download("resumes/one.pdf").await.unwrap();
    assert_eq!(data.as_deref(), Some(&b"%PDF-1.4"[..]));
    assert_eq!(storage.download("resumes/missing.pdf").await.unwrap(), None);

    let err = storage
        .upload(
            "resumes/one.pdf",
            bytes::Bytes::from_static(b"%PDF-1.4"),
            "application/pdf",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UploadFailed(_)));
}
