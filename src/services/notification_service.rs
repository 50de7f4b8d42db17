use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::error::{Error, Result};
use crate::models::application::Application;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_owner(&self, application: &Application) -> Result<()>;
    async fn notify_applicant(&self, application: &Application) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
}

/// Transactional email through the Resend HTTP API.
#[derive(Clone)]
pub struct EmailNotifier {
    client: Client,
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig, client: Client) -> Self {
        let notifier = Self { client, config };
        if notifier.is_enabled() {
            info!("Email notifications enabled");
        } else {
            warn!("Email notification not configured (RESEND_API_KEY / OWNER_EMAIL)");
        }
        notifier
    }

    /// Both the API key and the owner address are needed; with either
    /// missing no email goes out.
    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some() && self.config.owner_email.is_some()
    }

    async fn send(&self, email: OutgoingEmail<'_>) -> Result<()> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|_| self.is_enabled()) else {
            return Ok(());
        };

        let resp = self
            .client
            .post(format!("{}/emails", self.config.api_url))
            .bearer_auth(api_key)
            .json(&email)
            .send()
            .await
            .context("email request failed")
            .map_err(|e| Error::Notification(format!("{e:#}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Notification(format!(
                "email API status {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify_owner(&self, application: &Application) -> Result<()> {
        let Some(owner) = self.config.owner_email.as_deref() else {
            warn!("OWNER_EMAIL not set; skipping owner notification");
            return Ok(());
        };
        self.send(OutgoingEmail {
            from: &self.config.from,
            to: vec![owner],
            subject: owner_subject(application),
            html: owner_html(application),
        })
        .await
    }

    async fn notify_applicant(&self, application: &Application) -> Result<()> {
        if !self.config.send_applicant_confirmation || application.email.is_empty() {
            return Ok(());
        }
        self.send(OutgoingEmail {
            from: &self.config.from,
            to: vec![application.email.as_str()],
            subject: "We received your application".to_string(),
            html: applicant_html(application, &self.config.business_name),
        })
        .await
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn owner_subject(application: &Application) -> String {
    let name = application.full_name.replace(['\r', '\n'], " ");
    format!("New Application: {}", name)
}

pub fn owner_html(application: &Application) -> String {
    let resume = application
        .resume_path
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "none uploaded".to_string());
    format!(
        r#"<h2>New Job Application Received</h2>
<p><strong>Name:</strong> {}<br>
<strong>Email:</strong> {}<br>
<strong>Phone:</strong> {}<br>
<strong>Position:</strong> {}<br>
<strong>Availability:</strong> {}</p>
<p><strong>Experience:</strong><br>{}</p>
<p><strong>Resume path:</strong> {}</p>
<p><small>Submitted {}</small></p>"#,
        escape_html(&application.full_name),
        escape_html(&application.email),
        escape_html(&application.phone),
        escape_html(&application.position),
        escape_html(&application.availability),
        escape_html(&application.experience).replace('\n', "<br>"),
        resume,
        application.created_at.to_rfc3339(),
    )
}

pub fn applicant_html(application: &Application, business_name: &str) -> String {
    format!(
        "<p>Thanks for applying to {}, {}! We've received your application and will be in touch soon.</p>",
        escape_html(business_name),
        escape_html(&application.full_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn application() -> Application {
        Application {
            id: Uuid::new_v4(),
            full_name: "Jane <b>Doe</b>".into(),
            email: "jane@example.com".into(),
            phone: "(832) 555-0100".into(),
            position: "Braider".into(),
            availability: "Mon-Fri".into(),
            experience: "5 years\nof braiding & locs".into(),
            resume_path: Some("resumes/abc.pdf".into()),
            consent: true,
            ip_hash: "hash".into(),
            user_agent: "test".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn owner_email_lists_escaped_fields() {
        let html = owner_html(&application());
        assert!(html.contains("Jane &lt;b&gt;Doe&lt;/b&gt;"));
        assert!(html.contains("5 years<br>of braiding &amp; locs"));
        assert!(html.contains("resumes/abc.pdf"));
        assert!(!html.contains("<b>Doe</b>"));
    }

    #[test]
    fn owner_email_without_resume() {
        let mut app = application();
        app.resume_path = None;
        assert!(owner_html(&app).contains("none uploaded"));
    }

    #[test]
    fn subject_cannot_inject_headers() {
        let mut app = application();
        app.full_name = "Jane\r\nBcc: evil@example.com".into();
        assert!(!owner_subject(&app).contains('\n'));
    }

    #[tokio::test]
    async fn unconfigured_notifier_is_a_no_op() {
        let notifier = EmailNotifier::new(EmailConfig::default(), Client::new());
        assert!(!notifier.is_enabled());
        notifier.notify_owner(&application()).await.unwrap();
        notifier.notify_applicant(&application()).await.unwrap();
    }

    #[tokio::test]
    async fn api_key_without_owner_is_not_enabled() {
        let config = EmailConfig {
            api_url: "http://127.0.0.1:9".into(),
            api_key: Some("re_test".into()),
            ..EmailConfig::default()
        };
        let notifier = EmailNotifier::new(config.clone(), Client::new());
        assert!(!notifier.is_enabled());
        // Nothing listens on the discard port, so any attempted send would fail.
        notifier.notify_applicant(&application()).await.unwrap();

        let complete = EmailConfig {
            owner_email: Some("owner@salon803.example".into()),
            ..config
        };
        assert!(EmailNotifier::new(complete, Client::new()).is_enabled());
    }
}
