use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::CaptchaConfig;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `true` only when the provider positively confirms the token.
    async fn verify(&self, token: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// hCaptcha-compatible `siteverify` client. Also works against reCAPTCHA and
/// Turnstile, which accept the same form fields.
#[derive(Clone)]
pub struct SiteVerifyCaptcha {
    client: Client,
    secret: Option<String>,
    verify_url: String,
}

impl SiteVerifyCaptcha {
    pub fn new(config: &CaptchaConfig, client: Client) -> Self {
        if config.secret.is_none() {
            warn!("CAPTCHA_SECRET not set; every submission will fail verification");
        }
        Self {
            client,
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
        }
    }

    async fn request(&self, secret: &str, token: &str) -> anyhow::Result<bool> {
        let resp = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
            .context("captcha request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("captcha provider returned {}", status.as_u16()));
        }
        let body: SiteVerifyResponse = resp.json().await.context("captcha response parse failed")?;
        if !body.success {
            debug!(codes = ?body.error_codes, "captcha rejected by provider");
        }
        Ok(body.success)
    }
}

#[async_trait]
impl CaptchaVerifier for SiteVerifyCaptcha {
    async fn verify(&self, token: &str) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            error!("CAPTCHA_SECRET not configured");
            return false;
        };
        match self.request(secret, token).await {
            Ok(passed) => passed,
            Err(e) => {
                warn!(error = ?e, "CAPTCHA verification error");
                false
            }
        }
    }
}
