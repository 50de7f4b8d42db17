use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dto::application_dto::SubmitApplicationRequest;
use crate::error::{Error, Result};
use crate::middleware::rate_limit::RateLimiter;
use crate::models::application::{Application, NewApplication};
use crate::services::application_store::ApplicationStore;
use crate::services::captcha_service::CaptchaVerifier;
use crate::services::notification_service::Notifier;
use crate::services::resume_service::ResumeService;
use crate::utils::crypto::hash_client_identifier;
use crate::utils::validation::validate_submission;

const USER_AGENT_MAX_CHARS: usize = 512;

/// Where a submission is in its single forward pass. A failure before
/// `Persisted` aborts the request; nothing after it can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    RateChecked,
    Validated,
    CaptchaVerified,
    FileProcessed,
    Persisted,
    Notified,
    Responded,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionStage::Received => "received",
            SubmissionStage::RateChecked => "rate_checked",
            SubmissionStage::Validated => "validated",
            SubmissionStage::CaptchaVerified => "captcha_verified",
            SubmissionStage::FileProcessed => "file_processed",
            SubmissionStage::Persisted => "persisted",
            SubmissionStage::Notified => "notified",
            SubmissionStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Who sent the submission, in the only form that gets stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub ip_hash: String,
    pub user_agent: String,
}

impl ClientContext {
    pub fn new(address: &str, user_agent: &str, pepper: &str) -> Self {
        Self {
            ip_hash: hash_client_identifier(address, pepper),
            user_agent: user_agent.chars().take(USER_AGENT_MAX_CHARS).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Accepted(Application),
    /// Honeypot tripped: answered like a success, nothing stored or sent.
    Discarded,
}

#[derive(Clone)]
pub struct ApplicationService {
    limiter: RateLimiter,
    captcha: Arc<dyn CaptchaVerifier>,
    resumes: ResumeService,
    store: Arc<dyn ApplicationStore>,
    notifier: Arc<dyn Notifier>,
}

impl ApplicationService {
    pub fn new(
        limiter: RateLimiter,
        captcha: Arc<dyn CaptchaVerifier>,
        resumes: ResumeService,
        store: Arc<dyn ApplicationStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            limiter,
            captcha,
            resumes,
            store,
            notifier,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Runs a raw request body through the whole pipeline. The rate check
    /// comes before the body is even parsed.
    pub async fn submit_raw(&self, body: &[u8], client: &ClientContext) -> Result<SubmissionOutcome> {
        self.check_rate(client)?;
        let request: SubmitApplicationRequest = serde_json::from_slice(body).map_err(|e| {
            warn!(ip_hash = %client.ip_hash, error = %e, "malformed application body");
            Error::Json(e)
        })?;
        self.process(request, client).await
    }

    pub fn check_rate(&self, client: &ClientContext) -> Result<()> {
        if !self.limiter.admit(&client.ip_hash) {
            warn!(ip_hash = %client.ip_hash, "application rate limit exceeded");
            return Err(Error::RateLimitExceeded);
        }
        info!(ip_hash = %client.ip_hash, stage = %SubmissionStage::RateChecked, "application received");
        Ok(())
    }

    /// Everything after the rate check. Callers must have called
    /// [`ApplicationService::check_rate`] first.
    pub async fn process(
        &self,
        request: SubmitApplicationRequest,
        client: &ClientContext,
    ) -> Result<SubmissionOutcome> {
        if request.website.as_deref().is_some_and(|w| !w.trim().is_empty()) {
            warn!(ip_hash = %client.ip_hash, "honeypot field filled; discarding submission");
            return Ok(SubmissionOutcome::Discarded);
        }

        let submission = validate_submission(&request, self.resumes.rules()).map_err(|e| {
            warn!(ip_hash = %client.ip_hash, reason = %e, "application failed validation");
            e
        })?;
        info!(ip_hash = %client.ip_hash, stage = %SubmissionStage::Validated, "application validated");

        if !self.captcha.verify(&submission.captcha_token).await {
            warn!(ip_hash = %client.ip_hash, "CAPTCHA verification failed");
            return Err(Error::CaptchaFailed);
        }
        info!(ip_hash = %client.ip_hash, stage = %SubmissionStage::CaptchaVerified, "CAPTCHA verified");

        let resume_path = match &submission.resume {
            Some(upload) => Some(self.resumes.store(upload).await.map_err(|e| {
                match &e {
                    Error::FileRejected(reason) => {
                        warn!(ip_hash = %client.ip_hash, reason = %reason, "resume rejected")
                    }
                    other => error!(error = %other, "resume upload failed"),
                }
                e
            })?),
            None => None,
        };
        info!(stage = %SubmissionStage::FileProcessed, has_resume = resume_path.is_some(), "resume processed");

        let new_application = NewApplication {
            full_name: submission.name,
            email: submission.email,
            phone: submission.phone,
            position: submission.position,
            availability: submission.availability,
            experience: submission.experience,
            resume_path: resume_path.clone(),
            consent: true,
            ip_hash: client.ip_hash.clone(),
            user_agent: client.user_agent.clone(),
        };

        let application = self.store.save(new_application).await.map_err(|e| {
            if let Some(path) = &resume_path {
                error!(path = %path, "application insert failed; uploaded resume is orphaned");
            }
            match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            }
        })?;
        info!(application_id = %application.id, stage = %SubmissionStage::Persisted, "application saved");

        self.notify(&application).await;
        info!(application_id = %application.id, stage = %SubmissionStage::Responded, "application accepted");

        Ok(SubmissionOutcome::Accepted(application))
    }

    /// Best effort. The application is already stored, so failures are only
    /// logged.
    async fn notify(&self, application: &Application) {
        if let Err(e) = self.notifier.notify_owner(application).await {
            error!(application_id = %application.id, error = %e, "owner notification failed");
        }
        if let Err(e) = self.notifier.notify_applicant(application).await {
            error!(application_id = %application.id, error = %e, "applicant notification failed");
        }
        info!(application_id = %application.id, stage = %SubmissionStage::Notified, "notifications dispatched");
    }
}
