use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dto::application_dto::SubmitApplicationRequest;
use crate::error::{Error, Result};
use crate::utils::resume::{content_type_for, file_extension, is_generic_mime, ResumePayload};

pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;

const MIB: usize = 1024 * 1024;
pub const DEFAULT_MAX_RESUME_BYTES: usize = 5 * MIB;

pub fn validate<T: Validate>(val: &T) -> std::result::Result<(), ValidationErrors> {
    val.validate()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRules {
    pub required: bool,
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for ResumeRules {
    fn default() -> Self {
        Self {
            required: true,
            max_bytes: DEFAULT_MAX_RESUME_BYTES,
            allowed_extensions: vec!["pdf".into(), "doc".into(), "docx".into()],
        }
    }
}

impl ResumeRules {
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    pub fn allows_mime(&self, mime: &str) -> bool {
        is_generic_mime(mime)
            || self
                .allowed_extensions
                .iter()
                .any(|e| content_type_for(&e.to_ascii_lowercase()) == mime)
    }

    pub fn type_error(&self) -> String {
        let names: Vec<String> = self
            .allowed_extensions
            .iter()
            .map(|e| e.to_ascii_uppercase())
            .collect();
        format!("Invalid file type. Only {} allowed.", names.join(", "))
    }

    pub fn size_error(&self) -> String {
        if self.max_bytes % MIB == 0 {
            format!("File too large. Maximum {}MB.", self.max_bytes / MIB)
        } else {
            format!("File too large. Maximum {} bytes.", self.max_bytes)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeUpload {
    pub file_name: String,
    pub extension: String,
    pub payload: ResumePayload,
}

/// A submission whose fields passed every rule. Text fields are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub availability: String,
    pub experience: String,
    pub captcha_token: String,
    pub resume: Option<ResumeUpload>,
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex is valid")
});

/// Order in which field failures are reported, with the fallback message.
const FIELD_ORDER: [(&str, &str); 6] = [
    ("name", "Invalid name"),
    ("email", "Invalid email"),
    ("phone", "Invalid phone number"),
    ("position", "Invalid position"),
    ("availability", "Invalid availability"),
    ("experience", "Invalid experience description"),
];

pub fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace anywhere, so padded input fails.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn email_shape(email: &str) -> std::result::Result<(), ValidationError> {
    if !is_valid_email(email) {
        return Err(ValidationError::new("email"));
    }
    Ok(())
}

pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone_digits(phone).len();
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}

pub fn phone_digit_count(phone: &str) -> std::result::Result<(), ValidationError> {
    if !is_valid_phone(phone) {
        return Err(ValidationError::new("phone_digits"));
    }
    Ok(())
}

/// Turns the first failing field, in form order, into its client message.
fn first_field_error(errors: &ValidationErrors) -> Option<String> {
    let fields = errors.field_errors();
    FIELD_ORDER.iter().find_map(|(field, fallback)| {
        let failures = fields.get(*field)?;
        let message = failures
            .iter()
            .find_map(|e| e.message.as_ref())
            .map(|m| m.to_string())
            .unwrap_or_else(|| fallback.to_string());
        Some(message)
    })
}

pub fn validate_submission(
    req: &SubmitApplicationRequest,
    rules: &ResumeRules,
) -> Result<ValidatedSubmission> {
    if let Err(errors) = validate(req) {
        let message = first_field_error(&errors).unwrap_or_else(|| "Invalid submission".into());
        return Err(Error::Validation(message));
    }
    if req.consent != JsonValue::Bool(true) {
        return Err(Error::Validation("Consent required".into()));
    }
    if req.captcha_token.trim().is_empty() {
        return Err(Error::Validation("CAPTCHA required".into()));
    }

    let resume = validate_resume(req.resume_data.as_deref(), req.resume_name.as_deref(), rules)?;

    Ok(ValidatedSubmission {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.phone.trim().to_string(),
        position: req.position.trim().to_string(),
        availability: req.availability.trim().to_string(),
        experience: req.experience.trim().to_string(),
        captcha_token: req.captcha_token.trim().to_string(),
        resume,
    })
}

/// Type and size checks only; decoding and content sniffing happen when the
/// file is processed.
pub fn validate_resume(
    data: Option<&str>,
    file_name: Option<&str>,
    rules: &ResumeRules,
) -> Result<Option<ResumeUpload>> {
    let Some(data) = data.filter(|d| !d.trim().is_empty()) else {
        if rules.required {
            return Err(Error::Validation("Resume is required".into()));
        }
        return Ok(None);
    };

    let file_name = file_name.unwrap_or_default().trim().to_string();
    let extension = file_extension(&file_name)
        .filter(|ext| rules.allows_extension(ext))
        .ok_or_else(|| Error::FileRejected(rules.type_error()))?;

    let payload = ResumePayload::parse(data)
        .ok_or_else(|| Error::FileRejected("Invalid file encoding".into()))?;

    if let Some(mime) = payload.declared_mime.as_deref() {
        if !rules.allows_mime(mime) {
            return Err(Error::FileRejected(rules.type_error()));
        }
    }

    if payload.estimated_decoded_len() > rules.max_bytes {
        return Err(Error::FileRejected(rules.size_error()));
    }

    Ok(Some(ResumeUpload {
        file_name,
        extension,
        payload,
    }))
}
