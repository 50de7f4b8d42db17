use crate::error::{Error, Result};
use crate::middleware::rate_limit::RateLimitConfig;
use crate::utils::validation::ResumeRules;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CAPTCHA_VERIFY_URL: &str = "https://hcaptcha.com/siteverify";
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

/// Room for the text fields on top of the encoded resume.
const FORM_FIELDS_ALLOWANCE: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    pub secret: Option<String>,
    pub verify_url: String,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local {
        root: PathBuf,
    },
    Supabase {
        url: String,
        service_key: String,
        bucket: String,
    },
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub owner_email: Option<String>,
    pub from: String,
    pub send_applicant_confirmation: bool,
    pub business_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_RESEND_API_URL.to_string(),
            api_key: None,
            owner_email: None,
            from: "Salon 803 Applications <onboarding@resend.dev>".to_string(),
            send_applicant_confirmation: true,
            business_name: "Salon 803".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub admin_jwt_secret: String,
    pub pepper: String,
    pub allowed_origin: String,
    pub max_request_bytes: usize,
    pub rate_limit: RateLimitConfig,
    pub captcha: CaptchaConfig,
    pub resume: ResumeRules,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let resume = ResumeRules {
            required: get_env_parse_or("RESUME_REQUIRED", true)?,
            max_bytes: get_env_parse_or("MAX_RESUME_BYTES", ResumeRules::default().max_bytes)?,
            allowed_extensions: get_env_opt("RESUME_ALLOWED_TYPES")
                .map(|raw| {
                    raw.split(',')
                        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| ResumeRules::default().allowed_extensions),
        };
        if resume.allowed_extensions.is_empty() {
            return Err(Error::Config(
                "RESUME_ALLOWED_TYPES must list at least one extension".to_string(),
            ));
        }

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            enabled: get_env_parse_or("RATE_LIMIT_ENABLED", defaults.enabled)?,
            max_per_window: get_env_parse_or("RATE_LIMIT_MAX", defaults.max_per_window)?,
            window: Duration::from_secs(get_env_parse_or(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.window.as_secs(),
            )?),
        };

        let captcha = CaptchaConfig {
            secret: get_env_opt("CAPTCHA_SECRET"),
            verify_url: get_url_or("CAPTCHA_VERIFY_URL", DEFAULT_CAPTCHA_VERIFY_URL)?,
        };

        let storage = match get_env_or("STORAGE_BACKEND", "local").to_ascii_lowercase().as_str() {
            "local" => StorageConfig::Local {
                root: PathBuf::from(get_env_or("UPLOADS_DIR", "./uploads")),
            },
            "supabase" => StorageConfig::Supabase {
                url: get_url("SUPABASE_URL")?,
                service_key: get_env("SUPABASE_SERVICE_ROLE_KEY")?,
                bucket: get_env_or("STORAGE_BUCKET", "applications"),
            },
            other => {
                return Err(Error::Config(format!(
                    "Invalid value for STORAGE_BACKEND: {other} (expected local or supabase)"
                )))
            }
        };

        let email_defaults = EmailConfig::default();
        let email = EmailConfig {
            api_url: get_url_or("RESEND_API_URL", DEFAULT_RESEND_API_URL)?,
            api_key: get_env_opt("RESEND_API_KEY"),
            owner_email: get_env_opt("OWNER_EMAIL"),
            from: get_env_opt("EMAIL_FROM").unwrap_or(email_defaults.from),
            send_applicant_confirmation: get_env_parse_or("SEND_APPLICANT_CONFIRMATION", true)?,
            business_name: get_env_opt("BUSINESS_NAME").unwrap_or(email_defaults.business_name),
        };

        let max_request_bytes = get_env_parse_or(
            "MAX_REQUEST_BYTES",
            default_max_request_bytes(resume.max_bytes),
        )?;

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: get_env("DATABASE_URL")?,
            admin_jwt_secret: get_env("ADMIN_JWT_SECRET")?,
            pepper: get_env("PEPPER")?,
            allowed_origin: get_env_or("ALLOWED_ORIGIN", "*"),
            max_request_bytes,
            rate_limit,
            captcha,
            resume,
            storage,
            email,
            log_format: get_env_parse_or("LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

/// The resume travels base64-encoded, so the body ceiling is 4/3 of the file
/// ceiling plus the form fields.
pub fn default_max_request_bytes(max_resume_bytes: usize) -> usize {
    max_resume_bytes.div_ceil(3) * 4 + FORM_FIELDS_ALLOWANCE
}

fn get_env(name: &str) -> Result<String> {
    get_env_opt(name)
        .ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

fn get_url(name: &str) -> Result<String> {
    let raw = get_env(name)?;
    check_url(name, raw)
}

fn get_url_or(name: &str, default: &str) -> Result<String> {
    check_url(name, get_env_or(name, default))
}

fn check_url(name: &str, raw: String) -> Result<String> {
    Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    Ok(raw.trim_end_matches('/').to_string())
}
