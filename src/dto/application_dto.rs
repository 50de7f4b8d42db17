use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::application::Application;
use crate::utils::validation::{email_shape, not_blank, phone_digit_count};

/// Body of `POST /api/applications`. Field names follow the site's form;
/// older form revisions used `fullName` and `message`, accepted as aliases.
/// Field rules live in the `validate` attributes; consent, CAPTCHA and the
/// resume are checked in `validate_submission`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitApplicationRequest {
    #[serde(alias = "fullName", alias = "full_name")]
    #[validate(
        length(max = 100, message = "Invalid name"),
        custom(function = "not_blank", message = "Invalid name")
    )]
    pub name: String,
    #[validate(
        length(max = 255, message = "Invalid email"),
        custom(function = "email_shape", message = "Invalid email")
    )]
    pub email: String,
    #[validate(custom(function = "phone_digit_count", message = "Invalid phone number"))]
    pub phone: String,
    #[validate(
        length(max = 100, message = "Invalid position"),
        custom(function = "not_blank", message = "Invalid position")
    )]
    pub position: String,
    #[validate(
        length(max = 200, message = "Invalid availability"),
        custom(function = "not_blank", message = "Invalid availability")
    )]
    pub availability: String,
    #[serde(alias = "message", alias = "about")]
    #[validate(
        length(max = 1000, message = "Invalid experience description"),
        custom(function = "not_blank", message = "Invalid experience description")
    )]
    pub experience: String,
    /// Kept loose so that `"true"` or `1` is rejected as missing consent
    /// instead of failing body parsing.
    #[schema(value_type = bool)]
    pub consent: JsonValue,
    #[serde(alias = "captcha_token")]
    pub captcha_token: String,
    #[serde(alias = "resume_data")]
    pub resume_data: Option<String>,
    #[serde(alias = "resume_name")]
    pub resume_name: Option<String>,
    /// Honeypot. Humans never see this field.
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitApplicationResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListApplicationsQuery {
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationList {
    pub applications: Vec<Application>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResumeQuery {
    pub path: Option<String>,
}
