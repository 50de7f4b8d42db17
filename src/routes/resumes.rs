use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use tracing::info;

use crate::{
    dto::application_dto::ResumeQuery,
    error::{Error, Result},
    middleware::auth::Claims,
    services::resume_storage::sanitize_storage_path,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/resumes",
    params(ResumeQuery),
    responses(
        (status = 200, description = "Stored resume, served inline"),
        (status = 400, description = "Missing or unsafe path"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "File not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn view_resume(
    State(state): State<AppState>,
    claims: axum::Extension<Claims>,
    Query(query): Query<ResumeQuery>,
) -> Result<impl IntoResponse> {
    let raw = query
        .path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::BadRequest("Missing file path parameter".into()))?;
    let path = sanitize_storage_path(raw).ok_or_else(|| Error::BadRequest("Invalid file path".into()))?;

    let resume = state.resume_service.open(&path).await?;
    info!(sub = %claims.sub, path = %path, "resume viewed");

    let disposition = format!(
        "inline; filename=\"{}\"",
        resume.file_name.replace(['"', '\\', '\r', '\n'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, resume.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        resume.data,
    ))
}
