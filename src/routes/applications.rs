use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use tracing::debug;

use crate::{
    dto::application_dto::{SubmitApplicationRequest, SubmitApplicationResponse},
    error::{Error, Result},
    middleware::client_context::ClientInfo,
    services::application_service::{ClientContext, SubmissionOutcome},
    AppState,
};

pub const SUCCESS_MESSAGE: &str = "Application submitted successfully";

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = SubmitApplicationRequest,
    responses(
        (status = 200, description = "Application accepted", body = SubmitApplicationResponse),
        (status = 400, description = "Validation, file or CAPTCHA failure"),
        (status = 405, description = "Method not allowed"),
        (status = 413, description = "Request too large"),
        (status = 429, description = "Too many submissions from this client"),
        (status = 500, description = "Upload or storage failure")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    client: ClientInfo,
    request: Request,
) -> Result<impl IntoResponse> {
    let limit = state.config.max_request_bytes;
    if declared_length(request.headers()).is_some_and(|len| len > limit) {
        return Err(Error::PayloadTooLarge);
    }

    let client = ClientContext::new(&client.address, &client.user_agent, &state.config.pepper);

    // Chunked bodies carry no Content-Length; the read itself is capped.
    let body = to_bytes(request.into_body(), limit).await.map_err(|e| {
        debug!(error = %e, "request body rejected while reading");
        Error::PayloadTooLarge
    })?;

    match state.application_service.submit_raw(&body, &client).await? {
        SubmissionOutcome::Accepted(_) | SubmissionOutcome::Discarded => {
            Ok(Json(SubmitApplicationResponse {
                success: true,
                message: SUCCESS_MESSAGE.to_string(),
            }))
        }
    }
}

pub async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}
