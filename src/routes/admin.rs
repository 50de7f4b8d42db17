use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::application_dto::{ApplicationList, ListApplicationsQuery},
    error::Result,
    utils::validation::validate,
    AppState,
};

pub const DEFAULT_PAGE_SIZE: i64 = 25;

#[utoipa::path(
    get,
    path = "/api/admin/applications",
    params(ListApplicationsQuery),
    responses(
        (status = 200, description = "Applications, newest first", body = ApplicationList),
        (status = 400, description = "Invalid paging parameters"),
        (status = 401, description = "Missing or invalid admin token")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<impl IntoResponse> {
    validate(&query)?;
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let result = state.application_store.list(page, limit).await?;
    Ok(Json(ApplicationList {
        applications: result.applications,
        total: result.total,
        page,
        limit,
    }))
}
