pub mod admin;
pub mod applications;
pub mod health;
pub mod resumes;

use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::dto::application_dto::{ApplicationList, SubmitApplicationRequest, SubmitApplicationResponse};
use crate::models::application::Application;

#[derive(OpenApi)]
#[openapi(
    paths(
        applications::submit_application,
        resumes::view_resume,
        admin::list_applications,
    ),
    components(schemas(
        SubmitApplicationRequest,
        SubmitApplicationResponse,
        ApplicationList,
        Application,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
