//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, get};
use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Horse Registry Server",
        version = "0.1.0",
        description = "API server for horse-breeding applications and their supporting documents"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Application endpoints
        api::applications::create_application,
        api::applications::search_applications,
        api::applications::get_application,
        api::applications::upload_file,
        api::applications::submit_application,
        api::applications::update_application_status,
        // File endpoints
        api::files::delete_file,
        api::files::update_file_status,
    ),
    components(
        schemas(
            error::ErrorResponse,
            api::health::HealthResponse,
            api::health::ReadyResponse,
            api::applications::UploadFileForm,
            models::ApplicationStatus,
            models::CreateApplicationRequest,
            models::ApplicationResponse,
            models::ApplicationSummary,
            models::ApplicationDetailResponse,
            models::FileStatus,
            models::FileType,
            models::FileResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Applications", description = "Application lifecycle"),
        (name = "Files", description = "Uploaded documents"),
        (name = "Admin", description = "Status overrides, requires X-ADMIN-TOKEN")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the admin token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_token",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::config::ADMIN_TOKEN_HEADER,
                        ),
                    ),
                ),
            );
        }
    }
}

/// Serve the OpenAPI document as JSON.
#[get("/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
