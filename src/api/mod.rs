//! API endpoint modules.

pub mod applications;
pub mod files;
pub mod health;
pub mod openapi;

use actix_web::{HttpRequest, error::JsonPayloadError, web};

use crate::error::AppError;

pub use applications::configure_routes as configure_application_routes;
pub use files::configure_routes as configure_file_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Register every `/api` route on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_application_routes)
        .configure(configure_file_routes)
        .service(openapi::openapi_json);
}

/// JSON extractor config: malformed bodies become `INVALID_INPUT` errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        AppError::InvalidInput(err.to_string()).into()
    })
}
