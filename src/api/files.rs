//! File API endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::error::AppResult;
use crate::models::StatusQuery;
use crate::services::Lifecycle;

/// Delete a file.
///
/// With a valid `X-ADMIN-TOKEN` any file is removed. Otherwise only a draft
/// file of a draft application may be deleted.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "File UUID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 400, description = "File not found or not deletable", body = crate::error::ErrorResponse),
        (status = 404, description = "File not found (admin)", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_file(
    admin: Option<AdminAuth>,
    lifecycle: web::Data<Lifecycle>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let file_id = path.into_inner();
    match admin {
        Some(_) => lifecycle.admin_delete_file(file_id).await?,
        None => lifecycle.delete_file(file_id).await?,
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Set a file's status (admin).
#[utoipa::path(
    patch,
    path = "/api/files/{id}",
    tag = "Admin",
    params(
        ("id" = Uuid, Path, description = "File UUID"),
        ("status" = String, Query, description = "New status, any non-empty value")
    ),
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Missing status", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid admin token", body = crate::error::ErrorResponse),
    ),
    security(
        ("admin_token" = [])
    )
)]
pub async fn update_file_status(
    _admin: AdminAuth,
    lifecycle: web::Data<Lifecycle>,
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
) -> AppResult<HttpResponse> {
    let status = query.status.as_deref().unwrap_or_default();
    lifecycle.update_file_status(path.into_inner(), status).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure file routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/files/{id}")
            .route(web::delete().to(delete_file))
            .route(web::patch().to(update_file_status)),
    );
}
