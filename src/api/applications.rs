//! Application API endpoints.

use std::cell::Cell;
use std::rc::Rc;

use actix_multipart::Multipart;
use actix_web::error::PayloadError;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::config::UploadLimits;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicationDetailResponse, ApplicationResponse, ApplicationSummary, CreateApplicationRequest,
    FileResponse, FileType, SearchQuery, StatusQuery, has_forbidden_extension,
};
use crate::services::{FileStore, IncomingFile, Lifecycle, StagedBlob};

/// Upper bound for plain text form fields.
const MAX_TEXT_FIELD_BYTES: usize = 1024;

/// Multipart body of a file upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadFileForm {
    /// Document contents.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    file_type: FileType,
}

/// Create a new application.
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "Applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Invalid horse names or year", body = crate::error::ErrorResponse),
        (status = 500, description = "Database failure", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_application(
    lifecycle: web::Data<Lifecycle>,
    body: web::Json<CreateApplicationRequest>,
) -> AppResult<HttpResponse> {
    let created = lifecycle.create_application(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApplicationResponse::from(created)))
}

/// Search applications by horse name.
#[utoipa::path(
    get,
    path = "/api/applications",
    tag = "Applications",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive substring of either horse name"),
        ("q" = Option<String>, Query, description = "Used when `search` is empty")
    ),
    responses(
        (status = 200, description = "Up to 200 applications, newest first", body = Vec<ApplicationSummary>),
    )
)]
pub async fn search_applications(
    lifecycle: web::Data<Lifecycle>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let rows = lifecycle.search_applications(query.term()).await?;
    let body: Vec<ApplicationSummary> = rows.into_iter().map(ApplicationSummary::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Get an application with its files.
#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    tag = "Applications",
    params(
        ("id" = Uuid, Path, description = "Application UUID")
    ),
    responses(
        (status = 200, description = "Application and files", body = ApplicationDetailResponse),
        (status = 404, description = "Application not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_application(
    lifecycle: web::Data<Lifecycle>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let (application, files) = lifecycle.get_application(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApplicationDetailResponse {
        application: application.into(),
        files: files.into_iter().map(FileResponse::from).collect(),
    }))
}

/// Upload a document to an application.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/files",
    tag = "Applications",
    params(
        ("id" = Uuid, Path, description = "Application UUID")
    ),
    request_body(content = UploadFileForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Invalid file type, forbidden extension, oversized file or complete application", body = crate::error::ErrorResponse),
        (status = 404, description = "Application not found", body = crate::error::ErrorResponse),
        (status = 413, description = "Request body too large", body = crate::error::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::error::ErrorResponse),
    )
)]
pub async fn upload_file(
    req: HttpRequest,
    lifecycle: web::Data<Lifecycle>,
    limits: web::Data<UploadLimits>,
    path: web::Path<Uuid>,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    let application_id = path.into_inner();
    let max_request_size = limits.max_request_size;

    if let Some(length) = content_length(&req)
        && length > max_request_size
    {
        return Err(request_too_large(length, max_request_size));
    }

    lifecycle.ensure_accepts_uploads(application_id).await?;

    // Chunked bodies carry no Content-Length, so the cap is enforced on the
    // bytes actually received.
    let received = Rc::new(Cell::new(0u64));
    let body = counted_body(payload, Rc::clone(&received), max_request_size);
    let mut multipart = Multipart::new(req.headers(), body);

    let mut form = UploadForm::default();
    let read = read_upload_form(
        &mut multipart,
        lifecycle.store(),
        limits.max_file_size,
        &mut form,
    )
    .await;

    let read = if received.get() > max_request_size {
        Err(request_too_large(received.get(), max_request_size))
    } else {
        read
    };
    if let Err(e) = read {
        if let Some(file) = form.file.take() {
            lifecycle.store().discard(file.blob).await;
        }
        return Err(e);
    }

    let Some(incoming) = form.file else {
        return Err(AppError::InvalidInput("file is required".to_string()));
    };
    let file_type = form.file_type.unwrap_or_default();

    let file = lifecycle
        .upload_file(application_id, &file_type, incoming)
        .await?;

    Ok(HttpResponse::Created().json(FileResponse::from(file)))
}

/// Submit an application: every draft file becomes `sent`.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/submit",
    tag = "Applications",
    params(
        ("id" = Uuid, Path, description = "Application UUID")
    ),
    responses(
        (status = 204, description = "Draft files sent"),
        (status = 400, description = "Application is complete", body = crate::error::ErrorResponse),
        (status = 404, description = "Application not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn submit_application(
    lifecycle: web::Data<Lifecycle>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    lifecycle.submit_application(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Set an application's status (admin).
#[utoipa::path(
    patch,
    path = "/api/applications/{id}",
    tag = "Admin",
    params(
        ("id" = Uuid, Path, description = "Application UUID"),
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
pub async fn update_application_status(
    _admin: AdminAuth,
    lifecycle: web::Data<Lifecycle>,
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
) -> AppResult<HttpResponse> {
    let status = query.status.as_deref().unwrap_or_default();
    lifecycle
        .update_application_status(path.into_inner(), status)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Default)]
struct UploadForm {
    file: Option<IncomingFile>,
    file_type: Option<String>,
}

/// Count every body chunk into `received`, failing the stream past `limit`.
fn counted_body(
    payload: web::Payload,
    received: Rc<Cell<u64>>,
    limit: u64,
) -> impl Stream<Item = Result<Bytes, PayloadError>> {
    payload.map(move |chunk| {
        let chunk = chunk?;
        received.set(received.get() + chunk.len() as u64);
        if received.get() > limit {
            Err(PayloadError::Overflow)
        } else {
            Ok(chunk)
        }
    })
}

fn request_too_large(received: u64, limit: u64) -> AppError {
    AppError::RequestTooLarge(format!(
        "request body of {} bytes exceeds the {} byte limit",
        received, limit
    ))
}

fn content_length(req: &HttpRequest) -> Option<u64> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Read the `file` and `file_type` fields. Anything else is drained.
///
/// A staged blob is left in `form` even on error so the caller can discard it.
async fn read_upload_form(
    payload: &mut Multipart,
    store: &FileStore,
    max_file_size: u64,
    form: &mut UploadForm,
) -> AppResult<()> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if form.file.is_none() => {
                let original_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string)
                    .unwrap_or_default();

                if has_forbidden_extension(&original_name) {
                    drain_field(&mut field).await;
                    return Err(AppError::InvalidInput("file type not allowed".to_string()));
                }

                let content_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_default();

                let blob: StagedBlob = store.stage(&mut field, max_file_size).await?;
                debug!("Received '{}' ({} bytes)", original_name, blob.size());
                form.file = Some(IncomingFile {
                    original_name,
                    content_type,
                    blob,
                });
            }
            Some("file_type") => {
                form.file_type = Some(read_text_field(&mut field).await?);
            }
            other => {
                if let Some(name) = other {
                    warn!("Ignoring unexpected multipart field '{}'", name);
                }
                drain_field(&mut field).await;
            }
        }
    }
    Ok(())
}

async fn read_text_field(field: &mut actix_multipart::Field) -> AppResult<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            drain_field(field).await;
            return Err(AppError::InvalidInput("form field too long".to_string()));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map(|s| s.trim().to_string())
        .map_err(|_| AppError::InvalidInput("form field is not valid UTF-8".to_string()))
}

/// Drain a multipart field without saving.
async fn drain_field(field: &mut actix_multipart::Field) {
    while let Some(chunk) = field.next().await {
        if chunk.is_err() {
            break;
        }
    }
}

/// Configure application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/applications")
            .route(web::get().to(search_applications))
            .route(web::post().to(create_application)),
    )
    .service(
        web::resource("/applications/{id}")
            .route(web::get().to(get_application))
            .route(web::patch().to(update_application_status)),
    )
    .service(web::resource("/applications/{id}/files").route(web::post().to(upload_file)))
    .service(web::resource("/applications/{id}/submit").route(web::post().to(submit_application)));
}
