//! Shared test helpers for the registry E2E suite.

use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{App, dev::ServiceResponse, test, web};
use horse_registry_lib::api;
use horse_registry_lib::auth::AdminKey;
use horse_registry_lib::config::UploadLimits;
use horse_registry_lib::db::{self, DbPool};
use horse_registry_lib::entity::{application, application_file};
use horse_registry_lib::error::AppResult;
use horse_registry_lib::models::CreateApplicationRequest;
use horse_registry_lib::services::{IncomingFile, Lifecycle};
use sea_orm::{ConnectOptions, ConnectionTrait, Database};
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

/// Admin token configured on the test app.
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Per-file ceiling used by the suite.
pub const TEST_MAX_FILE_SIZE: u64 = 4 * 1024;

/// Request body cap used by the suite.
pub const TEST_MAX_REQUEST_SIZE: u64 = 64 * 1024;

const BOUNDARY: &str = "----registry-test-boundary";

const SCHEMA: &[&str] = &[
    "CREATE TABLE applications (
        id BLOB PRIMARY KEY NOT NULL,
        horse_name_ru TEXT,
        horse_name_en TEXT,
        horse_year INTEGER NOT NULL,
        status TEXT NOT NULL,
        mare_ownership_confirmed INTEGER NOT NULL,
        genetic_done_through_association INTEGER NOT NULL,
        genetic_pending INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        notes TEXT
    )",
    "CREATE TABLE files (
        id BLOB PRIMARY KEY NOT NULL,
        application_id BLOB NOT NULL,
        file_type TEXT NOT NULL,
        original_name TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        storage_path TEXT NOT NULL,
        content_type TEXT NOT NULL,
        status TEXT NOT NULL,
        uploaded_at TEXT NOT NULL
    )",
];

/// Database, storage directory and lifecycle engine for one test.
pub struct TestEnv {
    pub pool: DbPool,
    pub lifecycle: Lifecycle,
    pub limits: UploadLimits,
    storage: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        // One connection: every query sees the same in-memory database.
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let conn = Database::connect(options)
            .await
            .expect("Failed to open in-memory SQLite database");
        for statement in SCHEMA {
            conn.execute_unprepared(statement)
                .await
                .expect("Failed to create test schema");
        }

        let pool = DbPool::from_connection(conn);
        let storage = tempfile::tempdir().expect("Failed to create storage dir");
        let store = horse_registry_lib::services::FileStore::new(storage.path());
        store.init().await.expect("Failed to init file store");

        let limits = UploadLimits {
            max_file_size: TEST_MAX_FILE_SIZE,
            max_request_size: TEST_MAX_REQUEST_SIZE,
        };
        let lifecycle = Lifecycle::new(pool.clone(), store, limits.max_file_size);

        Self {
            pool,
            lifecycle,
            limits,
            storage,
        }
    }

    /// Number of blobs stored under an application's directory.
    pub fn stored_blob_count(&self, application_id: Uuid) -> usize {
        std::fs::read_dir(self.storage.path().join(application_id.to_string()))
            .map(|d| d.count())
            .unwrap_or(0)
    }

    /// Number of blobs left in the staging area.
    pub fn staged_blob_count(&self) -> usize {
        std::fs::read_dir(self.storage.path().join(".staging"))
            .map(|d| d.count())
            .unwrap_or(0)
    }

    /// Create a draft application with an English name.
    pub async fn create_application(&self, name_en: &str) -> application::Model {
        self.lifecycle
            .create_application(CreateApplicationRequest {
                horse_name_ru: None,
                horse_name_en: Some(name_en.to_string()),
                horse_year: 2020,
                notes: String::new(),
            })
            .await
            .expect("Failed to create application")
    }

    /// Stage `data` and upload it through the lifecycle engine.
    pub async fn upload(
        &self,
        application_id: Uuid,
        file_type: &str,
        filename: &str,
        data: &[u8],
    ) -> AppResult<application_file::Model> {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::copy_from_slice(data))];
        let blob = self
            .lifecycle
            .store()
            .stage(futures_util::stream::iter(chunks), self.limits.max_file_size)
            .await?;
        self.lifecycle
            .upload_file(
                application_id,
                file_type,
                IncomingFile {
                    original_name: filename.to_string(),
                    content_type: "application/octet-stream".to_string(),
                    blob,
                },
            )
            .await
    }

    /// Re-read a file row.
    pub async fn file_row(&self, id: Uuid) -> Option<application_file::Model> {
        db::files::find_by_id(self.pool.connection(), id)
            .await
            .expect("Failed to read file row")
    }

    /// Re-read an application row.
    pub async fn application_row(&self, id: Uuid) -> Option<application::Model> {
        db::applications::find_by_id(self.pool.connection(), id)
            .await
            .expect("Failed to read application row")
    }
}

/// Create a test app with every `/api` route.
pub async fn create_test_app(
    env: &TestEnv,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(env.pool.clone()))
            .app_data(web::Data::new(env.lifecycle.clone()))
            .app_data(web::Data::new(AdminKey::new(Some(
                TEST_ADMIN_TOKEN.to_string(),
            ))))
            .app_data(web::Data::new(env.limits))
            .app_data(api::json_config())
            .service(web::scope("/api").configure(api::configure_api)),
    )
    .await
}

/// Build a multipart body with a `file` part followed by a `file_type` part.
pub fn multipart_body(filename: &str, data: &[u8], file_type: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    if let Some(file_type) = file_type {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file_type\"\r\n\r\n{file_type}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// One multipart part for a named field, optionally carrying a filename and
/// content type.
pub fn multipart_part(
    name: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Vec<u8> {
    let mut part = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"");
    if let Some(filename) = filename {
        part.push_str(&format!("; filename=\"{filename}\""));
    }
    part.push_str("\r\n");
    if let Some(content_type) = content_type {
        part.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    part.push_str("\r\n");

    let mut bytes = part.into_bytes();
    bytes.extend_from_slice(data);
    bytes.extend_from_slice(b"\r\n");
    bytes
}

/// Join parts and append the closing boundary.
pub fn multipart_close(parts: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body: Vec<u8> = parts.into_iter().flatten().collect();
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a prepared multipart body. With `chunked` the request carries
/// `Transfer-Encoding: chunked` instead of a `Content-Length`.
pub async fn post_multipart<S>(
    app: &S,
    application_id: Uuid,
    body: Vec<u8>,
    chunked: bool,
) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut req = test::TestRequest::post()
        .uri(&format!("/api/applications/{}/files", application_id))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
        .to_request();
    if chunked {
        req.headers_mut().remove(header::CONTENT_LENGTH);
        req.headers_mut().insert(
            header::TRANSFER_ENCODING,
            header::HeaderValue::from_static("chunked"),
        );
    }
    call_json(app, req).await
}

/// POST a multipart upload; returns status and JSON body.
pub async fn upload_via_http<S>(
    app: &S,
    application_id: Uuid,
    filename: &str,
    data: &[u8],
    file_type: Option<&str>,
) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let body = multipart_body(filename, data, file_type);
    let req = test::TestRequest::post()
        .uri(&format!("/api/applications/{}/files", application_id))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .insert_header((header::CONTENT_LENGTH, body.len()))
        .set_payload(body)
        .to_request();
    call_json(app, req).await
}

/// Call the app and decode a JSON body.
pub async fn call_json<S>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Call the app and return only the status code.
pub async fn call_status<S>(app: &S, req: actix_http::Request) -> u16
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    test::call_service(app, req).await.status().as_u16()
}

/// Create an application over HTTP; returns status and JSON body.
pub async fn create_via_http<S>(app: &S, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/applications")
        .set_json(body)
        .to_request();
    call_json(app, req).await
}

/// Parse the `id` field of a JSON body.
pub fn id_of(body: &Value) -> Uuid {
    body["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("body has no id: {}", body))
}
