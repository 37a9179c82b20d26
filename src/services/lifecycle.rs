//! Application and file lifecycle.
//!
//! Every status rule of the registry lives here. Handlers only translate HTTP
//! into calls on [`Lifecycle`].
//!
//! Transactions that take row locks always lock the application row before the
//! file row.

use chrono::{Datelike, Utc};
use sea_orm::TransactionTrait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::entity::{application, application_file};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicationStatus, CreateApplicationRequest, FileStatus, FileType, has_forbidden_extension,
};
use crate::services::horse_names::validate_horse_names;
use crate::services::storage::{FileStore, StagedBlob, stored_file_name};

/// Earliest accepted foaling year.
pub const MIN_HORSE_YEAR: i32 = 1990;

/// A blob received for upload together with its client-side metadata.
#[derive(Debug)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: String,
    pub blob: StagedBlob,
}

/// Lifecycle engine over the shared pool and file store.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    pool: DbPool,
    store: FileStore,
    max_file_size: u64,
}

impl Lifecycle {
    pub fn new(pool: DbPool, store: FileStore, max_file_size: u64) -> Self {
        Self {
            pool,
            store,
            max_file_size,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate and insert a new draft application.
    pub async fn create_application(
        &self,
        req: CreateApplicationRequest,
    ) -> AppResult<application::Model> {
        let (horse_name_ru, horse_name_en) =
            validate_horse_names(req.horse_name_ru.as_deref(), req.horse_name_en.as_deref())?;
        validate_horse_year(req.horse_year, Utc::now().year())?;

        let created = db::applications::insert(
            self.pool.connection(),
            db::applications::NewApplication {
                horse_name_ru,
                horse_name_en,
                horse_year: req.horse_year,
                notes: req.notes,
            },
        )
        .await?;

        info!(
            "Created application {} (year {})",
            created.id, created.horse_year
        );
        Ok(created)
    }

    /// Newest applications first, filtered by name when `term` is non-empty.
    pub async fn search_applications(&self, term: &str) -> AppResult<Vec<application::Model>> {
        db::applications::search(self.pool.connection(), term.trim()).await
    }

    /// Application plus its files in upload order.
    pub async fn get_application(
        &self,
        id: Uuid,
    ) -> AppResult<(application::Model, Vec<application_file::Model>)> {
        let conn = self.pool.connection();
        let app = db::applications::find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {}", id)))?;
        let files = db::files::list_for_application(conn, id).await?;
        debug!("Loaded application {} with {} files", id, files.len());
        Ok((app, files))
    }

    /// Fail unless the application exists and may still receive uploads.
    pub async fn ensure_accepts_uploads(&self, id: Uuid) -> AppResult<application::Model> {
        let app = db::applications::find_by_id(self.pool.connection(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {}", id)))?;

        if ApplicationStatus::Complete.matches(&app.status) {
            return Err(AppError::Conflict(
                "cannot upload to complete application".to_string(),
            ));
        }
        Ok(app)
    }

    /// Attach a staged blob to an application as a new draft file.
    ///
    /// The staged blob is consumed: it is either moved into place or removed.
    pub async fn upload_file(
        &self,
        application_id: Uuid,
        file_type: &str,
        incoming: IncomingFile,
    ) -> AppResult<application_file::Model> {
        let IncomingFile {
            original_name,
            content_type,
            blob,
        } = incoming;

        let checked = self
            .check_upload(application_id, file_type, &original_name, blob.size())
            .await;
        let file_type = match checked {
            Ok(file_type) => file_type,
            Err(e) => {
                self.store.discard(blob).await;
                return Err(e);
            }
        };

        let file_id = Uuid::new_v4();
        let size = blob.size();
        let stored_name = stored_file_name(application_id, file_type.as_str(), file_id, &original_name);
        let storage_path = self.store.persist(blob, application_id, &stored_name).await?;

        let inserted = db::files::insert(
            self.pool.connection(),
            db::files::NewFile {
                id: file_id,
                application_id,
                file_type: file_type.as_str().to_string(),
                original_name,
                size_bytes: i64::try_from(size).unwrap_or(i64::MAX),
                storage_path: storage_path.clone(),
                content_type,
            },
        )
        .await;

        match inserted {
            Ok(file) => {
                info!(
                    "Uploaded file {} ({}, {} bytes) to application {}",
                    file.id, file.file_type, file.size_bytes, application_id
                );
                Ok(file)
            }
            Err(e) => {
                self.store.remove(&storage_path).await;
                Err(e)
            }
        }
    }

    async fn check_upload(
        &self,
        application_id: Uuid,
        file_type: &str,
        original_name: &str,
        size: u64,
    ) -> AppResult<FileType> {
        self.ensure_accepts_uploads(application_id).await?;

        let file_type = FileType::parse(file_type.trim())
            .ok_or_else(|| AppError::InvalidInput(format!("invalid file_type '{}'", file_type)))?;

        if has_forbidden_extension(original_name) {
            return Err(AppError::InvalidInput("file type not allowed".to_string()));
        }

        if size > self.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "file exceeds the {} byte limit",
                self.max_file_size
            )));
        }

        Ok(file_type)
    }

    /// User delete: only a draft file of a draft application.
    pub async fn delete_file(&self, file_id: Uuid) -> AppResult<()> {
        let not_deletable = || AppError::Conflict("File not found or not deletable".to_string());

        let application_id = db::files::find_by_id(self.pool.connection(), file_id)
            .await?
            .map(|f| f.application_id)
            .ok_or_else(not_deletable)?;

        let txn = self.pool.connection().begin().await?;

        let app = db::applications::find_for_update(&txn, application_id).await?;
        let file = db::files::find_for_update(&txn, file_id)
            .await?
            .filter(|f| f.application_id == application_id && FileStatus::Draft.matches(&f.status))
            .ok_or_else(not_deletable)?;

        match app {
            Some(app) if ApplicationStatus::Draft.matches(&app.status) => {}
            _ => return Err(AppError::Conflict("Application is not draft".to_string())),
        }

        db::files::delete(&txn, file_id).await?;
        txn.commit().await?;

        self.store.remove(&file.storage_path).await;
        info!("Deleted file {} from application {}", file_id, application_id);
        Ok(())
    }

    /// Admin delete: any file regardless of status.
    pub async fn admin_delete_file(&self, file_id: Uuid) -> AppResult<()> {
        let not_found = || AppError::NotFound(format!("File {}", file_id));

        let application_id = db::files::find_by_id(self.pool.connection(), file_id)
            .await?
            .map(|f| f.application_id)
            .ok_or_else(not_found)?;

        let txn = self.pool.connection().begin().await?;

        db::applications::find_for_update(&txn, application_id).await?;
        let file = db::files::find_for_update(&txn, file_id)
            .await?
            .ok_or_else(not_found)?;

        db::files::delete(&txn, file_id).await?;
        txn.commit().await?;

        self.store.remove(&file.storage_path).await;
        info!(
            "Admin deleted file {} (status {}) from application {}",
            file_id, file.status, application_id
        );
        Ok(())
    }

    /// Move every draft file of the application to `sent`.
    ///
    /// The application row is locked but its own status is left as is.
    pub async fn submit_application(&self, id: Uuid) -> AppResult<u64> {
        let txn = self.pool.connection().begin().await?;

        let app = db::applications::find_for_update(&txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {}", id)))?;

        if ApplicationStatus::Complete.matches(&app.status) {
            return Err(AppError::Conflict(
                "cannot submit complete application".to_string(),
            ));
        }

        let sent = db::files::mark_drafts_sent(&txn, id).await?;
        txn.commit().await?;

        info!("Submitted application {} ({} files sent)", id, sent);
        Ok(sent)
    }

    /// Admin override of an application's status. Any non-empty value.
    pub async fn update_application_status(&self, id: Uuid, status: &str) -> AppResult<()> {
        let status = require_status(status)?;
        let updated = db::applications::set_status(self.pool.connection(), id, status).await?;
        if updated == 0 {
            warn!("Status update for unknown application {}", id);
        } else {
            info!("Application {} status set to '{}'", id, status);
        }
        Ok(())
    }

    /// Admin override of a file's status. Any non-empty value.
    pub async fn update_file_status(&self, id: Uuid, status: &str) -> AppResult<()> {
        let status = require_status(status)?;
        let updated = db::files::set_status(self.pool.connection(), id, status).await?;
        if updated == 0 {
            warn!("Status update for unknown file {}", id);
        } else {
            info!("File {} status set to '{}'", id, status);
        }
        Ok(())
    }
}

/// The value is stored exactly as given; only an empty string is refused.
fn require_status(status: &str) -> AppResult<&str> {
    if status.is_empty() {
        return Err(AppError::InvalidInput("status is required".to_string()));
    }
    Ok(status)
}

fn validate_horse_year(year: i32, current_year: i32) -> AppResult<()> {
    if (MIN_HORSE_YEAR..=current_year).contains(&year) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "horse_year must be between {} and {}",
            MIN_HORSE_YEAR, current_year
        )))
    }
}
