//! Database queries for files attached to applications.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::application_file::{self, ActiveModel, Entity as ApplicationFile};
use crate::error::{AppError, AppResult};
use crate::models::FileStatus;

use super::for_update;

/// Metadata for a blob already written to the file store.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub id: Uuid,
    pub application_id: Uuid,
    pub file_type: String,
    pub original_name: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub content_type: String,
}

/// Insert a file row in `draft`.
pub async fn insert<C: ConnectionTrait>(db: &C, new: NewFile) -> AppResult<application_file::Model> {
    let model = ActiveModel {
        id: Set(new.id),
        application_id: Set(new.application_id),
        file_type: Set(new.file_type),
        original_name: Set(new.original_name),
        size_bytes: Set(new.size_bytes),
        storage_path: Set(new.storage_path),
        content_type: Set(new.content_type),
        status: Set(FileStatus::Draft.as_str().to_string()),
        uploaded_at: Set(Utc::now()),
    };

    model
        .insert(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert file: {}", e)))
}

/// Get a file by ID.
pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<application_file::Model>> {
    let result = ApplicationFile::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get file: {}", e)))?;

    Ok(result)
}

/// Get a file by ID, locking the row until the transaction ends.
pub async fn find_for_update<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<application_file::Model>> {
    let result = for_update(ApplicationFile::find_by_id(id), db)
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to lock file: {}", e)))?;

    Ok(result)
}

/// All files of an application, oldest upload first.
pub async fn list_for_application<C: ConnectionTrait>(
    db: &C,
    application_id: Uuid,
) -> AppResult<Vec<application_file::Model>> {
    let rows = ApplicationFile::find()
        .filter(application_file::Column::ApplicationId.eq(application_id))
        .order_by_asc(application_file::Column::UploadedAt)
        .order_by_asc(application_file::Column::Id)
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list files: {}", e)))?;

    Ok(rows)
}

/// Move every `draft` file of an application to `sent`.
/// Returns the number of files moved.
pub async fn mark_drafts_sent<C: ConnectionTrait>(db: &C, application_id: Uuid) -> AppResult<u64> {
    let result = ApplicationFile::update_many()
        .col_expr(
            application_file::Column::Status,
            Expr::value(FileStatus::Sent.as_str()),
        )
        .filter(application_file::Column::ApplicationId.eq(application_id))
        .filter(application_file::Column::Status.eq(FileStatus::Draft.as_str()))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to submit files: {}", e)))?;

    Ok(result.rows_affected)
}

/// Overwrite the status column. Returns the number of rows touched.
pub async fn set_status<C: ConnectionTrait>(db: &C, id: Uuid, status: &str) -> AppResult<u64> {
    let result = ApplicationFile::update_many()
        .col_expr(application_file::Column::Status, Expr::value(status))
        .filter(application_file::Column::Id.eq(id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update file status: {}", e)))?;

    Ok(result.rows_affected)
}

/// Delete a file row. Returns the number of rows removed.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<u64> {
    let result = ApplicationFile::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete file: {}", e)))?;

    Ok(result.rows_affected)
}
