//! Local filesystem storage for uploaded documents.
//!
//! Blobs are streamed into a staging area first and moved under
//! `<root>/<application_id>/` once the upload has been accepted. Removal is
//! best-effort: failures are logged and never escalated.

use std::path::{Path, PathBuf};

use actix_web::web::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const STAGING_DIR: &str = ".staging";

/// Byte budget for the client-derived part of a stored name. The generated
/// prefix is at most 94 bytes, so the whole name stays under 255.
const MAX_NAME_COMPONENT_BYTES: usize = 120;

/// Longest suffix (dot included) still treated as an extension when shortening.
const MAX_EXTENSION_BYTES: usize = 16;

/// A blob written to the staging area but not yet attached to an application.
#[derive(Debug)]
pub struct StagedBlob {
    path: PathBuf,
    size: u64,
}

impl StagedBlob {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and staging directories if missing.
    pub async fn init(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(self.root.join(STAGING_DIR))
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create storage directory: {}", e)))?;
        info!("File storage initialized: root={}", self.root.display());
        Ok(())
    }

    /// Stream `body` into a fresh staging file.
    ///
    /// Writing stops once more than `max_bytes` have arrived: the partial file
    /// is removed, the rest of the stream is consumed and `PayloadTooLarge` is
    /// returned.
    pub async fn stage<S, E>(&self, mut body: S, max_bytes: u64) -> AppResult<StagedBlob>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        let staging = self.root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create staging directory: {}", e)))?;

        let path = staging.join(Uuid::new_v4().simple().to_string());
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create file: {}", e)))?;

        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    remove_quietly(&path).await;
                    return Err(AppError::InvalidInput(format!("Read error: {}", e)));
                }
            };

            size += chunk.len() as u64;
            if size > max_bytes {
                drop(file);
                remove_quietly(&path).await;
                while let Some(rest) = body.next().await {
                    if rest.is_err() {
                        break;
                    }
                }
                return Err(AppError::PayloadTooLarge(format!(
                    "file exceeds the {} byte limit",
                    max_bytes
                )));
            }

            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                remove_quietly(&path).await;
                return Err(AppError::Storage(format!("Failed to write file: {}", e)));
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            remove_quietly(&path).await;
            return Err(AppError::Storage(format!("Failed to flush file: {}", e)));
        }

        debug!("Staged blob {} ({} bytes)", path.display(), size);
        Ok(StagedBlob { path, size })
    }

    /// Move a staged blob under the application's directory.
    ///
    /// Returns the final path as stored in the file record.
    pub async fn persist(
        &self,
        blob: StagedBlob,
        application_id: Uuid,
        stored_name: &str,
    ) -> AppResult<String> {
        let dir = self.root.join(application_id.to_string());
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            remove_quietly(&blob.path).await;
            return Err(AppError::Storage(format!("Failed to create directory: {}", e)));
        }

        let final_path = dir.join(stored_name);
        if let Err(e) = tokio::fs::rename(&blob.path, &final_path).await {
            remove_quietly(&blob.path).await;
            return Err(AppError::Storage(format!("Failed to move file: {}", e)));
        }

        info!("Saved {} ({} bytes)", final_path.display(), blob.size);
        Ok(final_path.to_string_lossy().into_owned())
    }

    /// Drop a staged blob that will not be kept.
    pub async fn discard(&self, blob: StagedBlob) {
        remove_quietly(&blob.path).await;
    }

    /// Remove a stored blob. Best-effort.
    pub async fn remove(&self, storage_path: &str) {
        remove_quietly(Path::new(storage_path)).await;
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Reduce a client-supplied filename to a safe single path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = base.replace("..", "").replace(['/', '\\'], "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Cut `name` to at most `max_bytes` on a char boundary, keeping a short
/// extension intact.
fn shorten_file_name(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let ext = match name.rfind('.') {
        Some(i) if i > 0 && name.len() - i <= MAX_EXTENSION_BYTES => &name[i..],
        _ => "",
    };
    let stem = &name[..name.len() - ext.len()];

    let mut end = max_bytes.saturating_sub(ext.len()).min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stem[..end], ext)
}

/// Collision-resistant stored name: application id, file type, file id and
/// the sanitized original name, shortened to fit filesystem name limits.
pub fn stored_file_name(
    application_id: Uuid,
    file_type: &str,
    file_id: Uuid,
    original_name: &str,
) -> String {
    format!(
        "{}_{}_{}_{}",
        application_id,
        file_type,
        file_id.simple(),
        shorten_file_name(&sanitize_file_name(original_name), MAX_NAME_COMPONENT_BYTES)
    )
}
