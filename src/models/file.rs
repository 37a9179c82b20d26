//! File domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::application_file;

/// Extensions that are never accepted, compared case-insensitively.
pub const FORBIDDEN_EXTENSIONS: &[&str] = &["exe", "bat", "cmd", "sh", "js", "jar", "py"];

/// Known file workflow states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Draft,
    Sent,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            _ => None,
        }
    }

    /// Whether a raw status column value equals this state.
    pub fn matches(&self, raw: &str) -> bool {
        raw == self.as_str()
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document categories accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    PassportApplication,
    OwnershipOrContract,
    BreedingOrCertificate,
    FoalIdentificationAct,
    GeneticCertificate,
    Media,
}

impl FileType {
    pub const ALL: [FileType; 6] = [
        Self::PassportApplication,
        Self::OwnershipOrContract,
        Self::BreedingOrCertificate,
        Self::FoalIdentificationAct,
        Self::GeneticCertificate,
        Self::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassportApplication => "passport_application",
            Self::OwnershipOrContract => "ownership_or_contract",
            Self::BreedingOrCertificate => "breeding_or_certificate",
            Self::FoalIdentificationAct => "foal_identification_act",
            Self::GeneticCertificate => "genetic_certificate",
            Self::Media => "media",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check whether a filename ends in one of the forbidden extensions.
pub fn has_forbidden_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            FORBIDDEN_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// File metadata record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub file_type: String,
    pub original_name: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub content_type: String,
    /// Workflow status; admins may set values outside draft/sent.
    pub status: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<application_file::Model> for FileResponse {
    fn from(m: application_file::Model) -> Self {
        Self {
            id: m.id,
            application_id: m.application_id,
            file_type: m.file_type,
            original_name: m.original_name,
            size_bytes: m.size_bytes,
            storage_path: m.storage_path,
            content_type: m.content_type,
            status: m.status,
            uploaded_at: m.uploaded_at,
        }
    }
}
