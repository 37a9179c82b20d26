//! Application domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::application;

use super::file::FileResponse;

/// Known application workflow states.
///
/// Admins may store any other string in the status column; such values
/// simply fail to parse and are treated as "not draft, not complete".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Sent,
    Complete,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Whether a raw status column value equals this state.
    pub fn matches(&self, raw: &str) -> bool {
        raw == self.as_str()
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to create a new application.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateApplicationRequest {
    /// Horse name in Cyrillic letters.
    #[serde(default)]
    pub horse_name_ru: Option<String>,
    /// Horse name in Latin letters.
    #[serde(default)]
    pub horse_name_en: Option<String>,
    /// Foaling year (1990 ..= current year).
    #[serde(default)]
    pub horse_year: i32,
    #[serde(default)]
    pub notes: String,
}

/// Full application record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horse_name_ru: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horse_name_en: Option<String>,
    pub horse_year: i32,
    /// Workflow status; admins may set values outside draft/sent/complete.
    pub status: String,
    pub mare_ownership_confirmed: bool,
    pub genetic_done_through_association: bool,
    pub genetic_pending: bool,
    pub created_at: DateTime<Utc>,
    pub notes: String,
}

impl From<application::Model> for ApplicationResponse {
    fn from(m: application::Model) -> Self {
        Self {
            id: m.id,
            horse_name_ru: m.horse_name_ru,
            horse_name_en: m.horse_name_en,
            horse_year: m.horse_year,
            status: m.status,
            mare_ownership_confirmed: m.mare_ownership_confirmed,
            genetic_done_through_association: m.genetic_done_through_association,
            genetic_pending: m.genetic_pending,
            created_at: m.created_at,
            notes: m.notes.unwrap_or_default(),
        }
    }
}

/// Search result row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationSummary {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horse_name_ru: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horse_name_en: Option<String>,
    pub horse_year: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<application::Model> for ApplicationSummary {
    fn from(m: application::Model) -> Self {
        Self {
            id: m.id,
            horse_name_ru: m.horse_name_ru,
            horse_name_en: m.horse_name_en,
            horse_year: m.horse_year,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// Application with its attached files.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationDetailResponse {
    pub application: ApplicationResponse,
    /// Files ordered by upload time, oldest first.
    pub files: Vec<FileResponse>,
}

/// Query parameters for application search.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SearchQuery {
    /// Substring to look for in either horse name. Takes precedence over `q`.
    pub search: Option<String>,
    /// Alias for `search`.
    pub q: Option<String>,
}

impl SearchQuery {
    /// Effective search term: trimmed `search`, else trimmed `q`, else empty.
    pub fn term(&self) -> &str {
        let search = self.search.as_deref().map(str::trim).unwrap_or("");
        if !search.is_empty() {
            return search;
        }
        self.q.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Query parameters for admin status updates.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatusQuery {
    pub status: Option<String>,
}
