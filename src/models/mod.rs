//! Domain models for the horse registry.

pub mod application;
pub mod file;

// Re-export commonly used types
pub use application::{
    ApplicationDetailResponse, ApplicationResponse, ApplicationStatus, ApplicationSummary,
    CreateApplicationRequest, SearchQuery, StatusQuery,
};
pub use file::{FORBIDDEN_EXTENSIONS, FileResponse, FileStatus, FileType, has_forbidden_extension};
