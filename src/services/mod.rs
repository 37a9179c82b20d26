//! Business logic services.

pub mod horse_names;
pub mod lifecycle;
pub mod storage;

pub use horse_names::{LanguageError, NameLanguage, detect_language, validate_horse_names};
pub use lifecycle::{IncomingFile, Lifecycle};
pub use storage::{FileStore, StagedBlob};
