//! HTTP middleware.

mod cors;
mod request_logger;

pub use cors::{ALLOWED_METHODS, PermissiveCors};
pub use request_logger::RequestLogger;
