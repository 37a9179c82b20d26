//! Actix-web extractor for the admin token header.
//!
//! The header value is wrapped in `SecretString` as soon as it is read and is
//! never logged.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use secrecy::{ExposeSecret, SecretString};
use std::future::{Ready, ready};

use super::AdminKey;
use crate::config::ADMIN_TOKEN_HEADER;
use crate::error::AppError;

fn extract_secret_header(req: &HttpRequest, header_name: &str) -> Option<SecretString> {
    req.headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(|s| SecretString::from(s.to_string()))
}

/// Proof that the request carried a valid `X-ADMIN-TOKEN`.
///
/// ```ignore
/// async fn admin_only(_admin: AdminAuth) -> impl Responder { ... }
/// ```
///
/// Use `Option<AdminAuth>` for routes that behave differently for admins.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequest for AdminAuth {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(admin_key) = req.app_data::<web::Data<AdminKey>>() else {
            return ready(Err(AppError::Unauthorized(
                "admin access is not configured".to_string(),
            )));
        };

        let Some(provided) = extract_secret_header(req, ADMIN_TOKEN_HEADER) else {
            return ready(Err(AppError::Unauthorized(format!(
                "missing {} header",
                ADMIN_TOKEN_HEADER
            ))));
        };

        if admin_key.verify(provided.expose_secret()) {
            ready(Ok(AdminAuth))
        } else {
            ready(Err(AppError::Unauthorized("invalid admin token".to_string())))
        }
    }
}
