//! Permissive CORS middleware.
//!
//! Every response carries a wildcard origin and the fixed method/header lists.
//! Preflight `OPTIONS` requests are answered with 204 without reaching routing.

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::Method;
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::{Error, HttpResponse};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

use crate::config::ADMIN_TOKEN_HEADER;

pub const ALLOWED_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

fn allowed_headers() -> String {
    format!("Content-Type, {}", ADMIN_TOKEN_HEADER)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    if let Ok(value) = HeaderValue::from_str(&allowed_headers()) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }
}

/// CORS middleware factory.
pub struct PermissiveCors;

impl<S, B> Transform<S, ServiceRequest> for PermissiveCors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = PermissiveCorsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PermissiveCorsMiddleware { service }))
    }
}

/// CORS middleware service.
pub struct PermissiveCorsMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PermissiveCorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if req.method() == Method::OPTIONS {
            let mut res = req
                .into_response(HttpResponse::NoContent().finish())
                .map_into_right_body();
            apply_cors_headers(res.headers_mut());
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            apply_cors_headers(res.headers_mut());
            Ok(res.map_into_left_body())
        })
    }
}
