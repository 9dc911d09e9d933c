//! # Response Mapping Middleware
//!
//! Completes error bodies with the request path and turns panics into the
//! generic 500 body.
//!
//! [`AppError`](lib_core::AppError) responses carry a copy of their
//! [`ErrorResponse`] in the response extensions. [`map_res`] picks it up,
//! sets `path` from the request URI and re-serializes the body, keeping the
//! status and headers of the original response.

use std::any::Any;

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use lib_core::ErrorResponse;
use tracing::error;

pub async fn map_res(uri: Uri, req: Request, next: Next) -> Response {
    let res = next.run(req).await;

    let Some(body) = res.extensions().get::<ErrorResponse>().cloned() else {
        return res;
    };

    if res.status().is_server_error() {
        error!(path = %uri.path(), status = %res.status(), "[RESPONSE] Server error");
    }

    let body = body.with_path(uri.path());
    let (mut parts, _) = res.into_parts();
    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.extensions.insert(body);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            error!(error = %e, "[RESPONSE] Failed to serialize error body");
            ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "[PANIC] Handler panicked");

    ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}
