//! # Validating Extractors
//!
//! Wrappers around axum's `Json`, `Query` and `Path` that turn every
//! rejection into a 422 [`AppError::Validation`], so malformed input gets the
//! same JSON body as a failed field check.
//!
//! [`ValidatedJson`] additionally runs [`Validate`] on the decoded body;
//! a handler that takes it never sees invalid data.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use lib_core::dto::Validate;
use lib_core::AppError;
use serde::de::DeserializeOwned;

/// JSON body that deserialized and passed [`Validate`].
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate().map_err(AppError::Validation)?;
        Ok(Self(value))
    }
}

/// Query string with 422 rejections.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        Ok(Self(value))
    }
}

/// Path parameters with 422 rejections.
#[derive(Debug)]
pub struct ValidPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::validation("body", rejection.body_text())
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::validation("query", rejection.body_text())
}

fn path_rejection(rejection: PathRejection) -> AppError {
    AppError::validation("path", rejection.body_text())
}
