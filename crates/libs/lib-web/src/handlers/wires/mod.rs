//! # Wire Handlers
//!
//! CRUD endpoints for wire transfers. Every route sits behind
//! [`require_auth`](crate::middleware::require_auth) and the rate limiter,
//! and only ever touches wires created by the caller. A wire owned by
//! someone else is reported as 404, never 403.

use axum::{extract::State, http::StatusCode, Json};
use lib_core::dto::{WireCreateRequest, WireListQuery, WireListResponse, WireUpdateRequest};
use lib_core::model::Wire;
use lib_core::Result;

use crate::extract::{ValidPath, ValidQuery, ValidatedJson};
use crate::middleware::CurrentUser;
use crate::services::WireService;

/// `POST /api/wires`. New wires start `pending` with a fresh reference number.
pub async fn create_wire(
    State(wires): State<WireService>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(req): ValidatedJson<WireCreateRequest>,
) -> Result<(StatusCode, Json<Wire>)> {
    let wire = wires.create(&user, req).await?;
    Ok((StatusCode::CREATED, Json(wire)))
}

/// `GET /api/wires?page=&page_size=&status=`, newest first.
///
/// An unrecognized `status` is ignored rather than rejected.
pub async fn list_wires(
    State(wires): State<WireService>,
    CurrentUser(user): CurrentUser,
    ValidQuery(query): ValidQuery<WireListQuery>,
) -> Result<Json<WireListResponse>> {
    let query = query.into_query()?;
    Ok(Json(wires.list(&user, query).await?))
}

pub async fn get_wire(
    State(wires): State<WireService>,
    CurrentUser(user): CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Wire>> {
    Ok(Json(wires.get(&user, id).await?))
}

/// `PUT /api/wires/{id}`. Only supplied fields change.
pub async fn update_wire(
    State(wires): State<WireService>,
    CurrentUser(user): CurrentUser,
    ValidPath(id): ValidPath<i64>,
    ValidatedJson(req): ValidatedJson<WireUpdateRequest>,
) -> Result<Json<Wire>> {
    Ok(Json(wires.update(&user, id, req).await?))
}

pub async fn delete_wire(
    State(wires): State<WireService>,
    CurrentUser(user): CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode> {
    wires.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests;
