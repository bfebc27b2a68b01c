use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use libris_http::error::AppError;

use super::models::{Member, MemberId, MemberPayload};
use super::service::MemberService;
use crate::utils::validation::Validate;

/// `POST /add`
pub async fn add_member(
    State(service): State<MemberService>,
    payload: Result<Json<MemberPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let member = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// `GET /{id}`
pub async fn get_member(
    State(service): State<MemberService>,
    path: Result<Path<MemberId>, PathRejection>,
) -> Result<Json<Member>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.fetch(id).await?))
}

/// `PUT /update/{id}`
pub async fn update_member(
    State(service): State<MemberService>,
    path: Result<Path<MemberId>, PathRejection>,
    payload: Result<Json<MemberPayload>, JsonRejection>,
) -> Result<Json<Member>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    payload.validate()?;

    Ok(Json(service.update(id, payload).await?))
}

/// `DELETE /delete/{id}`
pub async fn delete_member(
    State(service): State<MemberService>,
    path: Result<Path<MemberId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
