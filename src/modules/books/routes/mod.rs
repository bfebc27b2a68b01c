use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use libris_http::error::AppError;

use super::models::{Book, BookId, BookPayload};
use super::service::BookService;
use crate::utils::validation::Validate;

/// `POST /add`: add a copy, creating the book on first sight
pub async fn add_book(
    State(service): State<BookService>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let book = service.create_or_restock(payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// `GET /{id}`
pub async fn get_book(
    State(service): State<BookService>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = path?;
    Ok(Json(service.fetch(id).await?))
}

/// `PUT /update/{id}`
pub async fn update_book(
    State(service): State<BookService>,
    path: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    payload.validate()?;

    Ok(Json(service.update(id, payload).await?))
}

/// `DELETE /delete/{id}`
pub async fn delete_book(
    State(service): State<BookService>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
