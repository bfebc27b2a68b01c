use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use libris_http::error::AppError;

use super::models::BorrowedTitle;
use super::service::BorrowingService;
use crate::modules::books::models::{Book, BookId};
use crate::modules::members::models::MemberId;

pub const BORROWED: &str = "Borrowing added successfully";
pub const RETURNED: &str = "Book returned successfully";

/// `POST /add/{member_id}/{book_id}`
pub async fn borrow_book(
    State(service): State<BorrowingService>,
    path: Result<Path<(MemberId, BookId)>, PathRejection>,
) -> Result<&'static str, AppError> {
    let Path((member_id, book_id)) = path?;
    service.borrow(member_id, book_id).await?;
    Ok(BORROWED)
}

/// `DELETE /return/{member_id}/{book_id}`
pub async fn return_book(
    State(service): State<BorrowingService>,
    path: Result<Path<(MemberId, BookId)>, PathRejection>,
) -> Result<&'static str, AppError> {
    let Path((member_id, book_id)) = path?;
    service.return_book(member_id, book_id).await?;
    Ok(RETURNED)
}

/// `GET /books/member/{name}`
pub async fn books_by_member(
    State(service): State<BorrowingService>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Path(name) = path?;
    Ok(Json(service.borrowed_books_by_member_name(name).await?))
}

/// `GET /books/borrowed`
pub async fn borrowed_titles(
    State(service): State<BorrowingService>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(service.borrowed_titles().await?))
}

/// `GET /books/borrowed_count`
pub async fn borrowed_titles_with_count(
    State(service): State<BorrowingService>,
) -> Result<Json<Vec<BorrowedTitle>>, AppError> {
    Ok(Json(service.borrowed_titles_with_count().await?))
}
