//! Domain errors for book, member and borrowing operations.

use libris_db::DbError;
use libris_http::error::AppError;
use thiserror::Error;

/// How an error surfaces to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Internal,
}

/// Rejections raised by the lending rules. Every variant except
/// [`LibraryError::Storage`] leaves the store untouched.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("No book with such id")]
    BookNotFound,

    #[error("No member with such id")]
    MemberNotFound,

    #[error("No member found with name: {0}")]
    MemberNameNotFound(String),

    #[error("Book with this author and title already exists")]
    DuplicateBook,

    #[error("Book cannot be deleted as it is currently borrowed.")]
    BookBorrowed,

    #[error("Member cannot be deleted because they borrowed books.")]
    MemberHasBooks,

    #[error("Borrowing limit reached for this member")]
    LimitReached,

    #[error("The book has already been borrowed by this user")]
    AlreadyBorrowed,

    #[error("There are no such books")]
    OutOfStock,

    #[error("Member didn't borrow this book")]
    NotBorrowed,

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl LibraryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::BookNotFound
            | LibraryError::MemberNotFound
            | LibraryError::MemberNameNotFound(_) => ErrorKind::NotFound,
            LibraryError::DuplicateBook
            | LibraryError::BookBorrowed
            | LibraryError::MemberHasBooks
            | LibraryError::LimitReached
            | LibraryError::AlreadyBorrowed
            | LibraryError::OutOfStock
            | LibraryError::NotBorrowed => ErrorKind::Conflict,
            LibraryError::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => AppError::not_found(err.to_string()),
            ErrorKind::Conflict => AppError::conflict(Vec::new(), err.to_string()),
            ErrorKind::Internal => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}
