//! Book lifecycle: create-or-restock, fetch, update and delete.

use libris_db::Database;

use super::models::{Book, BookId, BookPayload};
use crate::error::LibraryError;
use crate::store::{LibraryStore, SqliteStore};

/// Adds one copy of `(title, author)`, creating the record on first sight.
pub fn create_or_restock<S: LibraryStore>(
    store: &mut S,
    title: &str,
    author: &str,
) -> Result<Book, LibraryError> {
    let mut book = match store.find_book_by_title_and_author(title, author)? {
        Some(existing) => existing,
        None => store.insert_book(title, author)?,
    };

    book.increment_amount();
    let book = store.save_book(&book)?;

    tracing::info!(book_id = book.id, amount = book.amount, "book stocked");
    Ok(book)
}

pub fn fetch<S: LibraryStore>(store: &mut S, id: BookId) -> Result<Book, LibraryError> {
    store.find_book_by_id(id)?.ok_or(LibraryError::BookNotFound)
}

/// Renames a book in place. Stock and borrowers are untouched.
pub fn update<S: LibraryStore>(
    store: &mut S,
    id: BookId,
    title: &str,
    author: &str,
) -> Result<Book, LibraryError> {
    let mut book = fetch(store, id)?;

    if let Some(other) = store.find_book_by_title_and_author(title, author)? {
        if other.id != id {
            tracing::debug!(book_id = id, other_id = other.id, "book update clashes with existing record");
            return Err(LibraryError::DuplicateBook);
        }
    }

    book.title = title.to_string();
    book.author = author.to_string();
    let book = store.save_book(&book)?;

    tracing::info!(book_id = id, "book updated");
    Ok(book)
}

pub fn delete<S: LibraryStore>(store: &mut S, id: BookId) -> Result<(), LibraryError> {
    let book = fetch(store, id)?;
    if book.is_borrowed() {
        tracing::debug!(book_id = id, borrowers = book.members.len(), "refusing to delete borrowed book");
        return Err(LibraryError::BookBorrowed);
    }

    store.delete_book_by_id(id)?;
    tracing::info!(book_id = id, "book deleted");
    Ok(())
}

/// Runs the book rules against the service database, one transaction per call.
#[derive(Clone)]
pub struct BookService {
    db: Database,
}

impl BookService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_or_restock(&self, payload: BookPayload) -> Result<Book, LibraryError> {
        self.db
            .transaction(move |tx| {
                create_or_restock(&mut SqliteStore::new(tx), &payload.title, &payload.author)
            })
            .await
    }

    pub async fn fetch(&self, id: BookId) -> Result<Book, LibraryError> {
        self.db
            .transaction(move |tx| fetch(&mut SqliteStore::new(tx), id))
            .await
    }

    pub async fn update(&self, id: BookId, payload: BookPayload) -> Result<Book, LibraryError> {
        self.db
            .transaction(move |tx| {
                update(&mut SqliteStore::new(tx), id, &payload.title, &payload.author)
            })
            .await
    }

    pub async fn delete(&self, id: BookId) -> Result<(), LibraryError> {
        self.db
            .transaction(move |tx| delete(&mut SqliteStore::new(tx), id))
            .await
    }
}
