//! Persistence gateway used by the lending rules.
//!
//! The rules are written against [`LibraryStore`] and always run inside one
//! storage transaction, so a rule that fails halfway leaves nothing behind.
//! The borrowing relation is owned by the member side: saving a member
//! rewrites its borrowed set, and a book's `members` is derived from it.

use libris_db::DbError;

use crate::modules::books::models::{Book, BookId};
use crate::modules::library::models::BorrowedTitle;
use crate::modules::members::models::{Member, MemberId};

pub mod sqlite;

#[cfg(test)]
pub mod memory;

pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, DbError>;

pub trait LibraryStore {
    fn find_book_by_id(&mut self, id: BookId) -> StoreResult<Option<Book>>;

    fn find_book_by_title_and_author(&mut self, title: &str, author: &str)
        -> StoreResult<Option<Book>>;

    /// Inserts a new book with no stock.
    fn insert_book(&mut self, title: &str, author: &str) -> StoreResult<Book>;

    /// Persists title, author and amount of an existing book.
    fn save_book(&mut self, book: &Book) -> StoreResult<Book>;

    fn delete_book_by_id(&mut self, id: BookId) -> StoreResult<()>;

    /// Loads the member together with every book they hold.
    fn find_member_by_id(&mut self, id: MemberId) -> StoreResult<Option<Member>>;

    /// Exact-match lookup; the lowest id wins when names repeat.
    fn find_member_by_name(&mut self, name: &str) -> StoreResult<Option<Member>>;

    /// Inserts a new member; storage assigns id and membership date.
    fn insert_member(&mut self, name: &str) -> StoreResult<Member>;

    /// Persists the name and the borrowed set of an existing member.
    fn save_member(&mut self, member: &Member) -> StoreResult<Member>;

    fn delete_member_by_id(&mut self, id: MemberId) -> StoreResult<()>;

    /// Titles with at least one current borrower, sorted.
    fn find_all_distinct_borrowed_titles(&mut self) -> StoreResult<Vec<String>>;

    /// Per borrowed title, the number of distinct members holding it, sorted
    /// by title.
    fn find_all_distinct_borrowed_titles_with_count(&mut self) -> StoreResult<Vec<BorrowedTitle>>;
}
