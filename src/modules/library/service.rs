//! Borrowing rules over the book and member records.
//!
//! A pair (member, book) is either not borrowed or borrowed. [`borrow`] is
//! the only forward transition and [`return_book`] the only reverse one;
//! anything else is rejected as a conflict without touching the store.

use libris_db::Database;

use super::models::BorrowedTitle;
use crate::error::LibraryError;
use crate::modules::books::models::{Book, BookId};
use crate::modules::members::models::{Member, MemberId};
use crate::store::{LibraryStore, SqliteStore};

fn load_pair<S: LibraryStore>(
    store: &mut S,
    member_id: MemberId,
    book_id: BookId,
) -> Result<(Member, Book), LibraryError> {
    let book = store
        .find_book_by_id(book_id)?
        .ok_or(LibraryError::BookNotFound)?;
    let member = store
        .find_member_by_id(member_id)?
        .ok_or(LibraryError::MemberNotFound)?;
    Ok((member, book))
}

/// Lends one copy of `book_id` to `member_id`.
///
/// The limit check is `held > limit`, so a member may end up holding
/// `limit + 1` books before further attempts are refused.
pub fn borrow<S: LibraryStore>(
    store: &mut S,
    limit: usize,
    member_id: MemberId,
    book_id: BookId,
) -> Result<(), LibraryError> {
    let (mut member, mut book) = load_pair(store, member_id, book_id)?;

    if member.borrowed_count() > limit {
        tracing::debug!(member_id, held = member.borrowed_count(), limit, "borrow limit reached");
        return Err(LibraryError::LimitReached);
    }
    if member.holds(book_id) {
        tracing::debug!(member_id, book_id, "book already held by member");
        return Err(LibraryError::AlreadyBorrowed);
    }
    if book.amount == 0 {
        tracing::debug!(member_id, book_id, "book out of stock");
        return Err(LibraryError::OutOfStock);
    }

    book.decrement_amount();
    member.add_book(&mut book);
    store.save_book(&book)?;
    store.save_member(&member)?;

    tracing::info!(member_id, book_id, amount = book.amount, "book borrowed");
    Ok(())
}

/// Takes a copy of `book_id` back from `member_id`.
pub fn return_book<S: LibraryStore>(
    store: &mut S,
    member_id: MemberId,
    book_id: BookId,
) -> Result<(), LibraryError> {
    let (mut member, mut book) = load_pair(store, member_id, book_id)?;

    if !member.holds(book_id) {
        tracing::debug!(member_id, book_id, "member does not hold book");
        return Err(LibraryError::NotBorrowed);
    }

    member.remove_book(&mut book);
    book.increment_amount();
    store.save_book(&book)?;
    store.save_member(&member)?;

    tracing::info!(member_id, book_id, amount = book.amount, "book returned");
    Ok(())
}

pub fn borrowed_books_by_member_name<S: LibraryStore>(
    store: &mut S,
    name: &str,
) -> Result<Vec<Book>, LibraryError> {
    store
        .find_member_by_name(name)?
        .map(|member| member.books)
        .ok_or_else(|| LibraryError::MemberNameNotFound(name.to_string()))
}

pub fn borrowed_titles<S: LibraryStore>(store: &mut S) -> Result<Vec<String>, LibraryError> {
    Ok(store.find_all_distinct_borrowed_titles()?)
}

pub fn borrowed_titles_with_count<S: LibraryStore>(
    store: &mut S,
) -> Result<Vec<BorrowedTitle>, LibraryError> {
    Ok(store.find_all_distinct_borrowed_titles_with_count()?)
}

#[derive(Clone)]
pub struct BorrowingService {
    db: Database,
    borrow_limit: usize,
}

impl BorrowingService {
    pub fn new(db: Database, borrow_limit: usize) -> Self {
        Self { db, borrow_limit }
    }

    pub fn borrow_limit(&self) -> usize {
        self.borrow_limit
    }

    pub async fn borrow(&self, member_id: MemberId, book_id: BookId) -> Result<(), LibraryError> {
        let limit = self.borrow_limit;
        self.db
            .transaction(move |tx| borrow(&mut SqliteStore::new(tx), limit, member_id, book_id))
            .await
    }

    pub async fn return_book(
        &self,
        member_id: MemberId,
        book_id: BookId,
    ) -> Result<(), LibraryError> {
        self.db
            .transaction(move |tx| return_book(&mut SqliteStore::new(tx), member_id, book_id))
            .await
    }

    pub async fn borrowed_books_by_member_name(
        &self,
        name: String,
    ) -> Result<Vec<Book>, LibraryError> {
        self.db
            .transaction(move |tx| borrowed_books_by_member_name(&mut SqliteStore::new(tx), &name))
            .await
    }

    pub async fn borrowed_titles(&self) -> Result<Vec<String>, LibraryError> {
        self.db
            .transaction(|tx| borrowed_titles(&mut SqliteStore::new(tx)))
            .await
    }

    pub async fn borrowed_titles_with_count(&self) -> Result<Vec<BorrowedTitle>, LibraryError> {
        self.db
            .transaction(|tx| borrowed_titles_with_count(&mut SqliteStore::new(tx)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use proptest::prelude::*;

    const LIMIT: usize = 10;

    fn book(store: &mut MemoryStore, id: BookId) -> Book {
        store.find_book_by_id(id).unwrap().unwrap()
    }

    fn member(store: &mut MemoryStore, id: MemberId) -> Member {
        store.find_member_by_id(id).unwrap().unwrap()
    }

    #[test]
    fn borrow_moves_a_copy_to_the_member() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 2);
        let ann = store.insert_member("Ann Lee").unwrap();

        borrow(&mut store, LIMIT, ann.id, dune.id).unwrap();

        let dune = book(&mut store, dune.id);
        let ann = member(&mut store, ann.id);
        assert_eq!(dune.amount, 1);
        assert!(dune.members.contains(&ann.id));
        assert!(ann.holds(dune.id));
    }

    #[test]
    fn borrow_reports_missing_book_before_missing_member() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 1);
        let ann = store.insert_member("Ann Lee").unwrap();

        assert!(matches!(
            borrow(&mut store, LIMIT, 99, 98),
            Err(LibraryError::BookNotFound)
        ));
        assert!(matches!(
            borrow(&mut store, LIMIT, 99, dune.id),
            Err(LibraryError::MemberNotFound)
        ));
        assert!(matches!(
            borrow(&mut store, LIMIT, ann.id, 98),
            Err(LibraryError::BookNotFound)
        ));
    }

    #[test]
    fn borrowing_the_same_book_twice_conflicts() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 5);
        let ann = store.insert_member("Ann Lee").unwrap();

        borrow(&mut store, LIMIT, ann.id, dune.id).unwrap();
        let err = borrow(&mut store, LIMIT, ann.id, dune.id).unwrap_err();

        assert!(matches!(err, LibraryError::AlreadyBorrowed));
        assert_eq!(book(&mut store, dune.id).amount, 4);
    }

    #[test]
    fn last_copy_goes_to_the_first_borrower() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 1);
        let ann = store.insert_member("Ann Lee").unwrap();
        let bob = store.insert_member("Bob Ray").unwrap();

        borrow(&mut store, LIMIT, ann.id, dune.id).unwrap();
        assert_eq!(book(&mut store, dune.id).amount, 0);

        let err = borrow(&mut store, LIMIT, bob.id, dune.id).unwrap_err();
        assert!(matches!(err, LibraryError::OutOfStock));
        assert_eq!(err.to_string(), "There are no such books");
        assert!(member(&mut store, bob.id).books.is_empty());
    }

    #[test]
    fn limit_is_checked_before_the_next_borrow() {
        let limit = 2;
        let mut store = MemoryStore::new();
        let ann = store.insert_member("Ann Lee").unwrap();
        let titles = ["Dune", "Emma", "Ulysses", "Walden"];
        let books: Vec<Book> = titles
            .iter()
            .map(|title| store.stock(title, "Some Author", 1))
            .collect();

        for held in &books[..limit] {
            borrow(&mut store, limit, ann.id, held.id).unwrap();
        }

        // Holding exactly `limit` books still allows one more.
        borrow(&mut store, limit, ann.id, books[limit].id).unwrap();
        assert_eq!(member(&mut store, ann.id).borrowed_count(), limit + 1);

        let err = borrow(&mut store, limit, ann.id, books[limit + 1].id).unwrap_err();
        assert!(matches!(err, LibraryError::LimitReached));
        assert_eq!(book(&mut store, books[limit + 1].id).amount, 1);
    }

    #[test]
    fn return_requires_a_held_book() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 1);
        let ann = store.insert_member("Ann Lee").unwrap();

        let err = return_book(&mut store, ann.id, dune.id).unwrap_err();
        assert!(matches!(err, LibraryError::NotBorrowed));
        assert_eq!(book(&mut store, dune.id).amount, 1);

        assert!(matches!(
            return_book(&mut store, ann.id, 77),
            Err(LibraryError::BookNotFound)
        ));
        assert!(matches!(
            return_book(&mut store, 77, dune.id),
            Err(LibraryError::MemberNotFound)
        ));
    }

    #[test]
    fn returned_book_can_be_deleted_again() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 1);
        let ann = store.insert_member("Ann Lee").unwrap();

        borrow(&mut store, LIMIT, ann.id, dune.id).unwrap();
        return_book(&mut store, ann.id, dune.id).unwrap();

        assert!(crate::modules::books::service::delete(&mut store, dune.id).is_ok());
        assert!(crate::modules::members::service::delete(&mut store, ann.id).is_ok());
    }

    #[test]
    fn books_by_member_name() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 1);
        let ann = store.insert_member("Ann Lee").unwrap();
        borrow(&mut store, LIMIT, ann.id, dune.id).unwrap();

        let held = borrowed_books_by_member_name(&mut store, "Ann Lee").unwrap();
        assert_eq!(held.iter().map(|b| b.id).collect::<Vec<_>>(), vec![dune.id]);

        let err = borrowed_books_by_member_name(&mut store, "Nobody Here").unwrap_err();
        assert_eq!(err.to_string(), "No member found with name: Nobody Here");
    }

    #[test]
    fn borrowed_titles_count_distinct_members() {
        let mut store = MemoryStore::new();
        let dune = store.stock("Dune", "Frank Herbert", 3);
        let other_dune = store.stock("Dune", "Brian Herbert", 3);
        store.stock("Emma", "Jane Austen", 3);
        let ann = store.insert_member("Ann Lee").unwrap();
        let bob = store.insert_member("Bob Ray").unwrap();

        borrow(&mut store, LIMIT, ann.id, dune.id).unwrap();
        borrow(&mut store, LIMIT, ann.id, other_dune.id).unwrap();
        borrow(&mut store, LIMIT, bob.id, dune.id).unwrap();

        assert_eq!(borrowed_titles(&mut store).unwrap(), vec!["Dune".to_string()]);
        assert_eq!(
            borrowed_titles_with_count(&mut store).unwrap(),
            vec![BorrowedTitle {
                title: "Dune".to_string(),
                count: 2
            }]
        );
    }

    proptest! {
        #[test]
        fn borrow_then_return_restores_state(stock in 1u32..20, others in 0usize..5, held in 0usize..LIMIT) {
            let mut store = MemoryStore::new();
            let target = store.stock("Dune", "Frank Herbert", stock + others as u32);
            let ann = store.insert_member("Ann Lee").unwrap();

            for i in 0..held {
                let extra = store.stock(&format!("Extra {i}"), "Some Author", 1);
                borrow(&mut store, LIMIT, ann.id, extra.id).unwrap();
            }
            for i in 0..others {
                let other = store.insert_member(&format!("Other {i}")).unwrap();
                borrow(&mut store, LIMIT, other.id, target.id).unwrap();
            }

            let book_before = book(&mut store, target.id);
            let member_before = member(&mut store, ann.id);

            borrow(&mut store, LIMIT, ann.id, target.id).unwrap();
            return_book(&mut store, ann.id, target.id).unwrap();

            let book_after = book(&mut store, target.id);
            let member_after = member(&mut store, ann.id);
            prop_assert_eq!(book_before.amount, book_after.amount);
            prop_assert_eq!(book_before.members, book_after.members);
            prop_assert_eq!(
                member_before.books.iter().map(|b| b.id).collect::<Vec<_>>(),
                member_after.books.iter().map(|b| b.id).collect::<Vec<_>>()
            );
        }

        #[test]
        fn decrement_saturates_at_zero(start in 0u32..3, steps in 0usize..6) {
            let mut store = MemoryStore::new();
            let mut dune = store.stock("Dune", "Frank Herbert", start);
            for _ in 0..steps {
                dune.decrement_amount();
            }
            prop_assert_eq!(dune.amount, start.saturating_sub(steps as u32));
        }
    }
}
