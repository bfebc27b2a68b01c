//! In-memory gateway for exercising the lending rules without SQLite.
//!
//! The borrowing relation is kept as two id-indexed maps that are always
//! updated together.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::{LibraryStore, StoreResult};
use crate::modules::books::models::{Book, BookId};
use crate::modules::library::models::BorrowedTitle;
use crate::modules::members::models::{Member, MemberId};

#[derive(Debug, Clone)]
struct BookRow {
    title: String,
    author: String,
    amount: u32,
}

#[derive(Debug, Clone)]
struct MemberRow {
    name: String,
    membership_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    books: BTreeMap<BookId, BookRow>,
    members: BTreeMap<MemberId, MemberRow>,
    books_by_member: BTreeMap<MemberId, BTreeSet<BookId>>,
    members_by_book: BTreeMap<BookId, BTreeSet<MemberId>>,
    next_book_id: BookId,
    next_member_id: MemberId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a book with the given stock.
    pub fn stock(&mut self, title: &str, author: &str, amount: u32) -> Book {
        let mut book = self.insert_book(title, author).unwrap();
        book.amount = amount;
        self.save_book(&book).unwrap()
    }

    fn book(&self, id: BookId) -> Option<Book> {
        self.books.get(&id).map(|row| Book {
            id,
            title: row.title.clone(),
            author: row.author.clone(),
            amount: row.amount,
            members: self.members_by_book.get(&id).cloned().unwrap_or_default(),
        })
    }

    fn member(&self, id: MemberId) -> Option<Member> {
        self.members.get(&id).map(|row| Member {
            id,
            name: row.name.clone(),
            membership_date: row.membership_date,
            books: self
                .books_by_member
                .get(&id)
                .into_iter()
                .flatten()
                .filter_map(|book_id| self.book(*book_id))
                .collect(),
        })
    }

    fn unlink_member(&mut self, member_id: MemberId) {
        for book_id in self.books_by_member.remove(&member_id).unwrap_or_default() {
            if let Some(borrowers) = self.members_by_book.get_mut(&book_id) {
                borrowers.remove(&member_id);
                if borrowers.is_empty() {
                    self.members_by_book.remove(&book_id);
                }
            }
        }
    }
}

impl LibraryStore for MemoryStore {
    fn find_book_by_id(&mut self, id: BookId) -> StoreResult<Option<Book>> {
        Ok(self.book(id))
    }

    fn find_book_by_title_and_author(
        &mut self,
        title: &str,
        author: &str,
    ) -> StoreResult<Option<Book>> {
        let id = self
            .books
            .iter()
            .find(|(_, row)| row.title == title && row.author == author)
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| self.book(id)))
    }

    fn insert_book(&mut self, title: &str, author: &str) -> StoreResult<Book> {
        self.next_book_id += 1;
        let id = self.next_book_id;
        self.books.insert(
            id,
            BookRow {
                title: title.to_string(),
                author: author.to_string(),
                amount: 0,
            },
        );
        Ok(self.book(id).expect("row was just inserted"))
    }

    fn save_book(&mut self, book: &Book) -> StoreResult<Book> {
        if let Some(row) = self.books.get_mut(&book.id) {
            row.title = book.title.clone();
            row.author = book.author.clone();
            row.amount = book.amount;
        }
        self.book(book.id)
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    fn delete_book_by_id(&mut self, id: BookId) -> StoreResult<()> {
        self.books.remove(&id);
        Ok(())
    }

    fn find_member_by_id(&mut self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.member(id))
    }

    fn find_member_by_name(&mut self, name: &str) -> StoreResult<Option<Member>> {
        let id = self
            .members
            .iter()
            .find(|(_, row)| row.name == name)
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| self.member(id)))
    }

    fn insert_member(&mut self, name: &str) -> StoreResult<Member> {
        self.next_member_id += 1;
        let id = self.next_member_id;
        self.members.insert(
            id,
            MemberRow {
                name: name.to_string(),
                membership_date: Utc::now(),
            },
        );
        Ok(self.member(id).expect("row was just inserted"))
    }

    fn save_member(&mut self, member: &Member) -> StoreResult<Member> {
        if let Some(row) = self.members.get_mut(&member.id) {
            row.name = member.name.clone();
        }

        self.unlink_member(member.id);
        let held: BTreeSet<BookId> = member.books.iter().map(|book| book.id).collect();
        for book_id in &held {
            self.members_by_book
                .entry(*book_id)
                .or_default()
                .insert(member.id);
        }
        if !held.is_empty() {
            self.books_by_member.insert(member.id, held);
        }

        self.member(member.id)
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    fn delete_member_by_id(&mut self, id: MemberId) -> StoreResult<()> {
        self.unlink_member(id);
        self.members.remove(&id);
        Ok(())
    }

    fn find_all_distinct_borrowed_titles(&mut self) -> StoreResult<Vec<String>> {
        Ok(self
            .find_all_distinct_borrowed_titles_with_count()?
            .into_iter()
            .map(|entry| entry.title)
            .collect())
    }

    fn find_all_distinct_borrowed_titles_with_count(&mut self) -> StoreResult<Vec<BorrowedTitle>> {
        let mut by_title: BTreeMap<&str, BTreeSet<MemberId>> = BTreeMap::new();
        for (book_id, borrowers) in &self.members_by_book {
            if let Some(row) = self.books.get(book_id) {
                by_title
                    .entry(row.title.as_str())
                    .or_default()
                    .extend(borrowers.iter().copied());
            }
        }

        Ok(by_title
            .into_iter()
            .map(|(title, members)| BorrowedTitle {
                title: title.to_string(),
                count: members.len() as u64,
            })
            .collect())
    }
}
