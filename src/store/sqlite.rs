//! SQLite implementation of the persistence gateway.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

use super::{LibraryStore, StoreResult};
use crate::modules::books::models::{Book, BookId};
use crate::modules::library::models::BorrowedTitle;
use crate::modules::members::models::{Member, MemberId};

const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Gateway bound to one open transaction.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn borrowers(&self, book_id: BookId) -> StoreResult<BTreeSet<MemberId>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT member_id FROM borrowings WHERE book_id = ?1")?;
        let ids = stmt
            .query_map(params![book_id], |row| row.get(0))?
            .collect::<Result<BTreeSet<MemberId>, _>>()?;
        Ok(ids)
    }

    fn borrowed_books(&self, member_id: MemberId) -> StoreResult<Vec<Book>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT b.id, b.title, b.author, b.amount
               FROM books b
               JOIN borrowings br ON br.book_id = b.id
              WHERE br.member_id = ?1
              ORDER BY b.id",
        )?;
        let rows = stmt
            .query_map(params![member_id], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|mut book| -> StoreResult<Book> {
                book.members = self.borrowers(book.id)?;
                Ok(book)
            })
            .collect()
    }

    fn hydrate_member(&self, member: Option<Member>) -> StoreResult<Option<Member>> {
        match member {
            Some(mut member) => {
                member.books = self.borrowed_books(member.id)?;
                Ok(Some(member))
            }
            None => Ok(None),
        }
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        amount: row.get(3)?,
        members: BTreeSet::new(),
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    let raw: String = row.get(2)?;
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        membership_date: parse_timestamp(&raw)
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(err)))?,
        books: Vec::new(),
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, SQLITE_TIMESTAMP).map(|naive| naive.and_utc())
}

impl LibraryStore for SqliteStore<'_> {
    fn find_book_by_id(&mut self, id: BookId) -> StoreResult<Option<Book>> {
        let book = self
            .conn
            .query_row(
                "SELECT id, title, author, amount FROM books WHERE id = ?1",
                params![id],
                book_from_row,
            )
            .optional()?;

        match book {
            Some(mut book) => {
                book.members = self.borrowers(book.id)?;
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    fn find_book_by_title_and_author(
        &mut self,
        title: &str,
        author: &str,
    ) -> StoreResult<Option<Book>> {
        let id: Option<BookId> = self
            .conn
            .query_row(
                "SELECT id FROM books WHERE title = ?1 AND author = ?2",
                params![title, author],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => self.find_book_by_id(id),
            None => Ok(None),
        }
    }

    fn insert_book(&mut self, title: &str, author: &str) -> StoreResult<Book> {
        self.conn.execute(
            "INSERT INTO books (title, author, amount) VALUES (?1, ?2, 0)",
            params![title, author],
        )?;

        Ok(Book {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            author: author.to_string(),
            amount: 0,
            members: BTreeSet::new(),
        })
    }

    fn save_book(&mut self, book: &Book) -> StoreResult<Book> {
        self.conn.execute(
            "UPDATE books SET title = ?1, author = ?2, amount = ?3 WHERE id = ?4",
            params![book.title, book.author, book.amount, book.id],
        )?;

        self.find_book_by_id(book.id)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    fn delete_book_by_id(&mut self, id: BookId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM books WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn find_member_by_id(&mut self, id: MemberId) -> StoreResult<Option<Member>> {
        let member = self
            .conn
            .query_row(
                "SELECT id, name, membership_date FROM members WHERE id = ?1",
                params![id],
                member_from_row,
            )
            .optional()?;
        self.hydrate_member(member)
    }

    fn find_member_by_name(&mut self, name: &str) -> StoreResult<Option<Member>> {
        let member = self
            .conn
            .query_row(
                "SELECT id, name, membership_date FROM members WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                member_from_row,
            )
            .optional()?;
        self.hydrate_member(member)
    }

    fn insert_member(&mut self, name: &str) -> StoreResult<Member> {
        self.conn
            .execute("INSERT INTO members (name) VALUES (?1)", params![name])?;
        let id = self.conn.last_insert_rowid();

        self.find_member_by_id(id)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    fn save_member(&mut self, member: &Member) -> StoreResult<Member> {
        self.conn.execute(
            "UPDATE members SET name = ?1 WHERE id = ?2",
            params![member.name, member.id],
        )?;
        self.conn.execute(
            "DELETE FROM borrowings WHERE member_id = ?1",
            params![member.id],
        )?;

        let mut insert = self
            .conn
            .prepare_cached("INSERT INTO borrowings (member_id, book_id) VALUES (?1, ?2)")?;
        for book in &member.books {
            insert.execute(params![member.id, book.id])?;
        }

        self.find_member_by_id(member.id)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    fn delete_member_by_id(&mut self, id: MemberId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM borrowings WHERE member_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM members WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn find_all_distinct_borrowed_titles(&mut self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT b.title
               FROM books b
               JOIN borrowings br ON br.book_id = b.id
              ORDER BY b.title",
        )?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(titles)
    }

    fn find_all_distinct_borrowed_titles_with_count(&mut self) -> StoreResult<Vec<BorrowedTitle>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT b.title, COUNT(DISTINCT br.member_id)
               FROM books b
               JOIN borrowings br ON br.book_id = b.id
              GROUP BY b.title
              ORDER BY b.title",
        )?;
        let titles = stmt
            .query_map([], |row| {
                Ok(BorrowedTitle {
                    title: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }
}
