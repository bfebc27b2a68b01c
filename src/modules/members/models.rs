use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::books::models::{Book, BookId};
use crate::utils::validation::{not_blank, Validate, ValidationErrors};

pub type MemberId = i64;

/// A library member with the books they currently hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier for the member
    pub id: MemberId,
    /// Member's full name
    pub name: String,
    /// When the member joined; assigned by storage
    pub membership_date: DateTime<Utc>,
    /// Books currently borrowed
    pub books: Vec<Book>,
}

impl Member {
    pub fn holds(&self, book_id: BookId) -> bool {
        self.books.iter().any(|book| book.id == book_id)
    }

    pub fn borrowed_count(&self) -> usize {
        self.books.len()
    }

    /// Links both sides of the relation.
    pub fn add_book(&mut self, book: &mut Book) {
        book.members.insert(self.id);
        if !self.holds(book.id) {
            self.books.push(book.clone());
        }
    }

    /// Unlinks both sides of the relation.
    pub fn remove_book(&mut self, book: &mut Book) {
        book.members.remove(&self.id);
        self.books.retain(|held| held.id != book.id);
    }
}

/// Request body for adding or renaming a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPayload {
    /// Member's full name
    pub name: String,
}

impl Validate for MemberPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.push(not_blank("name", &self.name));
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn add_and_remove_keep_both_sides_in_step() {
        let mut member = Member {
            id: 3,
            name: "Ann Lee".to_string(),
            membership_date: Utc::now(),
            books: Vec::new(),
        };
        let mut book = Book {
            id: 9,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            amount: 1,
            members: BTreeSet::new(),
        };

        member.add_book(&mut book);
        member.add_book(&mut book);
        assert!(member.holds(9));
        assert_eq!(member.borrowed_count(), 1);
        assert!(book.members.contains(&3));

        member.remove_book(&mut book);
        assert!(!member.holds(9));
        assert!(!book.is_borrowed());
    }
}
