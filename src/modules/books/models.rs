use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::modules::members::models::MemberId;
use crate::utils::validation::{
    first_capital_letter, min_chars, two_capitalized_words, Validate, ValidationErrors,
    TITLE_TOO_SHORT,
};

pub type BookId = i64;

/// A title in the catalogue together with its shelf stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    pub id: BookId,
    /// Title of the book
    pub title: String,
    /// Author of the book, "Name Surname"
    pub author: String,
    /// Copies currently on the shelf
    pub amount: u32,
    /// Members currently holding a copy. Derived from the borrowing relation,
    /// never accepted from or shown to clients.
    #[serde(skip)]
    pub members: BTreeSet<MemberId>,
}

impl Book {
    /// Puts one copy back on the shelf; saturates at `u32::MAX`.
    pub fn increment_amount(&mut self) {
        match self.amount.checked_add(1) {
            Some(amount) => self.amount = amount,
            None => tracing::error!(book_id = self.id, "book stock counter saturated"),
        }
    }

    /// Takes one copy off the shelf; stays at zero when none are left.
    pub fn decrement_amount(&mut self) {
        if self.amount == 0 {
            return;
        }
        self.amount -= 1;
    }

    pub fn is_borrowed(&self) -> bool {
        !self.members.is_empty()
    }
}

/// Request body for adding or updating a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPayload {
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
}

impl Validate for BookPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.push(min_chars("title", &self.title, 3, TITLE_TOO_SHORT));
        errors.push(first_capital_letter("title", &self.title));
        errors.push(two_capitalized_words("author", &self.author));
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(amount: u32) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            amount,
            members: BTreeSet::new(),
        }
    }

    #[test]
    fn decrement_saturates_at_zero() {
        let mut empty = book(0);
        empty.decrement_amount();
        assert_eq!(empty.amount, 0);

        let mut stocked = book(2);
        stocked.decrement_amount();
        assert_eq!(stocked.amount, 1);
    }

    #[test]
    fn increment_is_unconditional() {
        let mut b = book(0);
        b.increment_amount();
        b.increment_amount();
        assert_eq!(b.amount, 2);
    }

    #[test]
    fn increment_saturates_instead_of_overflowing() {
        let mut b = book(u32::MAX);
        b.increment_amount();
        assert_eq!(b.amount, u32::MAX);
    }

    #[test]
    fn borrowers_are_not_serialized() {
        let mut b = book(1);
        b.members.insert(7);

        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "title": "Dune", "author": "Frank Herbert", "amount": 1})
        );
    }

    #[test]
    fn payload_validation_collects_every_field() {
        let ok = BookPayload {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = BookPayload {
            title: "du".to_string(),
            author: "frank".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields: Vec<_> = errors.0.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "title", "author"]);
    }
}
