use serde::{Deserialize, Serialize};

/// A borrowed title and how many distinct members hold a copy of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedTitle {
    pub title: String,
    pub count: u64,
}
