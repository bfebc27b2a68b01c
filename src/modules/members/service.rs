//! Member lifecycle: create, fetch, rename and delete.

use libris_db::Database;

use super::models::{Member, MemberId, MemberPayload};
use crate::error::LibraryError;
use crate::store::{LibraryStore, SqliteStore};

pub fn create<S: LibraryStore>(store: &mut S, name: &str) -> Result<Member, LibraryError> {
    let member = store.insert_member(name)?;
    tracing::info!(member_id = member.id, "member registered");
    Ok(member)
}

pub fn fetch<S: LibraryStore>(store: &mut S, id: MemberId) -> Result<Member, LibraryError> {
    store.find_member_by_id(id)?.ok_or(LibraryError::MemberNotFound)
}

/// Overwrites the name only; borrowed books are untouched.
pub fn update<S: LibraryStore>(
    store: &mut S,
    id: MemberId,
    name: &str,
) -> Result<Member, LibraryError> {
    let mut member = fetch(store, id)?;
    member.name = name.to_string();
    let member = store.save_member(&member)?;

    tracing::info!(member_id = id, "member updated");
    Ok(member)
}

pub fn delete<S: LibraryStore>(store: &mut S, id: MemberId) -> Result<(), LibraryError> {
    let member = fetch(store, id)?;
    if member.borrowed_count() > 0 {
        tracing::debug!(member_id = id, held = member.borrowed_count(), "refusing to delete member holding books");
        return Err(LibraryError::MemberHasBooks);
    }

    store.delete_member_by_id(id)?;
    tracing::info!(member_id = id, "member deleted");
    Ok(())
}

#[derive(Clone)]
pub struct MemberService {
    db: Database,
}

impl MemberService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, payload: MemberPayload) -> Result<Member, LibraryError> {
        self.db
            .transaction(move |tx| create(&mut SqliteStore::new(tx), &payload.name))
            .await
    }

    pub async fn fetch(&self, id: MemberId) -> Result<Member, LibraryError> {
        self.db
            .transaction(move |tx| fetch(&mut SqliteStore::new(tx), id))
            .await
    }

    pub async fn update(&self, id: MemberId, payload: MemberPayload) -> Result<Member, LibraryError> {
        self.db
            .transaction(move |tx| update(&mut SqliteStore::new(tx), id, &payload.name))
            .await
    }

    pub async fn delete(&self, id: MemberId) -> Result<(), LibraryError> {
        self.db
            .transaction(move |tx| delete(&mut SqliteStore::new(tx), id))
            .await
    }
}
