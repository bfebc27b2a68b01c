//! SQLite connection factory, migration runner and transaction helpers.
//!
//! A [`Database`] owns one connection behind a mutex. Every unit of work runs
//! inside a single transaction that commits only when the closure returns
//! `Ok`; dropping the transaction on the error path rolls it back.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use thiserror::Error;

/// Path value that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Schema change contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Storage failures. None of these are recoverable by the caller.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking database task failed: {0}")]
    Task(String),

    #[error("migration '{module}/{id}' failed: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Shared handle to the service database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path`. `:memory:` opens an
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self, DbError> {
        if path == IN_MEMORY {
            return Self::open_in_memory();
        }

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        tracing::info!(target: "libris-db", %path, "database opened");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                module     TEXT NOT NULL,
                id         TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (module, id)
            );
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Apply every migration that has not been recorded yet, in the given
    /// order. Returns the number of migrations applied.
    pub fn migrate(&self, migrations: &[(String, Migration)]) -> Result<usize, DbError> {
        self.with_transaction(|tx| {
            let mut applied = 0;

            for (module, migration) in migrations {
                let done: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE module = ?1 AND id = ?2)",
                    params![module, migration.id],
                    |row| row.get(0),
                )?;
                if done {
                    continue;
                }

                tx.execute_batch(migration.up)
                    .map_err(|source| DbError::Migration {
                        module: module.clone(),
                        id: migration.id.to_string(),
                        source,
                    })?;
                tx.execute(
                    "INSERT INTO schema_migrations (module, id) VALUES (?1, ?2)",
                    params![module, migration.id],
                )?;

                tracing::info!(target: "libris-db", %module, id = migration.id, "migration applied");
                applied += 1;
            }

            Ok(applied)
        })
    }

    /// Run `f` inside an immediate transaction on the calling thread.
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        // A panic mid-transaction poisons the lock; the dropped transaction
        // has already rolled back, so the connection is still consistent.
        let mut conn = self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(target: "libris-db", "recovering connection after a panicked transaction");
            PoisonError::into_inner(poisoned)
        });
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;

        let out = f(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(out)
    }

    /// Run `f` inside an immediate transaction on the blocking thread pool.
    pub async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        let db = self.clone();
        match tokio::task::spawn_blocking(move || db.with_transaction(f)).await {
            Ok(result) => result,
            Err(err) => Err(E::from(DbError::Task(err.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widgets() -> Vec<(String, Migration)> {
        vec![(
            "widgets".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            },
        )]
    }

    fn count(db: &Database) -> i64 {
        db.with_transaction(|tx| {
            tx.query_row("SELECT COUNT(*) FROM widgets", [], |row| row.get(0))
                .map_err(DbError::from)
        })
        .unwrap()
    }

    #[test]
    fn migrations_apply_once() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.migrate(&widgets()).unwrap(), 1);
        assert_eq!(db.migrate(&widgets()).unwrap(), 0);
    }

    #[test]
    fn broken_migration_reports_its_id() {
        let db = Database::open_in_memory().unwrap();
        let broken = vec![(
            "widgets".to_string(),
            Migration {
                id: "002_oops",
                up: "CREATE TABLE;",
            },
        )];

        let err = db.migrate(&broken).unwrap_err();
        assert!(matches!(err, DbError::Migration { ref id, .. } if id == "002_oops"));
    }

    #[test]
    fn error_rolls_back_the_transaction() {
        let db = Database::open_in_memory().unwrap();
        db.migrate(&widgets()).unwrap();

        let result: Result<(), DbError> = db.with_transaction(|tx| {
            tx.execute("INSERT INTO widgets (name) VALUES ('gear')", [])?;
            Err(DbError::Task("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn panic_inside_a_transaction_does_not_wedge_the_connection() {
        let db = Database::open_in_memory().unwrap();
        db.migrate(&widgets()).unwrap();

        let worker = db.clone();
        let outcome = std::thread::spawn(move || {
            worker.with_transaction::<(), DbError, _>(|tx| {
                tx.execute("INSERT INTO widgets (name) VALUES ('gear')", [])?;
                panic!("closure failed mid-transaction");
            })
        })
        .join();
        assert!(outcome.is_err());

        assert_eq!(count(&db), 0);
        db.with_transaction(|tx| {
            tx.execute("INSERT INTO widgets (name) VALUES ('cog')", [])
                .map_err(DbError::from)
        })
        .unwrap();
        assert_eq!(count(&db), 1);
    }

    #[tokio::test]
    async fn async_transaction_commits() {
        let db = Database::open_in_memory().unwrap();
        db.migrate(&widgets()).unwrap();

        db.transaction(|tx| {
            tx.execute("INSERT INTO widgets (name) VALUES ('gear')", [])
                .map_err(DbError::from)
        })
        .await
        .unwrap();

        assert_eq!(count(&db), 1);
    }
}
