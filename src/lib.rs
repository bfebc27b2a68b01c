//! Libris application library
//!
//! Domain modules (books, members, lending), the persistence gateway they
//! share and the bootstrap that wires them into the HTTP server.

pub mod app;
pub mod error;
pub mod modules;
pub mod store;
pub mod utils;

pub use app::App;
pub use error::{ErrorKind, LibraryError};
