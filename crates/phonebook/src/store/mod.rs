//! The record store contract and its implementations.
//!
//! Handlers only see [`ContactStore`]. Every implementation parses ids
//! itself (so a malformed id surfaces as [`Error::MalformedId`]) and runs
//! the validation rules on every write.

mod memory;
mod sqlite;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::contact::{Contact, ContactInput};
use crate::error::{Error, Result};

pub use memory::MemoryContactStore;
pub use sqlite::SqliteContactStore;

/// Asynchronous access to stored contacts.
#[async_trait]
pub trait ContactStore: Send + Sync + fmt::Debug {
    /// Short name of the backend, for logs.
    fn backend(&self) -> &'static str;

    /// Validate and persist a new contact, assigning its id.
    async fn insert(&self, input: ContactInput) -> Result<Contact>;

    /// All contacts in the store's natural order.
    async fn find_all(&self) -> Result<Vec<Contact>>;

    /// The contact with this id, if any.
    async fn find_by_id(&self, id: &str) -> Result<Option<Contact>>;

    /// Validate and replace both fields of the contact with this id.
    ///
    /// Returns `None` when the id is well formed but unknown.
    async fn update_by_id(&self, id: &str, input: ContactInput) -> Result<Option<Contact>>;

    /// Remove the contact with this id, returning whether one existed.
    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    /// Number of stored contacts.
    async fn count(&self) -> Result<usize>;
}

/// Where contacts live, parsed from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Process-local store with no persistence.
    Memory,
    /// `SQLite` database held in memory.
    SqliteMemory,
    /// `SQLite` database file.
    SqliteFile(PathBuf),
}

impl StoreLocation {
    /// Parse a connection string.
    ///
    /// Accepts `memory`, `:memory:`, `sqlite::memory:`, `sqlite://<path>`,
    /// `sqlite:<path>` or a bare file path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty string.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::ConfigValidation {
                message: "database_url must not be empty".to_string(),
            });
        }

        let location = match url {
            "memory" => Self::Memory,
            ":memory:" | "sqlite::memory:" | "sqlite://:memory:" => Self::SqliteMemory,
            _ => {
                let path = url
                    .strip_prefix("sqlite://")
                    .or_else(|| url.strip_prefix("sqlite:"))
                    .unwrap_or(url);
                Self::SqliteFile(PathBuf::from(path))
            }
        };
        Ok(location)
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::SqliteMemory => write!(f, "sqlite::memory:"),
            Self::SqliteFile(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}

/// Open the store named by a connection string.
///
/// # Errors
///
/// Returns an error if the string is invalid or the database cannot be opened.
pub fn open_store(url: &str) -> Result<Arc<dyn ContactStore>> {
    let store: Arc<dyn ContactStore> = match StoreLocation::parse(url)? {
        StoreLocation::Memory => Arc::new(MemoryContactStore::new()),
        StoreLocation::SqliteMemory => Arc::new(SqliteContactStore::open_in_memory()?),
        StoreLocation::SqliteFile(path) => Arc::new(SqliteContactStore::open(path)?),
    };
    Ok(store)
}
