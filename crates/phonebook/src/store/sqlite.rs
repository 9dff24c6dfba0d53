//! [`ContactStore`] backed by the `SQLite` [`Storage`] engine.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::contact::{Contact, ContactId, ContactInput};
use crate::error::{Error, Result};
use crate::storage::Storage;

use super::ContactStore;

/// Shares one connection between requests.
///
/// Each call takes the lock on the blocking pool so the runtime's worker
/// threads never wait on disk I/O.
#[derive(Debug, Clone)]
pub struct SqliteContactStore {
    storage: Arc<Mutex<Storage>>,
}

impl SqliteContactStore {
    /// Wrap an open storage engine.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Open a database file, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Storage::open(path)?))
    }

    /// Open a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Storage::open_in_memory()?))
    }

    async fn with_storage<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| Error::internal("storage lock poisoned"))?;
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, input: ContactInput) -> Result<Contact> {
        self.with_storage(move |storage| storage.insert(&input)).await
    }

    async fn find_all(&self) -> Result<Vec<Contact>> {
        self.with_storage(Storage::list).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Contact>> {
        let id = ContactId::parse(id)?;
        self.with_storage(move |storage| storage.get(&id)).await
    }

    async fn update_by_id(&self, id: &str, input: ContactInput) -> Result<Option<Contact>> {
        let id = ContactId::parse(id)?;
        self.with_storage(move |storage| storage.update(&id, &input))
            .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let id = ContactId::parse(id)?;
        self.with_storage(move |storage| storage.delete(&id)).await
    }

    async fn count(&self) -> Result<usize> {
        self.with_storage(Storage::count).await
    }
}
