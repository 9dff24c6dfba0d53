//! Storage layer for phonebook.
//!
//! This module provides `SQLite`-based persistent storage for contacts.
//! Every write runs the field validation rules before touching the database.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::contact::{Contact, ContactId, ContactInput};
use crate::error::{Error, Result};
use crate::validation;

/// Path reported for in-memory databases.
pub const MEMORY_PATH: &str = ":memory:";

/// Storage engine for contacts.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate and insert a new contact, assigning it an id.
    ///
    /// Duplicate names and numbers are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the input is rejected, or an error if
    /// the database operation fails.
    pub fn insert(&self, input: &ContactInput) -> Result<Contact> {
        let fields = validation::validate(input)?;
        let contact = Contact::new(ContactId::generate(), fields);

        self.conn.execute(
            "INSERT INTO contacts (id, name, number) VALUES (?1, ?2, ?3)",
            params![contact.id.as_str(), contact.name, contact.number],
        )?;

        debug!("Inserted contact with id {}", contact.id);
        Ok(contact)
    }

    /// Get every contact in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, number FROM contacts ORDER BY rowid ASC")?;

        let contacts = stmt
            .query_map([], Self::row_to_contact)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(contacts)
    }

    /// Get a contact by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: &ContactId) -> Result<Option<Contact>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, number FROM contacts WHERE id = ?1",
                [id.as_str()],
                Self::row_to_contact,
            )
            .optional()?;
        Ok(result)
    }

    /// Replace both fields of an existing contact.
    ///
    /// Returns the updated contact, or `None` if no contact has this id.
    /// Validation runs before the lookup, so an invalid body is reported
    /// even for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the input is rejected, or an error if
    /// the database operation fails.
    pub fn update(&self, id: &ContactId, input: &ContactInput) -> Result<Option<Contact>> {
        let fields = validation::validate(input)?;

        let affected = self.conn.execute(
            "UPDATE contacts SET name = ?1, number = ?2 WHERE id = ?3",
            params![fields.name, fields.number, id.as_str()],
        )?;

        if affected == 0 {
            debug!("No contact with id {} to update", id);
            return Ok(None);
        }
        Ok(Some(Contact::new(id.clone(), fields)))
    }

    /// Delete a contact by id.
    ///
    /// Returns `true` if a contact was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: &ContactId) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1", [id.as_str()])?;
        Ok(affected > 0)
    }

    /// Count stored contacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| Error::internal(format!("negative row count {count}")))
    }

    fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
        let id: String = row.get(0)?;
        let id = ContactId::parse(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Contact {
            id,
            name: row.get(1)?,
            number: row.get(2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn ada() -> ContactInput {
        ContactInput::new("Ada", "12-345-6789")
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path(), Path::new(MEMORY_PATH));
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let created = storage.insert(&ada()).unwrap();

        let retrieved = storage.get(&created.id).unwrap().unwrap();
        assert_eq!(retrieved, created);
        assert_eq!(retrieved.name, "Ada");
        assert_eq!(retrieved.number, "12-345-6789");
    }

    #[test]
    fn test_insert_allows_duplicates() {
        let storage = create_test_storage();
        let first = storage.insert(&ada()).unwrap();
        let second = storage.insert(&ada()).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_insert_rejects_invalid_number() {
        let storage = create_test_storage();
        let err = storage
            .insert(&ContactInput::new("Ada", "12345"))
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        let id = ContactId::generate();
        assert!(storage.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let storage = create_test_storage();
        let names = ["Arto Hellas", "Ada Lovelace", "Dan Abramov"];
        for name in names {
            storage
                .insert(&ContactInput::new(name, "040-123456"))
                .unwrap();
        }

        let listed: Vec<_> = storage
            .list()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_list_empty() {
        let storage = create_test_storage();
        assert!(storage.list().unwrap().is_empty());
    }

    #[test]
    fn test_update_replaces_both_fields() {
        let storage = create_test_storage();
        let created = storage.insert(&ada()).unwrap();

        let updated = storage
            .update(&created.id, &ContactInput::new("Ada L.", "39-44-5323523"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ada L.");

        let fetched = storage.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[test]
    fn test_update_nonexistent_returns_none() {
        let storage = create_test_storage();
        let result = storage.update(&ContactId::generate(), &ada()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_update_requires_both_fields() {
        let storage = create_test_storage();
        let created = storage.insert(&ada()).unwrap();

        let partial = ContactInput {
            name: Some("Only Name".to_string()),
            number: None,
        };
        let err = storage.update(&created.id, &partial).unwrap_err();
        assert!(err.is_validation());

        let unchanged = storage.get(&created.id).unwrap().unwrap();
        assert_eq!(unchanged, created);
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let created = storage.insert(&ada()).unwrap();

        assert!(storage.delete(&created.id).unwrap());
        assert!(storage.get(&created.id).unwrap().is_none());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_nonexistent() {
        let storage = create_test_storage();
        assert!(!storage.delete(&ContactId::generate()).unwrap());
    }

    #[test]
    fn test_unicode_content() {
        let storage = create_test_storage();
        let created = storage
            .insert(&ContactInput::new("Åsa Öberg 日本", "09-1234567"))
            .unwrap();
        let fetched = storage.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Åsa Öberg 日本");
    }

    #[test]
    fn test_open_file_based() {
        let temp_dir = std::env::temp_dir();
        let db_path = temp_dir.join(format!("phonebook_test_{}.db", std::process::id()));

        let storage = Storage::open(&db_path).unwrap();
        let created = storage.insert(&ada()).unwrap();
        assert_eq!(storage.path(), db_path);
        drop(storage);

        // Reopening sees the persisted contact.
        let storage = Storage::open(&db_path).unwrap();
        assert_eq!(storage.get(&created.id).unwrap().unwrap().name, "Ada");

        drop(storage);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = std::env::temp_dir();
        let root = temp_dir.join(format!("phonebook_test_dirs_{}", std::process::id()));
        let nested_path = root.join("nested/db.sqlite");
        let _ = std::fs::remove_dir_all(&root);

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(storage);
        let _ = std::fs::remove_dir_all(&root);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use proptest::test_runner::Config;

        proptest! {
            #![proptest_config(Config::with_cases(64))]
            #[test]
            fn insert_then_get_keeps_fields(
                name in "[A-Za-z\u{c0}-\u{17f}][A-Za-z\u{c0}-\u{17f} .'-]{0,40}",
                number in "[0-9]{2,3}-[0-9]{5,8}(-[0-9]{1,4}){0,2}"
            ) {
                let storage = create_test_storage();
                let created = storage
                    .insert(&ContactInput::new(name.clone(), number.clone()))
                    .expect("valid contact");

                let fetched = storage.get(&created.id).unwrap().expect("stored contact");
                prop_assert_eq!(&fetched.name, &name);
                prop_assert_eq!(&fetched.number, &number);
                prop_assert_eq!(fetched, created);
            }
        }
    }
}
