//! In-process [`ContactStore`], used by tests and throwaway servers.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::contact::{Contact, ContactId, ContactInput};
use crate::error::Result;
use crate::validation;

use super::ContactStore;

/// Contacts kept in a vector, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryContactStore {
    contacts: RwLock<Vec<Contact>>,
}

impl MemoryContactStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, input: ContactInput) -> Result<Contact> {
        let fields = validation::validate(&input)?;
        let contact = Contact::new(ContactId::generate(), fields);
        self.contacts.write().await.push(contact.clone());
        Ok(contact)
    }

    async fn find_all(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Contact>> {
        let id = ContactId::parse(id)?;
        let contacts = self.contacts.read().await;
        Ok(contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn update_by_id(&self, id: &str, input: ContactInput) -> Result<Option<Contact>> {
        let id = ContactId::parse(id)?;
        let fields = validation::validate(&input)?;

        let mut contacts = self.contacts.write().await;
        Ok(contacts.iter_mut().find(|c| c.id == id).map(|contact| {
            contact.name = fields.name;
            contact.number = fields.number;
            contact.clone()
        }))
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let id = ContactId::parse(id)?;
        let mut contacts = self.contacts.write().await;
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        Ok(contacts.len() < before)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.contacts.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crud_cycle() {
        let store = MemoryContactStore::new();
        let created = store
            .insert(ContactInput::new("Ada", "12-345-6789"))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let updated = store
            .update_by_id(created.id.as_str(), ContactInput::new("Grace", "39-23-6423122"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Grace");
        assert_eq!(
            store.find_by_id(created.id.as_str()).await.unwrap(),
            Some(updated)
        );

        assert!(store.delete_by_id(created.id.as_str()).await.unwrap());
        assert!(!store.delete_by_id(created.id.as_str()).await.unwrap());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_write_is_not_stored() {
        let store = MemoryContactStore::new();
        let err = store
            .insert(ContactInput::new("Ada", "123"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemoryContactStore::new();
        let id = ContactId::generate();
        let result = store
            .update_by_id(id.as_str(), ContactInput::new("Ada", "12-345-6789"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_all_keeps_insertion_order() {
        let store = MemoryContactStore::new();
        for name in ["a", "b", "c"] {
            store
                .insert(ContactInput::new(name, "12-3456789"))
                .await
                .unwrap();
        }
        let names: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use proptest::test_runner::Config;

        proptest! {
            #![proptest_config(Config::with_cases(64))]
            #[test]
            fn insert_then_find_keeps_fields(
                name in "[A-Za-z\u{c0}-\u{17f}][A-Za-z\u{c0}-\u{17f} .'-]{0,40}",
                number in "[0-9]{2,3}-[0-9]{5,8}(-[0-9]{1,4}){0,2}"
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .expect("test runtime");
                let store = MemoryContactStore::new();

                let (created, fetched) = runtime.block_on(async {
                    let created = store
                        .insert(ContactInput::new(name.clone(), number.clone()))
                        .await
                        .expect("valid contact");
                    let fetched = store.find_by_id(created.id.as_str()).await.unwrap();
                    (created, fetched)
                });

                let fetched = fetched.expect("stored contact");
                prop_assert_eq!(&fetched.name, &name);
                prop_assert_eq!(&fetched.number, &number);
                prop_assert_eq!(fetched, created);
            }
        }
    }
}
