//! `phonebook` - a small contact book served over HTTP
//!
//! This library provides the contact model, its validation rules, the record
//! stores, and the axum router that exposes them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod contact;
pub mod error;
pub mod http;
pub mod logging;
pub mod server;
pub mod storage;
pub mod store;
pub mod validation;

pub use config::Config;
pub use contact::{Contact, ContactId, ContactInput};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use server::Server;
pub use storage::Storage;
pub use store::{open_store, ContactStore, MemoryContactStore, SqliteContactStore};
