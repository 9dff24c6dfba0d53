//! Core contact types for phonebook.
//!
//! This module defines the stored [`Contact`], the request body
//! [`ContactInput`], and the store-assigned [`ContactId`].

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of raw bytes in an identifier.
const ID_BYTES: usize = 12;

/// Length of the hex encoded identifier.
pub const ID_HEX_LEN: usize = ID_BYTES * 2;

/// Identifier assigned to a contact by the store.
///
/// Twelve bytes rendered as 24 lowercase hex characters: a 4-byte
/// big-endian creation time in seconds, a 5-byte per-process value and a
/// 3-byte counter. Anything else is rejected by [`ContactId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactId(String);

impl ContactId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or_default();
        let process = process_bytes();
        let count = counter().fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&process[..5]);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Parse an identifier, checking only its shape.
    ///
    /// Upper case hex is accepted and normalized to lower case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedId`] if `value` is not 24 hex characters.
    pub fn parse(value: &str) -> Result<Self> {
        if value.len() == ID_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(Error::malformed_id(value))
        }
    }

    /// The identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-process bytes, derived once from the pid and the start time.
fn process_bytes() -> &'static [u8; 8] {
    static PROCESS: OnceLock<[u8; 8]> = OnceLock::new();
    PROCESS.get_or_init(|| {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&std::process::id().to_le_bytes());
        hasher.update(
            &Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_le_bytes(),
        );
        let hash = hasher.finalize();
        let mut out = [0u8; 8];
        out.copy_from_slice(&hash.as_bytes()[..8]);
        out
    })
}

fn counter() -> &'static AtomicU32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let seed = process_bytes();
        AtomicU32::new(u32::from_be_bytes([0, seed[5], seed[6], seed[7]]))
    })
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContactId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContactId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContactId> for String {
    fn from(id: ContactId) -> Self {
        id.0
    }
}

/// A stored phonebook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Store-assigned identifier.
    pub id: ContactId,
    /// Display name.
    pub name: String,
    /// Phone number, as submitted.
    pub number: String,
}

impl Contact {
    /// Build a contact from an id and validated fields.
    #[must_use]
    pub fn new(id: ContactId, fields: ContactFields) -> Self {
        Self {
            id,
            name: fields.name,
            number: fields.number,
        }
    }
}

/// Body of a create or update request.
///
/// Both fields are optional at this layer so that the handler can tell a
/// missing `name` apart from one that fails validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInput {
    /// Submitted name.
    #[serde(default)]
    pub name: Option<String>,
    /// Submitted number.
    #[serde(default)]
    pub number: Option<String>,
}

impl ContactInput {
    /// Convenience constructor with both fields present.
    #[must_use]
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            number: Some(number.into()),
        }
    }
}

/// Fields that passed validation and are ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    /// Validated name.
    pub name: String,
    /// Validated number.
    pub number: String,
}
