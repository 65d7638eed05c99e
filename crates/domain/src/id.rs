// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Time-ordered entity identifiers.
//!
//! An identifier is 12 bytes rendered as 24 lowercase hex characters:
//!
//! - 4 bytes: big-endian unix seconds at generation time
//! - 5 bytes: random value fixed for the lifetime of the process
//! - 3 bytes: big-endian counter, incremented per generated identifier
//!
//! Because every component is big-endian and the hex form has a fixed
//! width, comparing two identifiers as strings gives their creation order.
//! Storage and pagination both rely on this.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use time::OffsetDateTime;

/// Number of raw bytes in an identifier.
const ID_BYTES: usize = 12;

/// Per-process counter mixed into every identifier.
static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Globally unique, time-ordered, opaque entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Generates a new identifier stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(OffsetDateTime::now_utc())
    }

    /// Generates a new identifier stamped with the given instant.
    ///
    /// Instants before the unix epoch are clamped to the epoch.
    #[must_use]
    pub fn generate_at(instant: OffsetDateTime) -> Self {
        let seconds: u32 = u32::try_from(instant.unix_timestamp()).unwrap_or(0);
        let counter: u32 = COUNTER.fetch_add(1, Ordering::SeqCst) & 0x00FF_FFFF;

        let mut bytes: [u8; ID_BYTES] = [0; ID_BYTES];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);

        Self(hex::encode(bytes))
    }

    /// Parses an identifier from its hex representation.
    ///
    /// Upper-case hex is accepted and normalized to lower case.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidIdentifier` if the value is not exactly
    /// 24 hex characters.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let decoded: Vec<u8> = hex::decode(value)
            .map_err(|_| DomainError::InvalidIdentifier(value.to_string()))?;
        if decoded.len() != ID_BYTES {
            return Err(DomainError::InvalidIdentifier(value.to_string()));
        }
        Ok(Self(value.to_lowercase()))
    }

    /// Returns the hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the unix seconds embedded in the identifier.
    #[must_use]
    pub fn timestamp_seconds(&self) -> u32 {
        hex::decode(&self.0[0..8])
            .ok()
            .and_then(|bytes| <[u8; 4]>::try_from(bytes.as_slice()).ok())
            .map_or(0, u32::from_be_bytes)
    }
}

fn process_unique() -> &'static [u8; 5] {
    static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    PROCESS_UNIQUE.get_or_init(|| {
        let random: [u8; 8] = rand::random::<u64>().to_be_bytes();
        [random[0], random[1], random[2], random[3], random[4]]
    })
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}
