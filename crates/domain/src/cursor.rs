// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Opaque pagination cursors.
//!
//! A cursor is the standard base64 encoding of the hex identifier of the
//! last item a client has seen. Clients must treat it as opaque.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::DomainError;
use crate::id::EntityId;

/// Default number of items per page when `first` is omitted.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Encodes an identifier as an opaque cursor.
#[must_use]
pub fn encode_cursor(id: &EntityId) -> String {
    STANDARD.encode(id.as_str())
}

/// Decodes an opaque cursor back into the identifier it points at.
///
/// # Errors
///
/// Returns `DomainError::InvalidCursor` if the cursor is not base64, does
/// not decode to UTF-8, or does not contain a valid identifier.
pub fn decode_cursor(cursor: &str) -> Result<EntityId, DomainError> {
    let bytes: Vec<u8> = STANDARD
        .decode(cursor)
        .map_err(|e| DomainError::InvalidCursor(format!("not base64: {e}")))?;
    let text: String = String::from_utf8(bytes)
        .map_err(|_| DomainError::InvalidCursor(String::from("not UTF-8")))?;
    EntityId::parse(&text)
        .map_err(|_| DomainError::InvalidCursor(String::from("does not reference an identifier")))
}

/// Validated pagination arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Identifier after which the page starts, exclusive.
    pub after: Option<EntityId>,
    /// Maximum number of items in the page.
    pub first: i64,
}

impl PageRequest {
    /// Builds a page request from raw `first` / `after` arguments.
    ///
    /// # Arguments
    ///
    /// * `first` - Requested page size, `DEFAULT_PAGE_SIZE` when absent
    /// * `after` - Opaque cursor of the last seen item, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the page size is out of range or the cursor is
    /// malformed.
    pub fn new(first: Option<i64>, after: Option<&str>) -> Result<Self, DomainError> {
        let first: i64 = first.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&first) {
            return Err(DomainError::InvalidPageSize {
                requested: first,
                max: MAX_PAGE_SIZE,
            });
        }

        let after: Option<EntityId> = match after {
            Some(cursor) if !cursor.is_empty() => Some(decode_cursor(cursor)?),
            _ => None,
        };

        Ok(Self { after, first })
    }

    /// Number of rows to fetch: one more than the page size, so the extra
    /// row tells whether another page exists.
    #[must_use]
    pub const fn fetch_limit(&self) -> i64 {
        self.first + 1
    }
}
