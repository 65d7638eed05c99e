// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `users` — User lookups, listing and password verification
//! - `sessions` — Session lookups
//! - `commerces` — Commerce lookups and listing
//! - `products` / `paniers` — Catalog lookups and listing
//! - `commands` / `commerce_commands` — Order lookups, listing and status reads
//! - `cc_commands` / `panier_commands` — Order line listing
//!
//! ## Pagination
//!
//! Every listing builds its scope (parent reference plus filters) as a
//! boxed query. The scope is counted once for `total_count`, then reused
//! with `id > after`, ascending id order and the over-fetch limit of the
//! page request.

pub mod cc_commands;
pub mod commands;
pub mod commerce_commands;
pub mod commerces;
pub mod panier_commands;
pub mod paniers;
pub mod products;
pub mod sessions;
pub mod users;

use localmarket_domain::{EntityId, parse_date, parse_timestamp};
use serde::de::DeserializeOwned;
use time::{Date, OffsetDateTime};

use crate::error::PersistenceError;

/// Decodes a stored identifier.
pub(crate) fn decode_id(value: &str) -> Result<EntityId, PersistenceError> {
    EntityId::parse(value).map_err(|e| PersistenceError::corrupt(&e))
}

/// Decodes a stored timestamp.
pub(crate) fn decode_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    parse_timestamp(value).map_err(|e| PersistenceError::corrupt(&e))
}

/// Decodes a stored calendar date.
pub(crate) fn decode_date(value: &str) -> Result<Date, PersistenceError> {
    parse_date(value).map_err(|e| PersistenceError::corrupt(&e))
}

/// Decodes a stored JSON column.
pub(crate) fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, PersistenceError> {
    Ok(serde_json::from_str(value)?)
}

/// Escapes `LIKE` wildcards with a backslash, to be used with `.escape('\\')`.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped: String = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
