// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mutation modules for persistence layer.
//!
//! This module contains all write operations for the persistence layer.
//! Multi-row writes run in a single `SQLite` transaction so a failure
//! leaves no partial state behind.
//!
//! ## Module Organization
//!
//! - `users` — User creation and updates, password hashing
//! - `sessions` — Session lifecycle
//! - `commerces` — Commerce creation, updates, billing and banking settlement
//! - `catalog` — Product and panier writes
//! - `orders` — Checkout and commerce command status changes

pub mod catalog;
pub mod commerces;
pub mod orders;
pub mod sessions;
pub mod users;
