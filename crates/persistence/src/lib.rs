// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the local marketplace.
//!
//! This crate stores users, sessions, commerces, catalog entries and orders
//! in `SQLite` through Diesel. Migrations are embedded and applied when a
//! `Persistence` is opened.
//!
//! ## Conventions
//!
//! - Identifiers are `EntityId` hex strings; their text order is creation
//!   order, which is what cursor pagination relies on
//! - Timestamps are UTC RFC 3339 text with second precision, dates are
//!   `YYYY-MM-DD`
//! - Structured fields (address, banking, subscriptions, tags, line items,
//!   billing history) are JSON text columns
//! - Lookups return `Ok(None)` when nothing matches; listings return a
//!   `PageSlice` with one extra row when a further page exists
//!
//! ## Testing
//!
//! `Persistence::new_in_memory()` opens an isolated shared-cache in-memory
//! database per call; every test gets its own.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use localmarket_domain::{
    BillingRecord, CcCommand, Command, CommandStatus, Commerce, CommerceCommand, EntityId,
    PageRequest, Panier, PanierCommand, Product, Role, User,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{Date, OffsetDateTime};

use crate::backend::sqlite::StorageMode;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{
    CheckoutData, CheckoutPart, CommandFilter, CommerceCommandFilter, CommerceFilter,
    NewUserData, PageSlice, PanierFilter, ProductFilter, SessionData, TransferSummary,
    UserFilter,
};
pub use error::PersistenceError;

/// Persistence adapter for the marketplace database.
pub struct Persistence {
    conn: SqliteConnection,
    password_cost: u32,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection =
            backend::sqlite::open(&shared_memory_url, StorageMode::Memory)?;

        Ok(Self {
            conn,
            password_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let conn: SqliteConnection = backend::sqlite::open(path_str, StorageMode::File)?;

        Ok(Self {
            conn,
            password_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Sets the bcrypt cost used when hashing passwords.
    ///
    /// Values outside bcrypt's accepted range make password writes fail.
    #[must_use]
    pub const fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Creates a user; the password is hashed before storage.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the email is taken,
    /// or another error if the insert fails.
    pub fn create_user(&mut self, new_user: &NewUserData) -> Result<User, PersistenceError> {
        mutations::users::create_user(&mut self.conn, new_user, self.password_cost)
    }

    /// Retrieves a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(&mut self, user_id: &EntityId) -> Result<Option<User>, PersistenceError> {
        queries::users::get_user_by_id(&mut self.conn, user_id)
    }

    /// Retrieves a user by email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, PersistenceError> {
        queries::users::get_user_by_email(&mut self.conn, email)
    }

    /// Lists one page of users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_users(
        &mut self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<PageSlice<User>, PersistenceError> {
        queries::users::list_users(&mut self.conn, filter, page)
    }

    /// Counts users with a given role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_users_with_role(&mut self, role: Role) -> Result<i64, PersistenceError> {
        queries::users::count_users_with_role(&mut self.conn, role)
    }

    /// Writes a user's profile fields and optionally a new password.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist, the email is taken, or
    /// the update fails.
    pub fn update_user(
        &mut self,
        user: &User,
        new_password: Option<&str>,
    ) -> Result<(), PersistenceError> {
        mutations::users::update_user(&mut self.conn, user, new_password, self.password_cost)
    }

    /// Verifies a password against a stored bcrypt hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed.
    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, PersistenceError> {
        queries::users::verify_password(password, password_hash)
    }

    // ========================================================================
    // Session Management
    // ========================================================================

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created.
    pub fn create_session(
        &mut self,
        session_token: &str,
        user_id: &EntityId,
        expires_at: &str,
    ) -> Result<(), PersistenceError> {
        mutations::sessions::create_session(&mut self.conn, session_token, user_id, expires_at)
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::sessions::get_session_by_token(&mut self.conn, session_token)
    }

    /// Updates the last activity timestamp of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_session_activity(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::sessions::update_session_activity(&mut self.conn, session_token)
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::sessions::delete_session(&mut self.conn, session_token)
    }

    /// Deletes every session of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_sessions_for_user(
        &mut self,
        user_id: &EntityId,
    ) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_sessions_for_user(&mut self.conn, user_id)
    }

    /// Deletes all expired sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_sessions(&mut self) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_expired_sessions(&mut self.conn)
    }

    // ========================================================================
    // Commerces
    // ========================================================================

    /// Creates a commerce.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the storekeeper already
    /// owns a commerce, or another error if the insert fails.
    pub fn create_commerce(&mut self, commerce: &Commerce) -> Result<(), PersistenceError> {
        mutations::commerces::create_commerce(&mut self.conn, commerce)
    }

    /// Retrieves a commerce by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_commerce_by_id(
        &mut self,
        commerce_id: &EntityId,
    ) -> Result<Option<Commerce>, PersistenceError> {
        queries::commerces::get_commerce_by_id(&mut self.conn, commerce_id)
    }

    /// Retrieves the commerce owned by a storekeeper.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_commerce_by_storekeeper(
        &mut self,
        storekeeper_id: &EntityId,
    ) -> Result<Option<Commerce>, PersistenceError> {
        queries::commerces::get_commerce_by_storekeeper(&mut self.conn, storekeeper_id)
    }

    /// Lists one page of commerces.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_commerces(
        &mut self,
        filter: &CommerceFilter,
        page: &PageRequest,
    ) -> Result<PageSlice<Commerce>, PersistenceError> {
        queries::commerces::list_commerces(&mut self.conn, filter, page)
    }

    /// Lists every commerce last billed on or before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_commerces_billed_before(
        &mut self,
        cutoff: Date,
    ) -> Result<Vec<Commerce>, PersistenceError> {
        queries::commerces::list_commerces_billed_before(&mut self.conn, cutoff)
    }

    /// Lists the IDs of every commerce.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_commerce_ids(&mut self) -> Result<Vec<EntityId>, PersistenceError> {
        queries::commerces::list_commerce_ids(&mut self.conn)
    }

    /// Writes the patchable fields, subscriptions and due balance of a
    /// commerce.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce does not exist or the update fails.
    pub fn update_commerce(&mut self, commerce: &Commerce) -> Result<(), PersistenceError> {
        mutations::commerces::update_commerce(&mut self.conn, commerce)
    }

    /// Records a successful billing pass in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce does not exist or a write fails.
    pub fn settle_billing(
        &mut self,
        commerce_id: &EntityId,
        record: &BillingRecord,
        today: Date,
    ) -> Result<Commerce, PersistenceError> {
        mutations::commerces::settle_billing(&mut self.conn, commerce_id, record, today)
    }

    /// Credits finished commerce commands to the commerce balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce does not exist or a write fails.
    pub fn transfer_done_commands(
        &mut self,
        commerce_id: &EntityId,
    ) -> Result<TransferSummary, PersistenceError> {
        mutations::commerces::transfer_done_commands(&mut self.conn, commerce_id)
    }

    /// Resets a commerce balance to zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn reset_balance(&mut self, commerce_id: &EntityId) -> Result<(), PersistenceError> {
        mutations::commerces::reset_balance(&mut self.conn, commerce_id)
    }

    // ========================================================================
    // Products & Paniers
    // ========================================================================

    /// Inserts products, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub fn create_products(&mut self, products: &[Product]) -> Result<(), PersistenceError> {
        mutations::catalog::create_products(&mut self.conn, products)
    }

    /// Writes updated products, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if any product is missing or an update fails.
    pub fn update_products(&mut self, products: &[Product]) -> Result<(), PersistenceError> {
        mutations::catalog::update_products(&mut self.conn, products)
    }

    /// Retrieves a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_product_by_id(
        &mut self,
        product_id: &EntityId,
    ) -> Result<Option<Product>, PersistenceError> {
        queries::products::get_product_by_id(&mut self.conn, product_id)
    }

    /// Retrieves the products among the given IDs; unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_products_by_ids(
        &mut self,
        product_ids: &[EntityId],
    ) -> Result<Vec<Product>, PersistenceError> {
        queries::products::get_products_by_ids(&mut self.conn, product_ids)
    }

    /// Lists one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_products(
        &mut self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<PageSlice<Product>, PersistenceError> {
        queries::products::list_products(&mut self.conn, filter, page)
    }

    /// Inserts a panier.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_panier(&mut self, panier: &Panier) -> Result<(), PersistenceError> {
        mutations::catalog::create_panier(&mut self.conn, panier)
    }

    /// Writes an updated panier.
    ///
    /// # Errors
    ///
    /// Returns an error if the panier does not exist or the update fails.
    pub fn update_panier(&mut self, panier: &Panier) -> Result<(), PersistenceError> {
        mutations::catalog::update_panier(&mut self.conn, panier)
    }

    /// Retrieves a panier by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_panier_by_id(
        &mut self,
        panier_id: &EntityId,
    ) -> Result<Option<Panier>, PersistenceError> {
        queries::paniers::get_panier_by_id(&mut self.conn, panier_id)
    }

    /// Lists one page of paniers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_paniers(
        &mut self,
        filter: &PanierFilter,
        page: &PageRequest,
    ) -> Result<PageSlice<Panier>, PersistenceError> {
        queries::paniers::list_paniers(&mut self.conn, filter, page)
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Writes every record of a checkout in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::InsufficientQuantity` if a panier ran out,
    /// or another error if a write fails.
    pub fn create_checkout(&mut self, checkout: &CheckoutData) -> Result<(), PersistenceError> {
        mutations::orders::create_checkout(&mut self.conn, checkout)
    }

    /// Retrieves a command by ID, with its cached status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_command_by_id(
        &mut self,
        command_id: &EntityId,
    ) -> Result<Option<Command>, PersistenceError> {
        queries::commands::get_command_by_id(&mut self.conn, command_id)
    }

    /// Lists one page of commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_commands(
        &mut self,
        filter: &CommandFilter,
        page: &PageRequest,
    ) -> Result<PageSlice<Command>, PersistenceError> {
        queries::commands::list_commands(&mut self.conn, filter, page)
    }

    /// Reads the statuses of every commerce command of a command.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_child_statuses(
        &mut self,
        command_id: &EntityId,
    ) -> Result<Vec<CommandStatus>, PersistenceError> {
        queries::commerce_commands::get_child_statuses(&mut self.conn, command_id)
    }

    /// Retrieves a commerce command by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_commerce_command_by_id(
        &mut self,
        commerce_command_id: &EntityId,
    ) -> Result<Option<CommerceCommand>, PersistenceError> {
        queries::commerce_commands::get_commerce_command_by_id(&mut self.conn, commerce_command_id)
    }

    /// Lists one page of commerce commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_commerce_commands(
        &mut self,
        filter: &CommerceCommandFilter,
        page: &PageRequest,
    ) -> Result<PageSlice<CommerceCommand>, PersistenceError> {
        queries::commerce_commands::list_commerce_commands(&mut self.conn, filter, page)
    }

    /// Counts the commerce commands a commerce received strictly after
    /// `since`, or all of them when `since` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_commerce_commands_since(
        &mut self,
        commerce_id: &EntityId,
        since: Option<OffsetDateTime>,
    ) -> Result<i64, PersistenceError> {
        queries::commerce_commands::count_commerce_commands_since(
            &mut self.conn,
            commerce_id,
            since,
        )
    }

    /// Changes a commerce command status and refreshes its command's cached
    /// status in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce command does not exist, the
    /// transition is not allowed, or a write fails.
    pub fn update_commerce_command_status(
        &mut self,
        commerce_command_id: &EntityId,
        new_status: CommandStatus,
    ) -> Result<(CommerceCommand, CommandStatus), PersistenceError> {
        mutations::orders::update_commerce_command_status(
            &mut self.conn,
            commerce_command_id,
            new_status,
        )
    }

    /// Lists one page of the click-and-collect commands of a commerce command.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_cc_commands(
        &mut self,
        commerce_command_id: &EntityId,
        page: &PageRequest,
    ) -> Result<PageSlice<CcCommand>, PersistenceError> {
        queries::cc_commands::list_cc_commands(&mut self.conn, commerce_command_id, page)
    }

    /// Lists one page of the panier commands of a commerce command.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_panier_commands(
        &mut self,
        commerce_command_id: &EntityId,
        page: &PageRequest,
    ) -> Result<PageSlice<PanierCommand>, PersistenceError> {
        queries::panier_commands::list_panier_commands(&mut self.conn, commerce_command_id, page)
    }
}
