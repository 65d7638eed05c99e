// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{EntityId, PageRequest, Role, User, normalize_email};
use tracing::debug;

use super::{decode_id, decode_timestamp};
use crate::data_models::{PageSlice, UserFilter};
use crate::diesel_schema::users;
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role: String,
    payment_customer_id: Option<String>,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, PersistenceError> {
        Ok(User {
            id: decode_id(&self.id)?,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            role: self
                .role
                .parse::<Role>()
                .map_err(|e| PersistenceError::corrupt(&e))?,
            payment_customer_id: self.payment_customer_id,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

/// Retrieves a user by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_id(
    conn: &mut SqliteConnection,
    user_id: &EntityId,
) -> Result<Option<User>, PersistenceError> {
    debug!(%user_id, "Looking up user by ID");

    let result: Result<UserRow, diesel::result::Error> = users::table
        .filter(users::id.eq(user_id.as_str()))
        .select(UserRow::as_select())
        .first(conn);

    match result {
        Ok(row) => row.into_user().map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves a user by email.
///
/// The email is normalized, so the lookup is case-insensitive.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no user has this email.
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, PersistenceError> {
    let normalized_email: String = normalize_email(email);

    debug!("Looking up user by email: {}", normalized_email);

    let result: Result<UserRow, diesel::result::Error> = users::table
        .filter(users::email.eq(&normalized_email))
        .select(UserRow::as_select())
        .first(conn);

    match result {
        Ok(row) => row.into_user().map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

fn user_scope(filter: &UserFilter) -> users::BoxedQuery<'static, Sqlite> {
    let mut query = users::table.into_boxed();
    if let Some(role) = filter.role {
        query = query.filter(users::role.eq(role.as_str()));
    }
    query
}

/// Lists one page of users ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_users(
    conn: &mut SqliteConnection,
    filter: &UserFilter,
    page: &PageRequest,
) -> Result<PageSlice<User>, PersistenceError> {
    debug!(?filter, first = page.first, "Listing users");

    let total_count: i64 = user_scope(filter).count().get_result(conn)?;

    let mut query = user_scope(filter);
    if let Some(after) = &page.after {
        query = query.filter(users::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<UserRow> = query
        .order(users::id.asc())
        .limit(page.fetch_limit())
        .select(UserRow::as_select())
        .load(conn)?;

    let items: Vec<User> = rows
        .into_iter()
        .map(UserRow::into_user)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}

/// Counts users with a given role.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_users_with_role(
    conn: &mut SqliteConnection,
    role: Role,
) -> Result<i64, PersistenceError> {
    let count: i64 = users::table
        .filter(users::role.eq(role.as_str()))
        .count()
        .get_result(conn)?;
    Ok(count)
}

/// Verifies a password against a bcrypt hash.
///
/// # Arguments
///
/// * `password` - The plain text password to verify
/// * `password_hash` - The stored bcrypt hash
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::Other(format!("Password verification failed: {e}")))
}
