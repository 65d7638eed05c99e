// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User mutations.

use diesel::prelude::*;
use localmarket_domain::{EntityId, User, current_timestamp, format_timestamp, normalize_email};
use tracing::info;

use crate::data_models::NewUserData;
use crate::diesel_schema::users;
use crate::error::PersistenceError;

fn hash_password(password: &str, cost: u32) -> Result<String, PersistenceError> {
    bcrypt::hash(password, cost)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))
}

/// Creates a new user.
///
/// The email is normalized to lower case for case-insensitive uniqueness
/// and the password is hashed with bcrypt.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `new_user` - The account fields
/// * `password_cost` - The bcrypt cost factor
///
/// # Errors
///
/// Returns an error if the user cannot be created or if the email
/// already exists.
pub fn create_user(
    conn: &mut SqliteConnection,
    new_user: &NewUserData,
    password_cost: u32,
) -> Result<User, PersistenceError> {
    let user: User = User {
        id: EntityId::generate(),
        email: normalize_email(&new_user.email),
        password_hash: hash_password(&new_user.password, password_cost)?,
        first_name: new_user.first_name.clone(),
        last_name: new_user.last_name.clone(),
        phone: new_user.phone.clone(),
        role: new_user.role,
        payment_customer_id: new_user.payment_customer_id.clone(),
        created_at: current_timestamp(),
    };

    info!(
        "Creating user with email: {}, role: {}",
        user.email, user.role
    );

    diesel::insert_into(users::table)
        .values((
            users::id.eq(user.id.as_str()),
            users::email.eq(&user.email),
            users::password_hash.eq(&user.password_hash),
            users::first_name.eq(&user.first_name),
            users::last_name.eq(&user.last_name),
            users::phone.eq(user.phone.as_deref()),
            users::role.eq(user.role.as_str()),
            users::payment_customer_id.eq(user.payment_customer_id.as_deref()),
            users::created_at.eq(format_timestamp(user.created_at)),
        ))
        .execute(conn)?;

    info!(user_id = %user.id, "User created successfully");

    Ok(user)
}

/// Writes the profile fields of a user and optionally a new password.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user` - The updated user; its `password_hash` is ignored
/// * `new_password` - A new plain-text password to hash and store
/// * `password_cost` - The bcrypt cost factor
///
/// # Errors
///
/// Returns an error if the user does not exist, the email is taken by
/// another user, or the update fails.
pub fn update_user(
    conn: &mut SqliteConnection,
    user: &User,
    new_password: Option<&str>,
    password_cost: u32,
) -> Result<(), PersistenceError> {
    info!(user_id = %user.id, "Updating user");

    let updated: usize = diesel::update(users::table)
        .filter(users::id.eq(user.id.as_str()))
        .set((
            users::email.eq(&user.email),
            users::first_name.eq(&user.first_name),
            users::last_name.eq(&user.last_name),
            users::phone.eq(user.phone.as_deref()),
            users::role.eq(user.role.as_str()),
            users::payment_customer_id.eq(user.payment_customer_id.as_deref()),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("user {}", user.id)));
    }

    if let Some(password) = new_password {
        let password_hash: String = hash_password(password, password_cost)?;
        diesel::update(users::table)
            .filter(users::id.eq(user.id.as_str()))
            .set(users::password_hash.eq(&password_hash))
            .execute(conn)?;
        info!(user_id = %user.id, "Password updated");
    }

    Ok(())
}
