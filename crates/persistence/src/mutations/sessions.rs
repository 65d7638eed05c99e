// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session mutations.

use diesel::prelude::*;
use localmarket_domain::{EntityId, current_timestamp, format_timestamp};
use tracing::{debug, info};

use crate::diesel_schema::sessions;
use crate::error::PersistenceError;

/// Creates a new session.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The unique session token
/// * `user_id` - The user the session authenticates
/// * `expires_at` - The expiration timestamp (RFC 3339)
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    user_id: &EntityId,
    expires_at: &str,
) -> Result<(), PersistenceError> {
    info!(%user_id, "Creating session");

    let now: String = format_timestamp(current_timestamp());

    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::user_id.eq(user_id.as_str()),
            sessions::created_at.eq(&now),
            sessions::last_activity_at.eq(&now),
            sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    Ok(())
}

/// Updates the last activity timestamp of a session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_session_activity(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<(), PersistenceError> {
    debug!("Updating session activity");

    diesel::update(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .set(sessions::last_activity_at.eq(format_timestamp(current_timestamp())))
        .execute(conn)?;

    Ok(())
}

/// Deletes a session by token.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<(), PersistenceError> {
    info!("Deleting session");

    diesel::delete(sessions::table.filter(sessions::session_token.eq(session_token)))
        .execute(conn)?;

    Ok(())
}

/// Deletes every session of a user.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_sessions_for_user(
    conn: &mut SqliteConnection,
    user_id: &EntityId,
) -> Result<usize, PersistenceError> {
    info!(%user_id, "Deleting all sessions of user");

    let deleted: usize =
        diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id.as_str())))
            .execute(conn)?;

    Ok(deleted)
}

/// Deletes every session whose expiry is in the past.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(conn: &mut SqliteConnection) -> Result<usize, PersistenceError> {
    let now: String = format_timestamp(current_timestamp());

    let deleted: usize = diesel::delete(sessions::table.filter(sessions::expires_at.lt(&now)))
        .execute(conn)?;

    if deleted > 0 {
        info!(deleted, "Deleted expired sessions");
    }

    Ok(deleted)
}
