// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Commerce command queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{
    CommandStatus, CommerceCommand, EntityId, PageRequest, PaymentMethod, format_timestamp,
};
use time::OffsetDateTime;
use tracing::debug;

use super::{decode_id, decode_timestamp};
use crate::data_models::{CommerceCommandFilter, PageSlice};
use crate::diesel_schema::commerce_commands;
use crate::error::PersistenceError;

/// Diesel Queryable struct for commerce command rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = commerce_commands)]
pub(crate) struct CommerceCommandRow {
    id: String,
    command_id: String,
    commerce_id: String,
    user_id: String,
    pickup_date: String,
    price: i64,
    payment_method: String,
    status: String,
    transferred: i32,
    created_at: String,
}

impl CommerceCommandRow {
    pub(crate) fn into_commerce_command(self) -> Result<CommerceCommand, PersistenceError> {
        Ok(CommerceCommand {
            id: decode_id(&self.id)?,
            command_id: decode_id(&self.command_id)?,
            commerce_id: decode_id(&self.commerce_id)?,
            user_id: decode_id(&self.user_id)?,
            pickup_date: decode_timestamp(&self.pickup_date)?,
            price: self.price,
            payment_method: self
                .payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| PersistenceError::corrupt(&e))?,
            status: decode_status(&self.status)?,
            transferred: self.transferred != 0,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

fn decode_status(value: &str) -> Result<CommandStatus, PersistenceError> {
    value
        .parse::<CommandStatus>()
        .map_err(|e| PersistenceError::corrupt(&e))
}

/// Loads a commerce command by ID inside an open connection or transaction.
pub(crate) fn load_commerce_command(
    conn: &mut SqliteConnection,
    commerce_command_id: &EntityId,
) -> Result<CommerceCommand, PersistenceError> {
    let row: CommerceCommandRow = commerce_commands::table
        .filter(commerce_commands::id.eq(commerce_command_id.as_str()))
        .select(CommerceCommandRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("commerce command {commerce_command_id}"))
            }
            other => PersistenceError::from(other),
        })?;
    row.into_commerce_command()
}

/// Retrieves a commerce command by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the commerce command is not found.
pub fn get_commerce_command_by_id(
    conn: &mut SqliteConnection,
    commerce_command_id: &EntityId,
) -> Result<Option<CommerceCommand>, PersistenceError> {
    debug!(%commerce_command_id, "Looking up commerce command by ID");

    match load_commerce_command(conn, commerce_command_id) {
        Ok(commerce_command) => Ok(Some(commerce_command)),
        Err(PersistenceError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Reads the statuses of every commerce command of a command.
///
/// # Errors
///
/// Returns an error if the database query fails or a status is corrupt.
pub fn get_child_statuses(
    conn: &mut SqliteConnection,
    command_id: &EntityId,
) -> Result<Vec<CommandStatus>, PersistenceError> {
    debug!(%command_id, "Reading commerce command statuses");

    let statuses: Vec<String> = commerce_commands::table
        .filter(commerce_commands::command_id.eq(command_id.as_str()))
        .select(commerce_commands::status)
        .load(conn)?;

    statuses.iter().map(|status| decode_status(status)).collect()
}

/// Counts the commerce commands a commerce received strictly after an
/// instant, or all of them when `since` is `None`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_commerce_commands_since(
    conn: &mut SqliteConnection,
    commerce_id: &EntityId,
    since: Option<OffsetDateTime>,
) -> Result<i64, PersistenceError> {
    debug!(%commerce_id, ?since, "Counting commerce commands");

    let mut query = commerce_commands::table
        .filter(commerce_commands::commerce_id.eq(commerce_id.as_str()))
        .into_boxed::<Sqlite>();
    if let Some(since) = since {
        query = query.filter(commerce_commands::created_at.gt(format_timestamp(since)));
    }

    let count: i64 = query.count().get_result(conn)?;
    Ok(count)
}

fn commerce_command_scope(
    filter: &CommerceCommandFilter,
) -> commerce_commands::BoxedQuery<'static, Sqlite> {
    let mut query = commerce_commands::table.into_boxed();
    if let Some(commerce_id) = &filter.commerce_id {
        query = query.filter(commerce_commands::commerce_id.eq(commerce_id.as_str().to_owned()));
    }
    if let Some(command_id) = &filter.command_id {
        query = query.filter(commerce_commands::command_id.eq(command_id.as_str().to_owned()));
    }
    if let Some(status) = filter.status {
        query = query.filter(commerce_commands::status.eq(status.as_str()));
    }
    if let Some(from) = filter.pickup_from {
        query = query.filter(commerce_commands::pickup_date.ge(format_timestamp(from)));
    }
    if let Some(until) = filter.pickup_until {
        query = query.filter(commerce_commands::pickup_date.lt(format_timestamp(until)));
    }
    query
}

/// Lists one page of commerce commands ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_commerce_commands(
    conn: &mut SqliteConnection,
    filter: &CommerceCommandFilter,
    page: &PageRequest,
) -> Result<PageSlice<CommerceCommand>, PersistenceError> {
    debug!(?filter, first = page.first, "Listing commerce commands");

    let total_count: i64 = commerce_command_scope(filter).count().get_result(conn)?;

    let mut query = commerce_command_scope(filter);
    if let Some(after) = &page.after {
        query = query.filter(commerce_commands::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<CommerceCommandRow> = query
        .order(commerce_commands::id.asc())
        .limit(page.fetch_limit())
        .select(CommerceCommandRow::as_select())
        .load(conn)?;

    let items: Vec<CommerceCommand> = rows
        .into_iter()
        .map(CommerceCommandRow::into_commerce_command)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}
