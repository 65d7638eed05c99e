// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Command queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{Command, CommandStatus, EntityId, PageRequest};
use tracing::debug;

use super::{decode_id, decode_timestamp};
use crate::data_models::{CommandFilter, PageSlice};
use crate::diesel_schema::commands;
use crate::error::PersistenceError;

/// Diesel Queryable struct for command rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = commands)]
struct CommandRow {
    id: String,
    user_id: String,
    status: String,
    created_at: String,
}

impl CommandRow {
    fn into_command(self) -> Result<Command, PersistenceError> {
        Ok(Command {
            id: decode_id(&self.id)?,
            user_id: decode_id(&self.user_id)?,
            status: self
                .status
                .parse::<CommandStatus>()
                .map_err(|e| PersistenceError::corrupt(&e))?,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

/// Retrieves a command by ID.
///
/// The returned status is the cached aggregate.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the command is not found.
pub fn get_command_by_id(
    conn: &mut SqliteConnection,
    command_id: &EntityId,
) -> Result<Option<Command>, PersistenceError> {
    debug!(%command_id, "Looking up command by ID");

    let result: Result<CommandRow, diesel::result::Error> = commands::table
        .filter(commands::id.eq(command_id.as_str()))
        .select(CommandRow::as_select())
        .first(conn);

    match result {
        Ok(row) => row.into_command().map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

fn command_scope(filter: &CommandFilter) -> commands::BoxedQuery<'static, Sqlite> {
    let mut query = commands::table.into_boxed();
    if let Some(user_id) = &filter.user_id {
        query = query.filter(commands::user_id.eq(user_id.as_str().to_owned()));
    }
    query
}

/// Lists one page of commands ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_commands(
    conn: &mut SqliteConnection,
    filter: &CommandFilter,
    page: &PageRequest,
) -> Result<PageSlice<Command>, PersistenceError> {
    debug!(?filter, first = page.first, "Listing commands");

    let total_count: i64 = command_scope(filter).count().get_result(conn)?;

    let mut query = command_scope(filter);
    if let Some(after) = &page.after {
        query = query.filter(commands::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<CommandRow> = query
        .order(commands::id.asc())
        .limit(page.fetch_limit())
        .select(CommandRow::as_select())
        .load(conn)?;

    let items: Vec<Command> = rows
        .into_iter()
        .map(CommandRow::into_command)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}
