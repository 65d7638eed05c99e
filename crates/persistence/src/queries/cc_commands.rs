// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Click-and-collect command queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{CcCommand, EntityId, PageRequest};
use tracing::debug;

use super::{decode_id, decode_json, decode_timestamp};
use crate::data_models::PageSlice;
use crate::diesel_schema::cc_commands;
use crate::error::PersistenceError;

/// Diesel Queryable struct for click-and-collect command rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = cc_commands)]
struct CcCommandRow {
    id: String,
    commerce_command_id: String,
    items: String,
    pickup_date: String,
    created_at: String,
}

impl CcCommandRow {
    fn into_cc_command(self) -> Result<CcCommand, PersistenceError> {
        Ok(CcCommand {
            id: decode_id(&self.id)?,
            commerce_command_id: decode_id(&self.commerce_command_id)?,
            items: decode_json(&self.items)?,
            pickup_date: decode_timestamp(&self.pickup_date)?,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

/// Lists one page of the click-and-collect commands of a commerce command.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_cc_commands(
    conn: &mut SqliteConnection,
    commerce_command_id: &EntityId,
    page: &PageRequest,
) -> Result<PageSlice<CcCommand>, PersistenceError> {
    debug!(%commerce_command_id, first = page.first, "Listing click-and-collect commands");

    let scope = cc_commands::commerce_command_id.eq(commerce_command_id.as_str().to_owned());

    let total_count: i64 = cc_commands::table
        .filter(scope.clone())
        .count()
        .get_result(conn)?;

    let mut query: cc_commands::BoxedQuery<'_, Sqlite> =
        cc_commands::table.filter(scope).into_boxed();
    if let Some(after) = &page.after {
        query = query.filter(cc_commands::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<CcCommandRow> = query
        .order(cc_commands::id.asc())
        .limit(page.fetch_limit())
        .select(CcCommandRow::as_select())
        .load(conn)?;

    let items: Vec<CcCommand> = rows
        .into_iter()
        .map(CcCommandRow::into_cc_command)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}
