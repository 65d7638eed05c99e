// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Panier command queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{EntityId, PageRequest, PanierCommand};
use tracing::debug;

use super::{decode_id, decode_timestamp};
use crate::data_models::PageSlice;
use crate::diesel_schema::panier_commands;
use crate::error::PersistenceError;

/// Diesel Queryable struct for panier command rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = panier_commands)]
struct PanierCommandRow {
    id: String,
    commerce_command_id: String,
    panier_id: String,
    quantity: i64,
    pickup_date: String,
    created_at: String,
}

impl PanierCommandRow {
    fn into_panier_command(self) -> Result<PanierCommand, PersistenceError> {
        Ok(PanierCommand {
            id: decode_id(&self.id)?,
            commerce_command_id: decode_id(&self.commerce_command_id)?,
            panier_id: decode_id(&self.panier_id)?,
            quantity: u32::try_from(self.quantity).map_err(|_| {
                PersistenceError::CorruptData(format!(
                    "panier command {} has quantity {}",
                    self.id, self.quantity
                ))
            })?,
            pickup_date: decode_timestamp(&self.pickup_date)?,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

/// Lists one page of the panier commands of a commerce command.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_panier_commands(
    conn: &mut SqliteConnection,
    commerce_command_id: &EntityId,
    page: &PageRequest,
) -> Result<PageSlice<PanierCommand>, PersistenceError> {
    debug!(%commerce_command_id, first = page.first, "Listing panier commands");

    let scope = panier_commands::commerce_command_id.eq(commerce_command_id.as_str().to_owned());

    let total_count: i64 = panier_commands::table
        .filter(scope.clone())
        .count()
        .get_result(conn)?;

    let mut query: panier_commands::BoxedQuery<'_, Sqlite> =
        panier_commands::table.filter(scope).into_boxed();
    if let Some(after) = &page.after {
        query = query.filter(panier_commands::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<PanierCommandRow> = query
        .order(panier_commands::id.asc())
        .limit(page.fetch_limit())
        .select(PanierCommandRow::as_select())
        .load(conn)?;

    let items: Vec<PanierCommand> = rows
        .into_iter()
        .map(PanierCommandRow::into_panier_command)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}
