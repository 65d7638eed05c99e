// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Panier queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{EntityId, PageRequest, Panier};
use tracing::debug;

use super::{decode_id, decode_json, decode_timestamp};
use crate::data_models::{PageSlice, PanierFilter};
use crate::diesel_schema::paniers;
use crate::error::PersistenceError;

/// Diesel Queryable struct for panier rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = paniers)]
pub(crate) struct PanierRow {
    id: String,
    commerce_id: String,
    name: String,
    description: String,
    price: i64,
    items: String,
    quantity: i64,
    image: Option<String>,
    created_at: String,
}

impl PanierRow {
    pub(crate) fn into_panier(self) -> Result<Panier, PersistenceError> {
        Ok(Panier {
            id: decode_id(&self.id)?,
            commerce_id: decode_id(&self.commerce_id)?,
            name: self.name,
            description: self.description,
            price: self.price,
            items: decode_json(&self.items)?,
            quantity: self.quantity,
            image: self.image,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

/// Retrieves a panier by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the panier is not found.
pub fn get_panier_by_id(
    conn: &mut SqliteConnection,
    panier_id: &EntityId,
) -> Result<Option<Panier>, PersistenceError> {
    debug!(%panier_id, "Looking up panier by ID");

    let result: Result<PanierRow, diesel::result::Error> = paniers::table
        .filter(paniers::id.eq(panier_id.as_str()))
        .select(PanierRow::as_select())
        .first(conn);

    match result {
        Ok(row) => row.into_panier().map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

fn panier_scope(filter: &PanierFilter) -> paniers::BoxedQuery<'static, Sqlite> {
    let mut query = paniers::table.into_boxed();
    if let Some(commerce_id) = &filter.commerce_id {
        query = query.filter(paniers::commerce_id.eq(commerce_id.as_str().to_owned()));
    }
    match filter.in_stock {
        Some(true) => query = query.filter(paniers::quantity.gt(0_i64)),
        Some(false) => query = query.filter(paniers::quantity.eq(0_i64)),
        None => {}
    }
    query
}

/// Lists one page of paniers ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_paniers(
    conn: &mut SqliteConnection,
    filter: &PanierFilter,
    page: &PageRequest,
) -> Result<PageSlice<Panier>, PersistenceError> {
    debug!(?filter, first = page.first, "Listing paniers");

    let total_count: i64 = panier_scope(filter).count().get_result(conn)?;

    let mut query = panier_scope(filter);
    if let Some(after) = &page.after {
        query = query.filter(paniers::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<PanierRow> = query
        .order(paniers::id.asc())
        .limit(page.fetch_limit())
        .select(PanierRow::as_select())
        .load(conn)?;

    let items: Vec<Panier> = rows
        .into_iter()
        .map(PanierRow::into_panier)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}
