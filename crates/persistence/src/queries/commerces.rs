// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Commerce queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{
    BankingDetails, Commerce, EntityId, GeoPoint, PageRequest, format_date,
};
use time::Date;
use tracing::debug;

use super::{decode_date, decode_id, decode_json, decode_timestamp, escape_like};
use crate::data_models::{CommerceFilter, PageSlice};
use crate::diesel_schema::commerces;
use crate::error::PersistenceError;

/// Diesel Queryable struct for commerce rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = commerces)]
pub(crate) struct CommerceRow {
    id: String,
    storekeeper_id: String,
    name: String,
    description: String,
    email: String,
    phone: String,
    address: String,
    latitude: f64,
    longitude: f64,
    image: Option<String>,
    banking: Option<String>,
    services: String,
    balance: i64,
    due_balance: i64,
    last_billing: String,
    billing_history: String,
    created_at: String,
}

impl CommerceRow {
    pub(crate) fn into_commerce(self) -> Result<Commerce, PersistenceError> {
        let banking: Option<BankingDetails> = self
            .banking
            .as_deref()
            .map(decode_json::<BankingDetails>)
            .transpose()?;

        Ok(Commerce {
            id: decode_id(&self.id)?,
            storekeeper_id: decode_id(&self.storekeeper_id)?,
            name: self.name,
            description: self.description,
            email: self.email,
            phone: self.phone,
            address: decode_json(&self.address)?,
            position: GeoPoint {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            image: self.image,
            banking,
            services: decode_json(&self.services)?,
            balance: self.balance,
            due_balance: self.due_balance,
            last_billing: decode_date(&self.last_billing)?,
            billing_history: decode_json(&self.billing_history)?,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

/// Loads a commerce row by ID inside an open connection or transaction.
pub(crate) fn load_commerce(
    conn: &mut SqliteConnection,
    commerce_id: &EntityId,
) -> Result<Commerce, PersistenceError> {
    let row: CommerceRow = commerces::table
        .filter(commerces::id.eq(commerce_id.as_str()))
        .select(CommerceRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("commerce {commerce_id}"))
            }
            other => PersistenceError::from(other),
        })?;
    row.into_commerce()
}

/// Retrieves a commerce by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the commerce is not found.
pub fn get_commerce_by_id(
    conn: &mut SqliteConnection,
    commerce_id: &EntityId,
) -> Result<Option<Commerce>, PersistenceError> {
    debug!(%commerce_id, "Looking up commerce by ID");

    match load_commerce(conn, commerce_id) {
        Ok(commerce) => Ok(Some(commerce)),
        Err(PersistenceError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Retrieves the commerce owned by a storekeeper.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user owns no commerce.
pub fn get_commerce_by_storekeeper(
    conn: &mut SqliteConnection,
    storekeeper_id: &EntityId,
) -> Result<Option<Commerce>, PersistenceError> {
    debug!(%storekeeper_id, "Looking up commerce by storekeeper");

    let result: Result<CommerceRow, diesel::result::Error> = commerces::table
        .filter(commerces::storekeeper_id.eq(storekeeper_id.as_str()))
        .select(CommerceRow::as_select())
        .first(conn);

    match result {
        Ok(row) => row.into_commerce().map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

fn commerce_scope(filter: &CommerceFilter) -> commerces::BoxedQuery<'static, Sqlite> {
    let mut query = commerces::table.into_boxed();
    if let Some(city) = &filter.city {
        query = query.filter(
            commerces::address
                .like(json_field_pattern("city", city))
                .escape('\\'),
        );
    }
    if let Some(service) = &filter.service {
        // Matches every tier and pending tag of the service.
        let pattern: String = format!("%\"{}\\_%", escape_like(&service.to_uppercase()));
        query = query.filter(commerces::services.like(pattern).escape('\\'));
    }
    query
}

/// `LIKE` pattern matching a string field of a serialized JSON object.
fn json_field_pattern(field: &str, value: &str) -> String {
    let encoded: String = serde_json::to_string(value).unwrap_or_default();
    format!("%\"{field}\":{}%", escape_like(&encoded))
}

/// Lists one page of commerces ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_commerces(
    conn: &mut SqliteConnection,
    filter: &CommerceFilter,
    page: &PageRequest,
) -> Result<PageSlice<Commerce>, PersistenceError> {
    debug!(?filter, first = page.first, "Listing commerces");

    let total_count: i64 = commerce_scope(filter).count().get_result(conn)?;

    let mut query = commerce_scope(filter);
    if let Some(after) = &page.after {
        query = query.filter(commerces::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<CommerceRow> = query
        .order(commerces::id.asc())
        .limit(page.fetch_limit())
        .select(CommerceRow::as_select())
        .load(conn)?;

    let items: Vec<Commerce> = rows
        .into_iter()
        .map(CommerceRow::into_commerce)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}

/// Lists every commerce last billed on or before `cutoff`.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_commerces_billed_before(
    conn: &mut SqliteConnection,
    cutoff: Date,
) -> Result<Vec<Commerce>, PersistenceError> {
    debug!(%cutoff, "Listing commerces due for billing");

    let rows: Vec<CommerceRow> = commerces::table
        .filter(commerces::last_billing.le(format_date(cutoff)))
        .order(commerces::id.asc())
        .select(CommerceRow::as_select())
        .load(conn)?;

    rows.into_iter().map(CommerceRow::into_commerce).collect()
}

/// Lists the IDs of every commerce.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_commerce_ids(conn: &mut SqliteConnection) -> Result<Vec<EntityId>, PersistenceError> {
    let ids: Vec<String> = commerces::table
        .select(commerces::id)
        .order(commerces::id.asc())
        .load(conn)?;
    ids.iter().map(|id| decode_id(id)).collect()
}
