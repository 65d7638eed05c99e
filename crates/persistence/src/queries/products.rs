// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Product queries.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use localmarket_domain::{EntityId, PageRequest, Product};
use tracing::debug;

use super::{decode_id, decode_json, decode_timestamp, escape_like};
use crate::data_models::{PageSlice, ProductFilter};
use crate::diesel_schema::products;
use crate::error::PersistenceError;

/// Diesel Queryable struct for product rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = products)]
struct ProductRow {
    id: String,
    commerce_id: String,
    name: String,
    description: String,
    price: i64,
    tax_rate: f64,
    category: String,
    tags: String,
    image: Option<String>,
    is_available: i32,
    created_at: String,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, PersistenceError> {
        Ok(Product {
            id: decode_id(&self.id)?,
            commerce_id: decode_id(&self.commerce_id)?,
            name: self.name,
            description: self.description,
            price: self.price,
            tax_rate: self.tax_rate,
            category: self.category,
            tags: decode_json(&self.tags)?,
            image: self.image,
            is_available: self.is_available != 0,
            created_at: decode_timestamp(&self.created_at)?,
        })
    }
}

/// Retrieves a product by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the product is not found.
pub fn get_product_by_id(
    conn: &mut SqliteConnection,
    product_id: &EntityId,
) -> Result<Option<Product>, PersistenceError> {
    debug!(%product_id, "Looking up product by ID");

    let result: Result<ProductRow, diesel::result::Error> = products::table
        .filter(products::id.eq(product_id.as_str()))
        .select(ProductRow::as_select())
        .first(conn);

    match result {
        Ok(row) => row.into_product().map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves every product among the given IDs.
///
/// Unknown IDs are skipped; callers compare the result with their input.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn get_products_by_ids(
    conn: &mut SqliteConnection,
    product_ids: &[EntityId],
) -> Result<Vec<Product>, PersistenceError> {
    debug!(count = product_ids.len(), "Looking up products by ID");

    let ids: Vec<&str> = product_ids.iter().map(EntityId::as_str).collect();
    let rows: Vec<ProductRow> = products::table
        .filter(products::id.eq_any(ids))
        .order(products::id.asc())
        .select(ProductRow::as_select())
        .load(conn)?;

    rows.into_iter().map(ProductRow::into_product).collect()
}

fn product_scope(filter: &ProductFilter) -> products::BoxedQuery<'static, Sqlite> {
    let mut query = products::table.into_boxed();
    if let Some(commerce_id) = &filter.commerce_id {
        query = query.filter(products::commerce_id.eq(commerce_id.as_str().to_owned()));
    }
    if let Some(category) = &filter.category {
        query = query.filter(products::category.eq(category.clone()));
    }
    if let Some(tag) = &filter.tag {
        let encoded: String = serde_json::to_string(tag).unwrap_or_default();
        let pattern: String = format!("%{}%", escape_like(&encoded));
        query = query.filter(products::tags.like(pattern).escape('\\'));
    }
    if let Some(is_available) = filter.is_available {
        query = query.filter(products::is_available.eq(i32::from(is_available)));
    }
    query
}

/// Lists one page of products ordered by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_products(
    conn: &mut SqliteConnection,
    filter: &ProductFilter,
    page: &PageRequest,
) -> Result<PageSlice<Product>, PersistenceError> {
    debug!(?filter, first = page.first, "Listing products");

    let total_count: i64 = product_scope(filter).count().get_result(conn)?;

    let mut query = product_scope(filter);
    if let Some(after) = &page.after {
        query = query.filter(products::id.gt(after.as_str().to_owned()));
    }
    let rows: Vec<ProductRow> = query
        .order(products::id.asc())
        .limit(page.fetch_limit())
        .select(ProductRow::as_select())
        .load(conn)?;

    let items: Vec<Product> = rows
        .into_iter()
        .map(ProductRow::into_product)
        .collect::<Result<_, _>>()?;

    Ok(PageSlice { items, total_count })
}
