// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Product and panier mutations.

use diesel::prelude::*;
use localmarket_domain::{Panier, Product, format_timestamp};
use tracing::info;

use crate::diesel_schema::{paniers, products};
use crate::error::PersistenceError;

/// Inserts products in one transaction.
///
/// Either every product is stored or none is.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub fn create_products(
    conn: &mut SqliteConnection,
    new_products: &[Product],
) -> Result<(), PersistenceError> {
    info!(count = new_products.len(), "Creating products");

    conn.transaction::<_, PersistenceError, _>(|conn| {
        for product in new_products {
            diesel::insert_into(products::table)
                .values((
                    products::id.eq(product.id.as_str()),
                    products::commerce_id.eq(product.commerce_id.as_str()),
                    products::name.eq(&product.name),
                    products::description.eq(&product.description),
                    products::price.eq(product.price),
                    products::tax_rate.eq(product.tax_rate),
                    products::category.eq(&product.category),
                    products::tags.eq(serde_json::to_string(&product.tags)?),
                    products::image.eq(product.image.as_deref()),
                    products::is_available.eq(i32::from(product.is_available)),
                    products::created_at.eq(format_timestamp(product.created_at)),
                ))
                .execute(conn)?;
        }
        Ok(())
    })
}

/// Writes updated products in one transaction.
///
/// # Errors
///
/// Returns an error if any product does not exist or an update fails; no
/// change is kept in that case.
pub fn update_products(
    conn: &mut SqliteConnection,
    changed: &[Product],
) -> Result<(), PersistenceError> {
    info!(count = changed.len(), "Updating products");

    conn.transaction::<_, PersistenceError, _>(|conn| {
        for product in changed {
            let updated: usize = diesel::update(products::table)
                .filter(products::id.eq(product.id.as_str()))
                .set((
                    products::name.eq(&product.name),
                    products::description.eq(&product.description),
                    products::price.eq(product.price),
                    products::tax_rate.eq(product.tax_rate),
                    products::category.eq(&product.category),
                    products::tags.eq(serde_json::to_string(&product.tags)?),
                    products::image.eq(product.image.as_deref()),
                    products::is_available.eq(i32::from(product.is_available)),
                ))
                .execute(conn)?;

            if updated == 0 {
                return Err(PersistenceError::NotFound(format!("product {}", product.id)));
            }
        }
        Ok(())
    })
}

/// Inserts a panier.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_panier(conn: &mut SqliteConnection, panier: &Panier) -> Result<(), PersistenceError> {
    info!(panier_id = %panier.id, commerce_id = %panier.commerce_id, "Creating panier");

    diesel::insert_into(paniers::table)
        .values((
            paniers::id.eq(panier.id.as_str()),
            paniers::commerce_id.eq(panier.commerce_id.as_str()),
            paniers::name.eq(&panier.name),
            paniers::description.eq(&panier.description),
            paniers::price.eq(panier.price),
            paniers::items.eq(serde_json::to_string(&panier.items)?),
            paniers::quantity.eq(panier.quantity),
            paniers::image.eq(panier.image.as_deref()),
            paniers::created_at.eq(format_timestamp(panier.created_at)),
        ))
        .execute(conn)?;

    Ok(())
}

/// Writes an updated panier.
///
/// # Errors
///
/// Returns an error if the panier does not exist or the update fails.
pub fn update_panier(conn: &mut SqliteConnection, panier: &Panier) -> Result<(), PersistenceError> {
    info!(panier_id = %panier.id, "Updating panier");

    let updated: usize = diesel::update(paniers::table)
        .filter(paniers::id.eq(panier.id.as_str()))
        .set((
            paniers::name.eq(&panier.name),
            paniers::description.eq(&panier.description),
            paniers::price.eq(panier.price),
            paniers::items.eq(serde_json::to_string(&panier.items)?),
            paniers::quantity.eq(panier.quantity),
            paniers::image.eq(panier.image.as_deref()),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("panier {}", panier.id)));
    }

    Ok(())
}
