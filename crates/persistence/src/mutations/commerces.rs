// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Commerce mutations, including the billing and banking settlements.
//!
//! `balance` is only written by `transfer_done_commands` and
//! `reset_balance`; `due_balance` only by `update_commerce` (subscription
//! charges) and `settle_billing`.

use diesel::prelude::*;
use localmarket_domain::{
    BillingRecord, CommandStatus, Commerce, EntityId, format_date, format_timestamp,
    settle_pending_changes,
};
use time::Date;
use tracing::{debug, info};

use crate::data_models::TransferSummary;
use crate::diesel_schema::{commerce_commands, commerces};
use crate::error::PersistenceError;
use crate::queries::commerces::load_commerce;

/// Creates a new commerce.
///
/// # Errors
///
/// Returns an error if the storekeeper already owns a commerce, the
/// storekeeper does not exist, or the insert fails.
pub fn create_commerce(
    conn: &mut SqliteConnection,
    commerce: &Commerce,
) -> Result<(), PersistenceError> {
    info!(
        commerce_id = %commerce.id,
        storekeeper_id = %commerce.storekeeper_id,
        "Creating commerce '{}'",
        commerce.name
    );

    diesel::insert_into(commerces::table)
        .values((
            commerces::id.eq(commerce.id.as_str()),
            commerces::storekeeper_id.eq(commerce.storekeeper_id.as_str()),
            commerces::name.eq(&commerce.name),
            commerces::description.eq(&commerce.description),
            commerces::email.eq(&commerce.email),
            commerces::phone.eq(&commerce.phone),
            commerces::address.eq(serde_json::to_string(&commerce.address)?),
            commerces::latitude.eq(commerce.position.latitude),
            commerces::longitude.eq(commerce.position.longitude),
            commerces::image.eq(commerce.image.as_deref()),
            commerces::banking.eq(encode_banking(commerce)?),
            commerces::services.eq(serde_json::to_string(&commerce.services)?),
            commerces::balance.eq(commerce.balance),
            commerces::due_balance.eq(commerce.due_balance),
            commerces::last_billing.eq(format_date(commerce.last_billing)),
            commerces::billing_history.eq(serde_json::to_string(&commerce.billing_history)?),
            commerces::created_at.eq(format_timestamp(commerce.created_at)),
        ))
        .execute(conn)?;

    Ok(())
}

fn encode_banking(commerce: &Commerce) -> Result<Option<String>, PersistenceError> {
    Ok(commerce
        .banking
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}

/// Writes the patchable fields, subscriptions and due balance of a commerce.
///
/// The balance, billing date and billing history are left untouched.
///
/// # Errors
///
/// Returns an error if the commerce does not exist or the update fails.
pub fn update_commerce(
    conn: &mut SqliteConnection,
    commerce: &Commerce,
) -> Result<(), PersistenceError> {
    info!(commerce_id = %commerce.id, "Updating commerce");

    let updated: usize = diesel::update(commerces::table)
        .filter(commerces::id.eq(commerce.id.as_str()))
        .set((
            commerces::name.eq(&commerce.name),
            commerces::description.eq(&commerce.description),
            commerces::email.eq(&commerce.email),
            commerces::phone.eq(&commerce.phone),
            commerces::address.eq(serde_json::to_string(&commerce.address)?),
            commerces::latitude.eq(commerce.position.latitude),
            commerces::longitude.eq(commerce.position.longitude),
            commerces::image.eq(commerce.image.as_deref()),
            commerces::banking.eq(encode_banking(commerce)?),
            commerces::services.eq(serde_json::to_string(&commerce.services)?),
            commerces::due_balance.eq(commerce.due_balance),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "commerce {}",
            commerce.id
        )));
    }

    Ok(())
}

/// Records a successful billing pass.
///
/// In one transaction: the due balance is reset, the record appended to the
/// billing history, the billing date moved to `today`, and pending
/// subscription changes settled.
///
/// # Errors
///
/// Returns an error if the commerce does not exist or a write fails; no
/// change is kept in that case.
pub fn settle_billing(
    conn: &mut SqliteConnection,
    commerce_id: &EntityId,
    record: &BillingRecord,
    today: Date,
) -> Result<Commerce, PersistenceError> {
    info!(%commerce_id, amount = record.amount, "Settling billing");

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let mut commerce: Commerce = load_commerce(conn, commerce_id)?;

        settle_pending_changes(&mut commerce.services);
        commerce.billing_history.push(record.clone());
        commerce.due_balance = 0;
        commerce.last_billing = today;

        diesel::update(commerces::table)
            .filter(commerces::id.eq(commerce_id.as_str()))
            .set((
                commerces::services.eq(serde_json::to_string(&commerce.services)?),
                commerces::billing_history.eq(serde_json::to_string(&commerce.billing_history)?),
                commerces::due_balance.eq(0_i64),
                commerces::last_billing.eq(format_date(today)),
            ))
            .execute(conn)?;

        Ok(commerce)
    })
}

/// Credits every finished, not yet transferred commerce command to the
/// commerce balance and flags those commands as transferred.
///
/// Runs in one transaction, so a command is never credited twice.
///
/// # Errors
///
/// Returns an error if the commerce does not exist or a write fails.
pub fn transfer_done_commands(
    conn: &mut SqliteConnection,
    commerce_id: &EntityId,
) -> Result<TransferSummary, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let commerce: Commerce = load_commerce(conn, commerce_id)?;

        let pending: Vec<(String, i64)> = commerce_commands::table
            .filter(commerce_commands::commerce_id.eq(commerce_id.as_str()))
            .filter(commerce_commands::status.eq(CommandStatus::Done.as_str()))
            .filter(commerce_commands::transferred.eq(0))
            .select((commerce_commands::id, commerce_commands::price))
            .load(conn)?;

        let credited: i64 = pending.iter().map(|(_, price)| price).sum();
        let ids: Vec<&str> = pending.iter().map(|(id, _)| id.as_str()).collect();
        let transferred_commands: usize = ids.len();

        diesel::update(commerce_commands::table)
            .filter(commerce_commands::id.eq_any(ids))
            .set(commerce_commands::transferred.eq(1))
            .execute(conn)?;

        let balance: i64 = commerce.balance + credited;
        diesel::update(commerces::table)
            .filter(commerces::id.eq(commerce_id.as_str()))
            .set(commerces::balance.eq(balance))
            .execute(conn)?;

        debug!(%commerce_id, credited, balance, "Credited finished commerce commands");

        Ok(TransferSummary {
            transferred_commands,
            credited,
            balance,
        })
    })
}

/// Resets the balance of a commerce after a bank transfer was issued.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn reset_balance(
    conn: &mut SqliteConnection,
    commerce_id: &EntityId,
) -> Result<(), PersistenceError> {
    info!(%commerce_id, "Resetting commerce balance");

    diesel::update(commerces::table)
        .filter(commerces::id.eq(commerce_id.as_str()))
        .set(commerces::balance.eq(0_i64))
        .execute(conn)?;

    Ok(())
}
