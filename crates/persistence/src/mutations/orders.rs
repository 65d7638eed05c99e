// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Order mutations: checkout and commerce command status changes.

use diesel::prelude::*;
use localmarket_domain::{
    CommandStatus, CommerceCommand, EntityId, aggregate_command_status, format_timestamp,
};
use tracing::{debug, info};

use crate::data_models::{CheckoutData, CheckoutPart};
use crate::diesel_schema::{cc_commands, commands, commerce_commands, panier_commands, paniers};
use crate::error::PersistenceError;
use crate::queries::commerce_commands::{get_child_statuses, load_commerce_command};

/// Writes every record of a checkout in one transaction.
///
/// Panier quantities are decremented in the same transaction; a panier
/// without enough units left aborts the whole checkout.
///
/// # Errors
///
/// Returns `PersistenceError::InsufficientQuantity` if a panier ran out,
/// or another error if a write fails. No record is kept on error.
pub fn create_checkout(
    conn: &mut SqliteConnection,
    checkout: &CheckoutData,
) -> Result<(), PersistenceError> {
    let command_id: &EntityId = &checkout.command.id;
    info!(
        %command_id,
        user_id = %checkout.command.user_id,
        commerces = checkout.parts.len(),
        "Creating command"
    );

    conn.transaction::<_, PersistenceError, _>(|conn| {
        diesel::insert_into(commands::table)
            .values((
                commands::id.eq(command_id.as_str()),
                commands::user_id.eq(checkout.command.user_id.as_str()),
                commands::status.eq(checkout.command.status.as_str()),
                commands::created_at.eq(format_timestamp(checkout.command.created_at)),
            ))
            .execute(conn)?;

        for part in &checkout.parts {
            insert_part(conn, part)?;
        }
        Ok(())
    })
}

fn insert_part(conn: &mut SqliteConnection, part: &CheckoutPart) -> Result<(), PersistenceError> {
    let commerce_command: &CommerceCommand = &part.commerce_command;

    diesel::insert_into(commerce_commands::table)
        .values((
            commerce_commands::id.eq(commerce_command.id.as_str()),
            commerce_commands::command_id.eq(commerce_command.command_id.as_str()),
            commerce_commands::commerce_id.eq(commerce_command.commerce_id.as_str()),
            commerce_commands::user_id.eq(commerce_command.user_id.as_str()),
            commerce_commands::pickup_date.eq(format_timestamp(commerce_command.pickup_date)),
            commerce_commands::price.eq(commerce_command.price),
            commerce_commands::payment_method.eq(commerce_command.payment_method.as_str()),
            commerce_commands::status.eq(commerce_command.status.as_str()),
            commerce_commands::transferred.eq(i32::from(commerce_command.transferred)),
            commerce_commands::created_at.eq(format_timestamp(commerce_command.created_at)),
        ))
        .execute(conn)?;

    if let Some(cc_command) = &part.cc_command {
        diesel::insert_into(cc_commands::table)
            .values((
                cc_commands::id.eq(cc_command.id.as_str()),
                cc_commands::commerce_command_id.eq(cc_command.commerce_command_id.as_str()),
                cc_commands::items.eq(serde_json::to_string(&cc_command.items)?),
                cc_commands::pickup_date.eq(format_timestamp(cc_command.pickup_date)),
                cc_commands::created_at.eq(format_timestamp(cc_command.created_at)),
            ))
            .execute(conn)?;
    }

    for panier_command in &part.panier_commands {
        let requested: i64 = i64::from(panier_command.quantity);

        let decremented: usize = diesel::update(paniers::table)
            .filter(paniers::id.eq(panier_command.panier_id.as_str()))
            .filter(paniers::quantity.ge(requested))
            .set(paniers::quantity.eq(paniers::quantity - requested))
            .execute(conn)?;

        if decremented == 0 {
            let available: i64 = paniers::table
                .filter(paniers::id.eq(panier_command.panier_id.as_str()))
                .select(paniers::quantity)
                .first::<i64>(conn)
                .optional()?
                .unwrap_or(0);
            return Err(PersistenceError::InsufficientQuantity {
                panier_id: panier_command.panier_id.to_string(),
                requested,
                available,
            });
        }

        diesel::insert_into(panier_commands::table)
            .values((
                panier_commands::id.eq(panier_command.id.as_str()),
                panier_commands::commerce_command_id
                    .eq(panier_command.commerce_command_id.as_str()),
                panier_commands::panier_id.eq(panier_command.panier_id.as_str()),
                panier_commands::quantity.eq(requested),
                panier_commands::pickup_date.eq(format_timestamp(panier_command.pickup_date)),
                panier_commands::created_at.eq(format_timestamp(panier_command.created_at)),
            ))
            .execute(conn)?;
    }

    Ok(())
}

/// Changes the status of a commerce command and refreshes the cached status
/// of its parent command.
///
/// The transition check, the child write, the sibling read and the parent
/// write all run in one transaction, so two concurrent child updates cannot
/// leave a stale aggregate behind.
///
/// # Returns
///
/// The updated commerce command and the new aggregate status of its command.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the commerce command does not
/// exist, `PersistenceError::DomainViolation` if the transition is not
/// allowed, or another error if a write fails.
pub fn update_commerce_command_status(
    conn: &mut SqliteConnection,
    commerce_command_id: &EntityId,
    new_status: CommandStatus,
) -> Result<(CommerceCommand, CommandStatus), PersistenceError> {
    info!(%commerce_command_id, %new_status, "Updating commerce command status");

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let mut commerce_command: CommerceCommand =
            load_commerce_command(conn, commerce_command_id)?;
        commerce_command.status.validate_transition(new_status)?;

        diesel::update(commerce_commands::table)
            .filter(commerce_commands::id.eq(commerce_command_id.as_str()))
            .set(commerce_commands::status.eq(new_status.as_str()))
            .execute(conn)?;
        commerce_command.status = new_status;

        let statuses: Vec<CommandStatus> =
            get_child_statuses(conn, &commerce_command.command_id)?;
        let aggregate: CommandStatus = aggregate_command_status(&statuses);

        diesel::update(commands::table)
            .filter(commands::id.eq(commerce_command.command_id.as_str()))
            .set(commands::status.eq(aggregate.as_str()))
            .execute(conn)?;

        debug!(
            command_id = %commerce_command.command_id,
            %aggregate,
            "Refreshed command status"
        );

        Ok((commerce_command, aggregate))
    })
}
