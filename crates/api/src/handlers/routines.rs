// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Periodic batch operations: subscription billing and bank transfers.
//!
//! Both routines process commerces one at a time. A failure on one
//! commerce is logged and reported in the summary; the routine moves on.

use localmarket_domain::{
    BILLING_CYCLE_DAYS, BankingDetails, BillingRecord, Commerce, EntityId, Role,
    ServiceCatalog, User, billable_amount, current_timestamp, format_date,
};
use localmarket_persistence::{Persistence, TransferSummary};
use time::{Date, Duration, OffsetDateTime};
use tracing::{debug, error, info};

use super::{load_commerce, notify};
use crate::auth::{AuthenticatedUser, AuthorizationService};
use crate::config::ApiConfig;
use crate::error::{ApiError, translate_persistence_error};
use crate::integrations::{
    EmailMessage, EmailTemplate, Integrations, Invoice, InvoiceLine, TransferCard, format_amount,
};
use crate::request_response::{
    BankingRunResponse, BilledCommerce, BillingRunResponse, RoutineFailure, TransferView,
};

fn load_storekeeper(persistence: &mut Persistence, commerce: &Commerce) -> Result<User, ApiError> {
    persistence
        .get_user_by_id(&commerce.storekeeper_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("User", &commerce.storekeeper_id))
}

fn failure(commerce_id: &EntityId, err: &ApiError) -> RoutineFailure {
    RoutineFailure {
        commerce_id: commerce_id.to_string(),
        message: err.to_string(),
    }
}

/// Builds the invoice of a billing pass; the line amounts add up to the total.
fn build_invoice(
    commerce: &Commerce,
    catalog: &ServiceCatalog,
    commands_in_cycle: i64,
    today: Date,
) -> Invoice {
    let mut lines: Vec<InvoiceLine> = Vec::new();
    if commerce.due_balance != 0 {
        lines.push(InvoiceLine {
            label: String::from("Prorated subscription changes"),
            amount: commerce.due_balance,
        });
    }
    for entry in &commerce.services {
        let amount: i64 = billable_amount(std::slice::from_ref(entry), catalog, commands_in_cycle);
        let label: String = if entry.is_billed_per_command() {
            format!("{} ({commands_in_cycle} commands)", entry.code())
        } else {
            entry.code()
        };
        lines.push(InvoiceLine { label, amount });
    }
    let total: i64 = lines.iter().map(|line| line.amount).sum();

    Invoice {
        commerce_name: commerce.name.clone(),
        billed_on: format_date(today),
        lines,
        total,
    }
}

/// Bills one commerce whose cycle has ended.
fn bill_commerce(
    persistence: &mut Persistence,
    integrations: &Integrations,
    catalog: &ServiceCatalog,
    commerce: &Commerce,
    today: Date,
) -> Result<BilledCommerce, ApiError> {
    // Counted from the previous pass itself: each command is billed in one cycle only.
    let last_billed_at: Option<OffsetDateTime> = commerce
        .billing_history
        .iter()
        .map(|record| record.billed_at)
        .max();
    let commands_in_cycle: i64 = persistence
        .count_commerce_commands_since(&commerce.id, last_billed_at)
        .map_err(translate_persistence_error)?;
    let invoice: Invoice = build_invoice(commerce, catalog, commands_in_cycle, today);
    let services: Vec<String> = commerce.services.iter().map(|s| s.code()).collect();

    let mut email: Option<EmailMessage> = None;
    let charge_id: String = if invoice.total > 0 {
        let storekeeper: User = load_storekeeper(persistence, commerce)?;
        let customer_id: String =
            storekeeper
                .payment_customer_id
                .ok_or_else(|| ApiError::ExternalServiceFailure {
                    service: String::from("payments"),
                    message: format!("Storekeeper {} has no payment profile", storekeeper.id),
                })?;

        let pdf: Vec<u8> = integrations.invoices.render(&invoice)?;
        let charge_id: String = integrations.payments.charge(
            &customer_id,
            invoice.total,
            &format!("Subscriptions of {} until {}", commerce.name, invoice.billed_on),
        )?;

        email = Some(
            EmailMessage::new(&storekeeper.email, EmailTemplate::Invoice)
                .with_variable("commerceName", commerce.name.clone())
                .with_variable("amount", format_amount(invoice.total))
                .with_attachment(&format!("invoice-{}.pdf", invoice.billed_on), pdf),
        );
        charge_id
    } else {
        String::new()
    };

    let record: BillingRecord = BillingRecord {
        billed_at: current_timestamp(),
        amount: invoice.total,
        services: services.clone(),
        charge_id: charge_id.clone(),
    };
    persistence
        .settle_billing(&commerce.id, &record, today)
        .map_err(|e| {
            error!(
                commerce_id = %commerce.id,
                charge_id = %charge_id,
                "Charged commerce but could not record the billing"
            );
            translate_persistence_error(e)
        })?;

    if let Some(message) = email {
        notify(integrations, &message);
    }

    info!(
        commerce_id = %commerce.id,
        amount = invoice.total,
        commands_in_cycle,
        "Billed commerce"
    );

    Ok(BilledCommerce {
        commerce_id: commerce.id.to_string(),
        amount: invoice.total,
        services,
        charge_id,
    })
}

/// Bills every commerce whose billing anchor is on or before `today`.
///
/// The amount is the due balance plus the monthly price of every monthly
/// entry and the per-command price of every consumption entry times the
/// commerce commands received since the last billing. Positive amounts are
/// invoiced and charged; the billing is then settled in one transaction.
///
/// # Errors
///
/// Returns an error if the caller is not an administrator or the list of
/// due commerces cannot be read. Per-commerce failures are reported in the
/// response.
pub fn run_billing(
    persistence: &mut Persistence,
    integrations: &Integrations,
    config: &ApiConfig,
    caller: Option<&AuthenticatedUser>,
    today: Date,
) -> Result<BillingRunResponse, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "run_billing")?;
    AuthorizationService::require_role(caller, Role::Admin, "run_billing")?;

    let cutoff: Date = today
        .checked_sub(Duration::days(BILLING_CYCLE_DAYS))
        .ok_or_else(|| ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("{today} is out of range"),
        })?;
    let due: Vec<Commerce> = persistence
        .list_commerces_billed_before(cutoff)
        .map_err(translate_persistence_error)?;
    info!(%today, due = due.len(), "Starting billing run");

    let mut response: BillingRunResponse = BillingRunResponse::default();
    for commerce in &due {
        match bill_commerce(persistence, integrations, &config.catalog, commerce, today) {
            Ok(billed) => response.billed.push(billed),
            Err(e) => {
                error!(commerce_id = %commerce.id, error = %e, "Billing failed");
                response.failures.push(failure(&commerce.id, &e));
            }
        }
    }

    info!(
        billed = response.billed.len(),
        failed = response.failures.len(),
        "Billing run finished"
    );
    Ok(response)
}

/// Credits finished orders to one commerce and posts a transfer card when
/// money is owed to it.
fn transfer_commerce(
    persistence: &mut Persistence,
    integrations: &Integrations,
    commerce_id: &EntityId,
) -> Result<TransferView, ApiError> {
    let summary: TransferSummary = persistence
        .transfer_done_commands(commerce_id)
        .map_err(translate_persistence_error)?;
    let commerce: Commerce = load_commerce(persistence, commerce_id)?;

    let mut view: TransferView = TransferView {
        commerce_id: commerce_id.to_string(),
        transferred_commands: summary.transferred_commands,
        amount: 0,
        card_id: None,
    };

    if summary.balance <= 0 {
        return Ok(view);
    }
    let Some(banking) = &commerce.banking else {
        debug!(
            commerce_id = %commerce.id,
            balance = summary.balance,
            "No banking details, balance kept"
        );
        return Ok(view);
    };

    let storekeeper: User = load_storekeeper(persistence, &commerce)?;
    let BankingDetails { holder, iban, bic } = banking;
    let card_id: String = integrations.banking_board.create_card(&TransferCard {
        commerce_name: commerce.name.clone(),
        holder: holder.clone(),
        iban: iban.clone(),
        bic: bic.clone(),
        amount: summary.balance,
    })?;

    persistence
        .reset_balance(&commerce.id)
        .map_err(translate_persistence_error)?;

    notify(
        integrations,
        &EmailMessage::new(&storekeeper.email, EmailTemplate::BankTransfer)
            .with_variable("commerceName", commerce.name.clone())
            .with_variable("amount", format_amount(summary.balance)),
    );

    info!(
        commerce_id = %commerce.id,
        amount = summary.balance,
        card_id = %card_id,
        "Transfer card created"
    );

    view.amount = summary.balance;
    view.card_id = Some(card_id);
    Ok(view)
}

/// Credits every finished, not yet transferred commerce command to its
/// commerce balance, then posts a transfer card for each commerce with a
/// positive balance and banking details.
///
/// Commerces with nothing to report are left out of the response.
///
/// # Errors
///
/// Returns an error if the caller is not an administrator or the list of
/// commerces cannot be read. Per-commerce failures are reported in the
/// response.
pub fn run_banking_transfers(
    persistence: &mut Persistence,
    integrations: &Integrations,
    caller: Option<&AuthenticatedUser>,
) -> Result<BankingRunResponse, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "run_banking_transfers")?;
    AuthorizationService::require_role(caller, Role::Admin, "run_banking_transfers")?;

    let commerce_ids: Vec<EntityId> = persistence
        .list_commerce_ids()
        .map_err(translate_persistence_error)?;
    info!(commerces = commerce_ids.len(), "Starting banking run");

    let mut response: BankingRunResponse = BankingRunResponse::default();
    for commerce_id in &commerce_ids {
        match transfer_commerce(persistence, integrations, commerce_id) {
            Ok(view) if view.transferred_commands > 0 || view.card_id.is_some() => {
                response.transfers.push(view);
            }
            Ok(_) => {}
            Err(e) => {
                error!(commerce_id = %commerce_id, error = %e, "Banking transfer failed");
                response.failures.push(failure(commerce_id, &e));
            }
        }
    }

    info!(
        transfers = response.transfers.len(),
        failed = response.failures.len(),
        "Banking run finished"
    );
    Ok(response)
}
