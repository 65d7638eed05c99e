// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use localmarket_domain::{
    CcCommand, Command, CommandStatus, Commerce, CommerceCommand, EntityId, LineItem,
    PageRequest, Panier, PanierCommand, PaymentMethod, Product, User, aggregate_command_status,
    current_timestamp, format_timestamp, parse_timestamp, validate_quantity,
};
use localmarket_persistence::{
    CheckoutData, CheckoutPart, CommandFilter, CommerceCommandFilter, PageSlice, Persistence,
};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::{load_commerce, notify, page_request, parse_id, parse_optional_id};
use crate::auth::{AuthenticatedUser, AuthorizationService};
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::integrations::{EmailMessage, EmailTemplate, Integrations, format_amount};
use crate::pagination::Connection;
use crate::request_response::{
    CcCommandConnection, CcCommandView, CommandConnection, CommandView, CommerceCommandConnection,
    CommerceCommandView, CommerceOrderInput, CreateCommandRequest, CreateCommandResponse,
    IdRequest, ListChildCommandsRequest, ListCommandsRequest, ListCommerceCommandsRequest,
    PanierCommandConnection, PanierCommandView, UpdateCommerceCommandRequest,
    UpdateCommerceCommandResponse,
};

fn invalid(field: String, message: String) -> ApiError {
    ApiError::InvalidInput { field, message }
}

fn load_user(persistence: &mut Persistence, user_id: &EntityId) -> Result<User, ApiError> {
    persistence
        .get_user_by_id(user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("User", user_id))
}

fn load_command(persistence: &mut Persistence, command_id: &EntityId) -> Result<Command, ApiError> {
    persistence
        .get_command_by_id(command_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("Command", command_id))
}

fn load_commerce_command(
    persistence: &mut Persistence,
    commerce_command_id: &EntityId,
) -> Result<CommerceCommand, ApiError> {
    persistence
        .get_commerce_command_by_id(commerce_command_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("CommerceCommand", commerce_command_id))
}

/// Recomputes the status of a command from its children.
fn command_status(
    persistence: &mut Persistence,
    command_id: &EntityId,
) -> Result<CommandStatus, ApiError> {
    let children: Vec<CommandStatus> = persistence
        .get_child_statuses(command_id)
        .map_err(translate_persistence_error)?;
    Ok(aggregate_command_status(&children))
}

/// Checks that the caller ordered the commerce command, owns its commerce,
/// or is an administrator.
fn authorize_commerce_command_read(
    persistence: &mut Persistence,
    caller: &AuthenticatedUser,
    commerce_command: &CommerceCommand,
    action: &str,
) -> Result<(), ApiError> {
    if caller.is_admin() || commerce_command.user_id == caller.id {
        return Ok(());
    }
    let commerce: Commerce = load_commerce(persistence, &commerce_command.commerce_id)?;
    AuthorizationService::require_commerce_owner(caller, &commerce, action)?;
    Ok(())
}

/// Validates one commerce part of an order and builds its records.
///
/// Prices come from the current product and panier prices.
fn build_part(
    persistence: &mut Persistence,
    command: &Command,
    index: usize,
    order: &CommerceOrderInput,
    now: OffsetDateTime,
) -> Result<CheckoutPart, ApiError> {
    let field = |name: &str| format!("orders[{index}].{name}");

    let commerce_id: EntityId = parse_id(&field("commerceId"), &order.commerce_id)?;
    let commerce: Commerce = load_commerce(persistence, &commerce_id)?;

    let pickup_date: OffsetDateTime = parse_timestamp(&order.pickup_date)
        .map_err(|e| invalid(field("pickupDate"), e.to_string()))?;
    if pickup_date < now {
        return Err(invalid(
            field("pickupDate"),
            String::from("The pickup date is in the past"),
        ));
    }

    if order.products.is_empty() && order.paniers.is_empty() {
        return Err(invalid(
            field("products"),
            String::from("Each order needs at least one product or panier"),
        ));
    }

    // Products
    let mut product_ids: Vec<EntityId> = Vec::with_capacity(order.products.len());
    for (line, input) in order.products.iter().enumerate() {
        let product_field: String = field(&format!("products[{line}]"));
        product_ids.push(parse_id(&format!("{product_field}.productId"), &input.product_id)?);
        validate_quantity("quantity", i64::from(input.quantity))
            .map_err(|e| invalid(format!("{product_field}.quantity"), e.to_string()))?;
    }
    let products: HashMap<EntityId, Product> = persistence
        .get_products_by_ids(&product_ids)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(|product| (product.id.clone(), product))
        .collect();

    let mut items: Vec<LineItem> = Vec::with_capacity(product_ids.len());
    for (product_id, input) in product_ids.into_iter().zip(&order.products) {
        let product: &Product = products
            .get(&product_id)
            .ok_or_else(|| ApiError::not_found("Product", &product_id))?;
        if product.commerce_id != commerce.id {
            return Err(invalid(
                field("products"),
                format!("Product {product_id} is not sold by commerce {}", commerce.id),
            ));
        }
        if !product.is_available {
            return Err(invalid(
                field("products"),
                format!("Product {product_id} is not available"),
            ));
        }
        items.push(LineItem {
            product_id,
            quantity: input.quantity,
            unit_price: product.price,
        });
    }

    // Paniers
    let mut requested: BTreeMap<EntityId, u32> = BTreeMap::new();
    let mut panier_lines: Vec<(Panier, u32)> = Vec::with_capacity(order.paniers.len());
    for (line, input) in order.paniers.iter().enumerate() {
        let panier_field: String = field(&format!("paniers[{line}]"));
        let panier_id: EntityId = parse_id(&format!("{panier_field}.panierId"), &input.panier_id)?;
        validate_quantity("quantity", i64::from(input.quantity))
            .map_err(|e| invalid(format!("{panier_field}.quantity"), e.to_string()))?;

        let panier: Panier = persistence
            .get_panier_by_id(&panier_id)
            .map_err(translate_persistence_error)?
            .ok_or_else(|| ApiError::not_found("Panier", &panier_id))?;
        if panier.commerce_id != commerce.id {
            return Err(invalid(
                field("paniers"),
                format!("Panier {panier_id} is not sold by commerce {}", commerce.id),
            ));
        }

        let total: &mut u32 = requested.entry(panier_id.clone()).or_insert(0);
        *total = total.saturating_add(input.quantity);
        if i64::from(*total) > panier.quantity {
            return Err(invalid(
                format!("{panier_field}.quantity"),
                format!(
                    "Panier {panier_id} has {} units left, {total} requested",
                    panier.quantity
                ),
            ));
        }
        panier_lines.push((panier, input.quantity));
    }

    let cc_price: i64 = items.iter().map(LineItem::total).sum();
    let panier_price: i64 = panier_lines
        .iter()
        .map(|(panier, quantity)| panier.price * i64::from(*quantity))
        .sum();

    let commerce_command_id: EntityId = EntityId::generate();
    let cc_command: Option<CcCommand> = (!items.is_empty()).then(|| CcCommand {
        id: EntityId::generate(),
        commerce_command_id: commerce_command_id.clone(),
        items,
        pickup_date,
        created_at: now,
    });
    let panier_commands: Vec<PanierCommand> = panier_lines
        .into_iter()
        .map(|(panier, quantity)| PanierCommand {
            id: EntityId::generate(),
            commerce_command_id: commerce_command_id.clone(),
            panier_id: panier.id,
            quantity,
            pickup_date,
            created_at: now,
        })
        .collect();

    Ok(CheckoutPart {
        commerce_command: CommerceCommand {
            id: commerce_command_id,
            command_id: command.id.clone(),
            commerce_id: commerce.id,
            user_id: command.user_id.clone(),
            pickup_date,
            price: cc_price + panier_price,
            payment_method: order.payment_method,
            status: CommandStatus::InProgress,
            transferred: false,
            created_at: now,
        },
        cc_command,
        panier_commands,
    })
}

/// Places an order, split into one commerce command per commerce.
///
/// Every line is validated before anything is written. Card parts are
/// paid through the payment provider before the records are written, in
/// one transaction that also decrements panier stock.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is anonymous
/// - The order is empty or names a commerce twice
/// - A commerce, product or panier does not exist
/// - A product is unavailable or sold by another commerce
/// - A panier does not have enough units left
/// - A pickup date is malformed or in the past
/// - The card payment is refused
pub fn create_command(
    persistence: &mut Persistence,
    integrations: &Integrations,
    caller: Option<&AuthenticatedUser>,
    request: &CreateCommandRequest,
) -> Result<CreateCommandResponse, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "create_command")?;

    if request.orders.is_empty() {
        return Err(invalid(
            String::from("orders"),
            String::from("An order needs at least one commerce"),
        ));
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (index, order) in request.orders.iter().enumerate() {
        if !seen.insert(order.commerce_id.as_str()) {
            return Err(invalid(
                format!("orders[{index}].commerceId"),
                format!("Commerce {} appears twice", order.commerce_id),
            ));
        }
    }

    let now: OffsetDateTime = current_timestamp();
    let command: Command = Command {
        id: EntityId::generate(),
        user_id: caller.id.clone(),
        status: CommandStatus::InProgress,
        created_at: now,
    };

    let mut parts: Vec<CheckoutPart> = Vec::with_capacity(request.orders.len());
    for (index, order) in request.orders.iter().enumerate() {
        parts.push(build_part(persistence, &command, index, order, now)?);
    }

    let card_total: i64 = parts
        .iter()
        .filter(|part| part.commerce_command.payment_method == PaymentMethod::Card)
        .map(|part| part.commerce_command.price)
        .sum();

    if card_total > 0 {
        let buyer: User = load_user(persistence, &caller.id)?;
        let customer_id: String = buyer.payment_customer_id.ok_or_else(|| {
            invalid(
                String::from("paymentMethod"),
                String::from("The account has no payment profile"),
            )
        })?;
        let intent_id: String = integrations.payments.create_payment_intent(
            &customer_id,
            card_total,
            request.payment_method_id.as_deref(),
        )?;
        integrations.payments.confirm_payment_intent(&intent_id)?;
        info!(
            command_id = %command.id,
            intent_id = %intent_id,
            amount = card_total,
            "Card payment confirmed"
        );
    }

    let checkout: CheckoutData = CheckoutData { command, parts };
    persistence
        .create_checkout(&checkout)
        .map_err(translate_persistence_error)?;

    let total: i64 = checkout
        .parts
        .iter()
        .map(|part| part.commerce_command.price)
        .sum();
    info!(
        command_id = %checkout.command.id,
        user_id = %caller.id,
        commerces = checkout.parts.len(),
        total,
        "Created command"
    );

    notify(
        integrations,
        &EmailMessage::new(&caller.email, EmailTemplate::CommandConfirmation)
            .with_variable("commandId", checkout.command.id.to_string())
            .with_variable("total", format_amount(total)),
    );

    Ok(CreateCommandResponse {
        command: CommandView::with_status(&checkout.command, CommandStatus::InProgress),
        commerce_commands: checkout
            .parts
            .iter()
            .map(|part| CommerceCommandView::from(&part.commerce_command))
            .collect(),
        card_total,
    })
}

/// Reads a command with its status recomputed from its children.
///
/// # Errors
///
/// Returns an error if the caller is neither the buyer nor an
/// administrator, or the command does not exist.
pub fn get_command(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &IdRequest,
) -> Result<CommandView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "command")?;
    let command_id: EntityId = parse_id("id", &request.id)?;

    let command: Command = load_command(persistence, &command_id)?;
    AuthorizationService::require_self_or_admin(caller, &command.user_id, "command")?;

    let status: CommandStatus = command_status(persistence, &command.id)?;
    debug!(command_id = %command.id, status = %status, "Reading command");
    Ok(CommandView::with_status(&command, status))
}

/// Lists commands: the caller's own, or any user's for administrators.
///
/// # Errors
///
/// Returns an error if a non-administrator asks for another user's
/// commands or an argument is malformed.
pub fn list_commands(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &ListCommandsRequest,
) -> Result<CommandConnection, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "commands")?;
    let requested: Option<EntityId> = parse_optional_id("userId", request.user_id.as_deref())?;

    let user_id: Option<EntityId> = if caller.is_admin() {
        requested
    } else {
        if let Some(user_id) = &requested {
            AuthorizationService::require_self_or_admin(caller, user_id, "commands")?;
        }
        Some(caller.id.clone())
    };

    let page: PageRequest = page_request(&request.page)?;
    debug!(user_id = ?user_id, first = page.first, "Listing commands");

    let slice: PageSlice<Command> = persistence
        .list_commands(&CommandFilter { user_id }, &page)
        .map_err(translate_persistence_error)?;

    Connection::try_from_slice(
        slice,
        &page,
        |command| &command.id,
        |command| {
            let status: CommandStatus = command_status(persistence, &command.id)?;
            Ok(CommandView::with_status(&command, status))
        },
    )
}

/// Lists commerce commands.
///
/// Administrators may use any filter. Storekeepers see their own commerce
/// by default. Buyers may list the parts of one of their commands.
///
/// # Errors
///
/// Returns an error if the caller may not see the requested scope or an
/// argument is malformed.
pub fn list_commerce_commands(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &ListCommerceCommandsRequest,
) -> Result<CommerceCommandConnection, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "commerce_commands")?;

    let mut commerce_id: Option<EntityId> =
        parse_optional_id("commerceId", request.commerce_id.as_deref())?;
    let command_id: Option<EntityId> =
        parse_optional_id("commandId", request.command_id.as_deref())?;

    if !caller.is_admin() {
        if let Some(id) = &commerce_id {
            let commerce: Commerce = load_commerce(persistence, id)?;
            AuthorizationService::require_commerce_owner(caller, &commerce, "commerce_commands")?;
        } else if let Some(id) = &command_id {
            let command: Command = load_command(persistence, id)?;
            AuthorizationService::require_self_or_admin(
                caller,
                &command.user_id,
                "commerce_commands",
            )?;
        } else {
            let own: Option<Commerce> = persistence
                .get_commerce_by_storekeeper(&caller.id)
                .map_err(translate_persistence_error)?;
            let own: Commerce = own.ok_or_else(|| ApiError::Unauthorized {
                action: String::from("commerce_commands"),
                required_role: String::from("the commerce owner or ADMIN"),
            })?;
            commerce_id = Some(own.id);
        }
    }

    let parse_bound = |name: &str, value: Option<&str>| {
        value
            .map(|v| parse_timestamp(v).map_err(|e| invalid(name.to_string(), e.to_string())))
            .transpose()
    };
    let filter: CommerceCommandFilter = CommerceCommandFilter {
        commerce_id,
        command_id,
        status: request.status,
        pickup_from: parse_bound("pickupFrom", request.pickup_from.as_deref())?,
        pickup_until: parse_bound("pickupUntil", request.pickup_until.as_deref())?,
    };

    let page: PageRequest = page_request(&request.page)?;
    debug!(?filter, first = page.first, "Listing commerce commands");

    let slice: PageSlice<CommerceCommand> = persistence
        .list_commerce_commands(&filter, &page)
        .map_err(translate_persistence_error)?;

    Ok(Connection::from_slice(
        slice,
        &page,
        |cc| &cc.id,
        |cc| CommerceCommandView::from(&cc),
    ))
}

/// Reads a commerce command.
///
/// # Errors
///
/// Returns an error if the caller is not the buyer, the commerce owner or
/// an administrator, or the commerce command does not exist.
pub fn get_commerce_command(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &IdRequest,
) -> Result<CommerceCommandView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "commerce_command")?;
    let id: EntityId = parse_id("id", &request.id)?;

    let commerce_command: CommerceCommand = load_commerce_command(persistence, &id)?;
    authorize_commerce_command_read(persistence, caller, &commerce_command, "commerce_command")?;

    debug!(commerce_command_id = %id, "Reading commerce command");
    Ok(CommerceCommandView::from(&commerce_command))
}

/// Changes the status of a commerce command.
///
/// The parent command's status is recomputed in the same transaction. A
/// change to `READY` emails the buyer.
///
/// # Errors
///
/// Returns an error if the caller does not own the commerce and is not an
/// administrator, the commerce command does not exist, or the transition
/// is not allowed.
pub fn update_commerce_command(
    persistence: &mut Persistence,
    integrations: &Integrations,
    caller: Option<&AuthenticatedUser>,
    request: &UpdateCommerceCommandRequest,
) -> Result<UpdateCommerceCommandResponse, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "update_commerce_command")?;
    let id: EntityId = parse_id("id", &request.id)?;

    let existing: CommerceCommand = load_commerce_command(persistence, &id)?;
    let commerce: Commerce = load_commerce(persistence, &existing.commerce_id)?;
    AuthorizationService::require_commerce_owner(caller, &commerce, "update_commerce_command")?;

    existing
        .status
        .validate_transition(request.status)
        .map_err(translate_domain_error)?;

    let (updated, command_status): (CommerceCommand, CommandStatus) = persistence
        .update_commerce_command_status(&id, request.status)
        .map_err(translate_persistence_error)?;

    info!(
        commerce_command_id = %updated.id,
        from = %existing.status,
        to = %updated.status,
        command_status = %command_status,
        actor = %caller.id,
        "Updated commerce command status"
    );

    if updated.status == CommandStatus::Ready {
        let buyer: User = load_user(persistence, &updated.user_id)?;
        notify(
            integrations,
            &EmailMessage::new(&buyer.email, EmailTemplate::CommandReady)
                .with_variable("commerceName", commerce.name.clone())
                .with_variable("pickupDate", format_timestamp(updated.pickup_date)),
        );
    }

    Ok(UpdateCommerceCommandResponse {
        commerce_command: CommerceCommandView::from(&updated),
        command_status,
    })
}

/// Lists the click-and-collect commands of a commerce command.
///
/// # Errors
///
/// Returns an error if the caller may not see the commerce command or an
/// argument is malformed.
pub fn list_cc_commands(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &ListChildCommandsRequest,
) -> Result<CcCommandConnection, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "cc_commands")?;
    let id: EntityId = parse_id("commerceCommandId", &request.commerce_command_id)?;

    let commerce_command: CommerceCommand = load_commerce_command(persistence, &id)?;
    authorize_commerce_command_read(persistence, caller, &commerce_command, "cc_commands")?;

    let page: PageRequest = page_request(&request.page)?;
    debug!(commerce_command_id = %id, "Listing click-and-collect commands");

    let slice: PageSlice<CcCommand> = persistence
        .list_cc_commands(&id, &page)
        .map_err(translate_persistence_error)?;

    Ok(Connection::from_slice(
        slice,
        &page,
        |command| &command.id,
        |command| CcCommandView::from(&command),
    ))
}

/// Lists the panier commands of a commerce command.
///
/// # Errors
///
/// Returns an error if the caller may not see the commerce command or an
/// argument is malformed.
pub fn list_panier_commands(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &ListChildCommandsRequest,
) -> Result<PanierCommandConnection, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "panier_commands")?;
    let id: EntityId = parse_id("commerceCommandId", &request.commerce_command_id)?;

    let commerce_command: CommerceCommand = load_commerce_command(persistence, &id)?;
    authorize_commerce_command_read(persistence, caller, &commerce_command, "panier_commands")?;

    let page: PageRequest = page_request(&request.page)?;
    debug!(commerce_command_id = %id, "Listing panier commands");

    let slice: PageSlice<PanierCommand> = persistence
        .list_panier_commands(&id, &page)
        .map_err(translate_persistence_error)?;

    Ok(Connection::from_slice(
        slice,
        &page,
        |command| &command.id,
        |command| PanierCommandView::from(&command),
    ))
}
