// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Service operations.
//!
//! Every operation is a free function taking the persistence handle, the
//! collaborators it needs, the optional caller and a request DTO. Operations
//! validate and authorize before any write.

mod catalog;
mod commerces;
mod orders;
mod routines;
mod services;
mod users;

pub use catalog::{
    create_panier, create_product, create_products, get_panier, get_product, list_paniers,
    list_products, update_panier, update_product, update_products,
};
pub use commerces::{create_commerce, get_commerce, list_commerces, update_commerce};
pub use orders::{
    create_command, get_command, get_commerce_command, list_cc_commands, list_commands,
    list_commerce_commands, list_panier_commands, update_commerce_command,
};
pub use routines::{run_banking_transfers, run_billing};
pub use services::{all_services_info, payment_methods, service_info};
pub use users::{create_user, get_user, list_users, login, logout, update_user};

use localmarket_domain::{Commerce, EntityId, PageRequest};
use localmarket_persistence::Persistence;
use tracing::warn;

use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::integrations::{EmailMessage, Integrations};
use crate::request_response::PageArgs;

/// Parses an identifier argument.
fn parse_id(field: &str, value: &str) -> Result<EntityId, ApiError> {
    EntityId::parse(value).map_err(|e| ApiError::InvalidInput {
        field: field.to_string(),
        message: e.to_string(),
    })
}

/// Parses an optional identifier argument.
fn parse_optional_id(field: &str, value: Option<&str>) -> Result<Option<EntityId>, ApiError> {
    value.map(|v| parse_id(field, v)).transpose()
}

/// Validates pagination arguments.
fn page_request(args: &PageArgs) -> Result<PageRequest, ApiError> {
    PageRequest::new(args.first, args.after.as_deref()).map_err(translate_domain_error)
}

/// Loads a commerce or fails with `ResourceNotFound`.
fn load_commerce(
    persistence: &mut Persistence,
    commerce_id: &EntityId,
) -> Result<Commerce, ApiError> {
    persistence
        .get_commerce_by_id(commerce_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("Commerce", commerce_id))
}

/// Sends an email without failing the operation.
///
/// The write that triggered the email is already committed, so delivery
/// failures are logged and dropped.
fn notify(integrations: &Integrations, message: &EmailMessage) {
    if let Err(e) = integrations.notifier.send(message) {
        warn!(
            to = %message.to,
            template = message.template.as_str(),
            error = %e,
            "Email delivery failed"
        );
    }
}
