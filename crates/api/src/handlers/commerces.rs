// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{
    Commerce, EntityId, PageRequest, Role, ServiceAction, ServiceUpdate, User,
    apply_commerce_patch, apply_service_update, current_timestamp, normalize_email,
    validate_commerce,
};
use localmarket_persistence::{CommerceFilter, PageSlice, Persistence};
use time::Date;
use tracing::{debug, info};

use super::{load_commerce, page_request, parse_id, parse_optional_id};
use crate::auth::{AuthenticatedUser, AuthorizationService};
use crate::config::ApiConfig;
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::pagination::Connection;
use crate::request_response::{
    CommerceConnection, CommerceView, CreateCommerceRequest, IdRequest, ListCommercesRequest,
    UpdateCommerceRequest, UpdateCommerceResponse,
};

/// Resolves the storekeeper a new commerce belongs to.
fn resolve_storekeeper(
    persistence: &mut Persistence,
    caller: &AuthenticatedUser,
    requested: Option<&str>,
) -> Result<EntityId, ApiError> {
    let requested: Option<EntityId> = parse_optional_id("storekeeperId", requested)?;

    if !caller.is_admin() {
        return match requested {
            Some(id) if id != caller.id => Err(ApiError::Unauthorized {
                action: String::from("create_commerce"),
                required_role: String::from("ADMIN to create a commerce for someone else"),
            }),
            _ => Ok(caller.id.clone()),
        };
    }

    let storekeeper_id: EntityId = requested.ok_or_else(|| ApiError::InvalidInput {
        field: String::from("storekeeperId"),
        message: String::from("An administrator must name the storekeeper"),
    })?;
    let storekeeper: User = persistence
        .get_user_by_id(&storekeeper_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("User", &storekeeper_id))?;
    if storekeeper.role != Role::Storekeeper {
        return Err(ApiError::InvalidInput {
            field: String::from("storekeeperId"),
            message: format!("User {storekeeper_id} is not a STOREKEEPER"),
        });
    }
    Ok(storekeeper_id)
}

/// Creates a commerce.
///
/// A storekeeper creates their own commerce; an administrator names the
/// storekeeper. Each storekeeper owns at most one commerce. Requested
/// services are subscribed with the usual prorated charge, and the billing
/// cycle starts `today`.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is anonymous or a plain user
/// - The named storekeeper does not exist or is not a `STOREKEEPER`
/// - The storekeeper already owns a commerce
/// - A field is invalid or a service is unknown
pub fn create_commerce(
    persistence: &mut Persistence,
    config: &ApiConfig,
    caller: Option<&AuthenticatedUser>,
    request: CreateCommerceRequest,
    today: Date,
) -> Result<CommerceView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "create_commerce")?;
    AuthorizationService::require_role(caller, Role::Storekeeper, "create_commerce")?;

    let storekeeper_id: EntityId =
        resolve_storekeeper(persistence, caller, request.storekeeper_id.as_deref())?;

    if persistence
        .get_commerce_by_storekeeper(&storekeeper_id)
        .map_err(translate_persistence_error)?
        .is_some()
    {
        return Err(ApiError::AlreadyExists {
            resource_type: String::from("Commerce"),
            message: format!("Storekeeper {storekeeper_id} already owns a commerce"),
        });
    }

    let mut commerce: Commerce = Commerce {
        id: EntityId::generate(),
        storekeeper_id,
        name: request.name,
        description: request.description,
        email: normalize_email(&request.email),
        phone: request.phone,
        address: request.address,
        position: request.position,
        image: request.image,
        banking: request.banking,
        services: Vec::new(),
        balance: 0,
        due_balance: 0,
        last_billing: today,
        billing_history: Vec::new(),
        created_at: current_timestamp(),
    };
    validate_commerce(&commerce).map_err(translate_domain_error)?;

    for service in &request.services {
        let update: ServiceUpdate = ServiceUpdate {
            service: service.service.clone(),
            tier: service.tier,
            action: ServiceAction::Add,
        };
        commerce.due_balance += apply_service_update(
            &mut commerce.services,
            &update,
            &config.catalog,
            commerce.last_billing,
            today,
        )
        .map_err(translate_domain_error)?;
    }

    persistence
        .create_commerce(&commerce)
        .map_err(translate_persistence_error)?;

    info!(
        commerce_id = %commerce.id,
        storekeeper_id = %commerce.storekeeper_id,
        due_balance = commerce.due_balance,
        "Created commerce"
    );

    Ok(CommerceView::new(&commerce, true))
}

/// Updates a commerce.
///
/// Scalar fields are overwritten; address and position are merged; the
/// image is set or removed; subscription changes are applied in order and
/// their prorated charge is added to the due balance.
///
/// # Errors
///
/// Returns an error if the caller is neither the owner nor an
/// administrator, the commerce does not exist, or the patch is rejected.
pub fn update_commerce(
    persistence: &mut Persistence,
    config: &ApiConfig,
    caller: Option<&AuthenticatedUser>,
    request: &UpdateCommerceRequest,
    today: Date,
) -> Result<UpdateCommerceResponse, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "update_commerce")?;
    let commerce_id: EntityId = parse_id("id", &request.id)?;

    let mut commerce: Commerce = load_commerce(persistence, &commerce_id)?;
    AuthorizationService::require_commerce_owner(caller, &commerce, "update_commerce")?;

    let charged: i64 = apply_commerce_patch(&mut commerce, &request.patch, &config.catalog, today)
        .map_err(translate_domain_error)?;

    persistence
        .update_commerce(&commerce)
        .map_err(translate_persistence_error)?;

    info!(
        commerce_id = %commerce.id,
        actor = %caller.id,
        charged,
        "Updated commerce"
    );

    Ok(UpdateCommerceResponse {
        commerce: CommerceView::new(&commerce, true),
        charged,
    })
}

/// Reads a commerce. Public.
///
/// # Errors
///
/// Returns an error if the identifier is malformed or the commerce does not
/// exist.
pub fn get_commerce(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &IdRequest,
) -> Result<CommerceView, ApiError> {
    let commerce_id: EntityId = parse_id("id", &request.id)?;
    debug!(commerce_id = %commerce_id, "Reading commerce");

    let commerce: Commerce = load_commerce(persistence, &commerce_id)?;
    Ok(CommerceView::new(
        &commerce,
        AuthorizationService::can_view_private(caller, &commerce),
    ))
}

/// Lists commerces, optionally by city and subscribed service. Public.
///
/// # Errors
///
/// Returns an error if the page arguments are invalid.
pub fn list_commerces(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &ListCommercesRequest,
) -> Result<CommerceConnection, ApiError> {
    let page: PageRequest = page_request(&request.page)?;
    debug!(city = ?request.city, service = ?request.service, "Listing commerces");

    let slice: PageSlice<Commerce> = persistence
        .list_commerces(
            &CommerceFilter {
                city: request.city.clone(),
                service: request.service.clone(),
            },
            &page,
        )
        .map_err(translate_persistence_error)?;

    Ok(Connection::from_slice(
        slice,
        &page,
        |commerce| &commerce.id,
        |commerce| {
            let private: bool = AuthorizationService::can_view_private(caller, &commerce);
            CommerceView::new(&commerce, private)
        },
    ))
}
