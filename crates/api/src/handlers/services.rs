// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{ServiceInfo, User};
use localmarket_persistence::Persistence;
use tracing::debug;

use crate::auth::{AuthenticatedUser, AuthorizationService};
use crate::config::ApiConfig;
use crate::error::{ApiError, translate_persistence_error};
use crate::integrations::{Integrations, PaymentMethodSummary};
use crate::request_response::{ServiceInfoRequest, ServiceInfoView};

/// Lists the service catalog. Public.
#[must_use]
pub fn all_services_info(config: &ApiConfig) -> Vec<ServiceInfoView> {
    config
        .catalog
        .services()
        .iter()
        .map(ServiceInfoView::from)
        .collect()
}

/// Reads one catalog service by name, case-insensitively. Public.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the service is not in the catalog.
pub fn service_info(
    config: &ApiConfig,
    request: &ServiceInfoRequest,
) -> Result<ServiceInfoView, ApiError> {
    let info: &ServiceInfo =
        config
            .catalog
            .find(&request.name)
            .ok_or_else(|| ApiError::ResourceNotFound {
                resource_type: String::from("Service"),
                message: format!("Service '{}' is not part of the catalog", request.name),
            })?;
    Ok(ServiceInfoView::from(info))
}

/// Lists the caller's stored payment methods.
///
/// Accounts without a payment profile have none.
///
/// # Errors
///
/// Returns an error if the caller is anonymous or the payment provider
/// fails.
pub fn payment_methods(
    persistence: &mut Persistence,
    integrations: &Integrations,
    caller: Option<&AuthenticatedUser>,
) -> Result<Vec<PaymentMethodSummary>, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "payment_methods")?;

    let user: User = persistence
        .get_user_by_id(&caller.id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("User", &caller.id))?;

    let Some(customer_id) = user.payment_customer_id else {
        debug!(user_id = %user.id, "No payment profile");
        return Ok(Vec::new());
    };

    Ok(integrations.payments.list_payment_methods(&customer_id)?)
}
