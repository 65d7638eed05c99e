// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{
    EntityId, PageRequest, Role, User, apply_user_patch, format_timestamp, normalize_email,
    validate_email, validate_name,
};
use localmarket_persistence::{NewUserData, PageSlice, Persistence, UserFilter};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::{notify, page_request, parse_optional_id};
use crate::auth::{AuthenticatedUser, AuthenticationService, AuthorizationService};
use crate::config::ApiConfig;
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::integrations::{EmailMessage, EmailTemplate, Integrations};
use crate::pagination::Connection;
use crate::request_response::{
    CreateUserRequest, GetUserRequest, ListUsersRequest, LoginRequest, LoginResponse,
    MessageResponse, UpdateUserRequest, UserConnection, UserView,
};

/// Creates a user account.
///
/// Anyone may create a `USER` account; other roles require an administrator.
/// The payment provider customer is created before the account is written,
/// and a welcome email is sent afterwards.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `integrations` - External providers
/// * `config` - Runtime settings (password policy)
/// * `caller` - The authenticated caller, if any
/// * `request` - The account fields
///
/// # Errors
///
/// Returns an error if:
/// - A non-`USER` role is requested by anyone but an administrator
/// - The email or names are invalid
/// - The password violates the policy
/// - The email is already taken, in any case
/// - The payment provider rejects the customer
pub fn create_user(
    persistence: &mut Persistence,
    integrations: &Integrations,
    config: &ApiConfig,
    caller: Option<&AuthenticatedUser>,
    request: CreateUserRequest,
) -> Result<UserView, ApiError> {
    let role: Role = request.role.unwrap_or(Role::User);
    if role != Role::User {
        let caller: &AuthenticatedUser =
            AuthorizationService::require_authenticated(caller, "create_user")?;
        AuthorizationService::require_role(caller, Role::Admin, "create_user")?;
    }

    let email: String = normalize_email(&request.email);
    validate_email(&email).map_err(translate_domain_error)?;
    validate_name("first name", &request.first_name).map_err(translate_domain_error)?;
    validate_name("last name", &request.last_name).map_err(translate_domain_error)?;
    config.password_policy.validate(
        &request.password,
        &email,
        &request.first_name,
        &request.last_name,
    )?;

    if persistence
        .get_user_by_email(&email)
        .map_err(translate_persistence_error)?
        .is_some()
    {
        return Err(ApiError::AlreadyExists {
            resource_type: String::from("User"),
            message: format!("An account already uses {email}"),
        });
    }

    let customer_id: String = integrations.payments.create_customer(
        &email,
        &format!("{} {}", request.first_name, request.last_name),
    )?;

    let user: User = persistence
        .create_user(&NewUserData {
            email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            role,
            payment_customer_id: Some(customer_id),
        })
        .map_err(translate_persistence_error)?;

    info!(user_id = %user.id, role = %user.role, "Created user");

    notify(
        integrations,
        &EmailMessage::new(&user.email, EmailTemplate::Welcome)
            .with_variable("firstName", user.first_name.clone()),
    );

    Ok(UserView::from(&user))
}

/// Logs a user in and returns a bearer token.
///
/// # Errors
///
/// Returns `AuthenticationFailed` for an unknown email or a wrong password.
pub fn login(
    persistence: &mut Persistence,
    config: &ApiConfig,
    request: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let (token, user, expires_at): (String, User, OffsetDateTime) =
        AuthenticationService::login(persistence, config, &request.email, &request.password)?;

    Ok(LoginResponse {
        token,
        expires_at: format_timestamp(expires_at),
        user: UserView::from(&user),
    })
}

/// Ends the session of the presented token.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub fn logout(
    persistence: &mut Persistence,
    session_token: &str,
) -> Result<MessageResponse, ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(MessageResponse {
        message: String::from("Logged out"),
    })
}

/// Updates a user.
///
/// Users may update themselves; administrators may update anyone and are
/// the only ones allowed to change a role. A password change ends every
/// session of the user.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is anonymous, or neither the user nor an administrator
/// - A non-administrator changes a role
/// - The user does not exist
/// - A field is invalid, the new email is taken, or the new password
///   violates the policy
pub fn update_user(
    persistence: &mut Persistence,
    config: &ApiConfig,
    caller: Option<&AuthenticatedUser>,
    request: &UpdateUserRequest,
) -> Result<UserView, ApiError> {
    let caller: &AuthenticatedUser =
        AuthorizationService::require_authenticated(caller, "update_user")?;
    let user_id: EntityId =
        parse_optional_id("id", request.id.as_deref())?.unwrap_or_else(|| caller.id.clone());
    AuthorizationService::require_self_or_admin(caller, &user_id, "update_user")?;

    let mut user: User = persistence
        .get_user_by_id(&user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("User", &user_id))?;

    if request.patch.changes_role(&user) {
        AuthorizationService::require_role(caller, Role::Admin, "change_role")?;
    }

    let previous_email: String = user.email.clone();
    apply_user_patch(&mut user, &request.patch).map_err(translate_domain_error)?;

    if user.email != previous_email
        && persistence
            .get_user_by_email(&user.email)
            .map_err(translate_persistence_error)?
            .is_some()
    {
        return Err(ApiError::AlreadyExists {
            resource_type: String::from("User"),
            message: format!("An account already uses {}", user.email),
        });
    }

    if let Some(password) = &request.patch.password {
        config
            .password_policy
            .validate(password, &user.email, &user.first_name, &user.last_name)?;
    }

    persistence
        .update_user(&user, request.patch.password.as_deref())
        .map_err(translate_persistence_error)?;

    if request.patch.password.is_some() {
        let closed: usize = persistence
            .delete_sessions_for_user(&user.id)
            .map_err(translate_persistence_error)?;
        info!(user_id = %user.id, closed_sessions = closed, "Password changed");
    }

    info!(user_id = %user.id, actor = %caller.id, "Updated user");
    Ok(UserView::from(&user))
}

/// Reads a user, the caller by default.
///
/// # Errors
///
/// Returns an error if the caller is anonymous, is neither the user nor an
/// administrator, or the user does not exist.
pub fn get_user(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &GetUserRequest,
) -> Result<UserView, ApiError> {
    let caller: &AuthenticatedUser = AuthorizationService::require_authenticated(caller, "user")?;
    let user_id: EntityId =
        parse_optional_id("id", request.id.as_deref())?.unwrap_or_else(|| caller.id.clone());
    AuthorizationService::require_self_or_admin(caller, &user_id, "user")?;

    debug!(user_id = %user_id, "Reading user");
    let user: User = persistence
        .get_user_by_id(&user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("User", &user_id))?;

    Ok(UserView::from(&user))
}

/// Lists users, optionally filtered by role.
///
/// # Errors
///
/// Returns an error if the caller is not an administrator or the page
/// arguments are invalid.
pub fn list_users(
    persistence: &mut Persistence,
    caller: Option<&AuthenticatedUser>,
    request: &ListUsersRequest,
) -> Result<UserConnection, ApiError> {
    let caller: &AuthenticatedUser = AuthorizationService::require_authenticated(caller, "users")?;
    AuthorizationService::require_role(caller, Role::Admin, "users")?;

    let page: PageRequest = page_request(&request.page)?;
    debug!(role = ?request.role, first = page.first, "Listing users");

    let slice: PageSlice<User> = persistence
        .list_users(&UserFilter { role: request.role }, &page)
        .map_err(translate_persistence_error)?;

    Ok(Connection::from_slice(
        slice,
        &page,
        |user| &user.id,
        |user| UserView::from(&user),
    ))
}
