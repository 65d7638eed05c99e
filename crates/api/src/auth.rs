// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use localmarket_domain::{
    Commerce, EntityId, Role, User, current_timestamp, format_timestamp, normalize_email,
    parse_timestamp,
};
use localmarket_persistence::{Persistence, PersistenceError, SessionData};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::AuthError;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The user's identifier.
    pub id: EntityId,
    /// The user's normalized email.
    pub email: String,
    /// The user's role.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Builds the authenticated view of a stored user.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    /// Returns true if the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authorization service for enforcing role and ownership rules.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Returns the caller, or fails if the request is anonymous.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` when no caller is present.
    pub fn require_authenticated<'a>(
        caller: Option<&'a AuthenticatedUser>,
        action: &str,
    ) -> Result<&'a AuthenticatedUser, AuthError> {
        caller.ok_or_else(|| AuthError::AuthenticationFailed {
            reason: format!("'{action}' requires a signed-in user"),
        })
    }

    /// Checks that the caller's role includes `required`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the role is insufficient.
    pub fn require_role(
        caller: &AuthenticatedUser,
        required: Role,
        action: &str,
    ) -> Result<(), AuthError> {
        if caller.role.includes(required) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: required.to_string(),
            })
        }
    }

    /// Checks that the caller is the given user or an administrator.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` otherwise.
    pub fn require_self_or_admin(
        caller: &AuthenticatedUser,
        user_id: &EntityId,
        action: &str,
    ) -> Result<(), AuthError> {
        if caller.is_admin() || &caller.id == user_id {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("the account owner or ADMIN"),
            })
        }
    }

    /// Checks that the caller owns the commerce or is an administrator.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` otherwise.
    pub fn require_commerce_owner(
        caller: &AuthenticatedUser,
        commerce: &Commerce,
        action: &str,
    ) -> Result<(), AuthError> {
        if caller.is_admin() || commerce.storekeeper_id == caller.id {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("the commerce owner or ADMIN"),
            })
        }
    }

    /// Returns true if the caller may see the private fields of a commerce.
    #[must_use]
    pub fn can_view_private(caller: Option<&AuthenticatedUser>, commerce: &Commerce) -> bool {
        caller.is_some_and(|c| c.is_admin() || c.id == commerce.storekeeper_id)
    }
}

/// Authentication service for session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Authenticates a user by email and password and creates a session.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `config` - Runtime settings (session lifetime)
    /// * `email` - The account email, in any case
    /// * `password` - The clear-text password
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `user`, `expires_at`)
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for an unknown email or a wrong
    /// password, without telling the two apart.
    pub fn login(
        persistence: &mut Persistence,
        config: &ApiConfig,
        email: &str,
        password: &str,
    ) -> Result<(String, User, OffsetDateTime), AuthError> {
        let email: String = normalize_email(email);

        let user: User = persistence
            .get_user_by_email(&email)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(Self::bad_credentials)?;

        let valid: bool = persistence
            .verify_password(password, &user.password_hash)
            .map_err(Self::map_persistence_error)?;
        if !valid {
            warn!(user_id = %user.id, "Rejected login with a wrong password");
            return Err(Self::bad_credentials());
        }

        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = current_timestamp() + config.session_lifetime;

        persistence
            .create_session(&session_token, &user.id, &format_timestamp(expires_at))
            .map_err(Self::map_persistence_error)?;

        info!(user_id = %user.id, "User logged in");
        Ok((session_token, user, expires_at))
    }

    /// Validates a session token and returns the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the session is unknown, expired,
    /// or belongs to a deleted user.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime =
            parse_timestamp(&session.expires_at).map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })?;

        if current_timestamp() > expires_at {
            warn!(user_id = %session.user_id, "Rejected expired session");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let user: User = persistence
            .get_user_by_id(&session.user_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("User not found"),
            })?;

        persistence
            .update_session_activity(session_token)
            .map_err(Self::map_persistence_error)?;

        Ok(AuthenticatedUser::from_user(&user))
    }

    /// Deletes a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be deleted.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(Self::map_persistence_error)?;
        info!("Session closed");
        Ok(())
    }

    /// Generates a unique session token.
    fn generate_session_token() -> String {
        let timestamp: i128 = current_timestamp().unix_timestamp_nanos();
        format!(
            "session_{timestamp}_{:016x}{:016x}",
            rand::random::<u64>(),
            rand::random::<u64>()
        )
    }

    fn bad_credentials() -> AuthError {
        AuthError::AuthenticationFailed {
            reason: String::from("Invalid email or password"),
        }
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Session storage error: {err}"),
        }
    }
}
