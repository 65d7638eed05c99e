// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use localmarket_domain::DomainError;
use localmarket_persistence::PersistenceError;
use tracing::error;

use crate::integrations::IntegrationError;
use crate::password_policy::PasswordPolicyError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role or relationship required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain and persistence errors and represent the
/// API contract. Every variant maps to one error kind reported to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed or is required.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The caller does not have the role or ownership the action requires.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role or relationship required for this action.
        required_role: String,
    },
    /// A resource with the same unique key already exists.
    AlreadyExists {
        /// The type of the conflicting resource.
        resource_type: String,
        /// A human-readable description of the conflict.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An external provider rejected or failed a call.
    ExternalServiceFailure {
        /// The provider that failed.
        service: String,
        /// A description of the failure.
        message: String,
    },
    /// The operation is not available with the configured providers.
    NotImplemented {
        /// The unavailable feature.
        feature: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
}

impl ApiError {
    /// Returns the error kind reported to clients.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "AuthenticationFailed",
            Self::Unauthorized { .. } => "AccessDenied",
            Self::AlreadyExists { .. } => "AlreadyExists",
            Self::InvalidInput { .. } | Self::PasswordPolicyViolation { .. } => "InvalidInput",
            Self::ResourceNotFound { .. } => "NotFound",
            Self::ExternalServiceFailure { .. } => "ExternalServiceFailure",
            Self::NotImplemented { .. } => "NotImplemented",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Builds a `ResourceNotFound` error for an entity looked up by ID.
    #[must_use]
    pub fn not_found(resource_type: &str, id: &impl std::fmt::Display) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.to_string(),
            message: format!("{resource_type} {id} does not exist"),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role}")
            }
            Self::AlreadyExists {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} already exists: {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::ExternalServiceFailure { service, message } => {
                write!(f, "External service '{service}' failed: {message}")
            }
            Self::NotImplemented { feature } => {
                write!(f, "Not implemented: {feature}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

impl From<IntegrationError> for ApiError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::Rejected { service, message } => {
                Self::ExternalServiceFailure { service, message }
            }
            IntegrationError::Unsupported { service, operation } => Self::NotImplemented {
                feature: format!("{operation} ({service})"),
            },
        }
    }
}

fn invalid(field: &str, err: &DomainError) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match &err {
        DomainError::InvalidIdentifier(_) => invalid("id", &err),
        DomainError::InvalidCursor(_) => invalid("after", &err),
        DomainError::InvalidPageSize { .. } => invalid("first", &err),
        DomainError::InvalidEmail(_) => invalid("email", &err),
        DomainError::InvalidName { field, .. }
        | DomainError::InvalidPrice { field, .. }
        | DomainError::InvalidQuantity { field, .. } => invalid(field, &err),
        DomainError::InvalidTaxRate(_) => invalid("taxRate", &err),
        DomainError::InvalidCoordinates { .. } => invalid("position", &err),
        DomainError::InvalidRole(_) => invalid("role", &err),
        DomainError::InvalidCommandStatus(_) | DomainError::InvalidStatusTransition { .. } => {
            invalid("status", &err)
        }
        DomainError::InvalidPaymentMethod(_) => invalid("paymentMethod", &err),
        DomainError::EmptyPanier => invalid("items", &err),
        DomainError::EmptyOrder(_) => invalid("orders", &err),
        DomainError::InvalidServiceCode(_)
        | DomainError::ServiceAlreadySubscribed(_)
        | DomainError::ServiceNotSubscribed(_) => invalid("services", &err),
        DomainError::UnknownService(name) => ApiError::ResourceNotFound {
            resource_type: String::from("Service"),
            message: format!("Service '{name}' is not part of the catalog"),
        },
        DomainError::DateParseError { .. } | DomainError::DateArithmeticOverflow { .. } => {
            invalid("date", &err)
        }
    }
}

/// Translates a persistence error into an API error.
///
/// Storage failures are logged here and reported as internal errors without
/// their details.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message,
        },
        PersistenceError::UniqueViolation(message) => ApiError::AlreadyExists {
            resource_type: String::from("Record"),
            message,
        },
        PersistenceError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        PersistenceError::InsufficientQuantity {
            panier_id,
            requested,
            available,
        } => ApiError::InvalidInput {
            field: String::from("quantity"),
            message: format!(
                "Panier {panier_id} has {available} units left, {requested} requested"
            ),
        },
        other => {
            error!(error = %other, "Persistence failure");
            ApiError::Internal {
                message: String::from("Storage failure"),
            }
        }
    }
}
