// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An entity identifier is not a 24-character hex token.
    InvalidIdentifier(String),
    /// A pagination cursor could not be decoded.
    InvalidCursor(String),
    /// A page size is outside the accepted range.
    InvalidPageSize {
        /// The requested page size.
        requested: i64,
        /// The largest accepted page size.
        max: i64,
    },
    /// Email address is malformed.
    InvalidEmail(String),
    /// A required text field is empty or too long.
    InvalidName {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A price or balance amount is negative.
    InvalidPrice {
        /// The offending field.
        field: &'static str,
        /// The rejected amount in minor currency units.
        amount: i64,
    },
    /// Tax rate outside of 0..=100 percent.
    InvalidTaxRate(String),
    /// A quantity is zero or negative.
    InvalidQuantity {
        /// The offending field.
        field: &'static str,
        /// The rejected quantity.
        quantity: i64,
    },
    /// Latitude or longitude out of range.
    InvalidCoordinates {
        /// The rejected latitude.
        latitude: String,
        /// The rejected longitude.
        longitude: String,
    },
    /// Unknown role name.
    InvalidRole(String),
    /// Unknown command status name.
    InvalidCommandStatus(String),
    /// Unknown payment method name.
    InvalidPaymentMethod(String),
    /// A status change that the lifecycle does not permit.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },
    /// A panier must bundle at least one product.
    EmptyPanier,
    /// A checkout must contain at least one line.
    EmptyOrder(String),
    /// A service subscription code could not be parsed.
    InvalidServiceCode(String),
    /// The service is not part of the catalog.
    UnknownService(String),
    /// The service is already subscribed in the requested tier.
    ServiceAlreadySubscribed(String),
    /// The service is not subscribed by the commerce.
    ServiceNotSubscribed(String),
    /// Failed to parse a date or timestamp.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(value) => write!(f, "Invalid identifier: '{value}'"),
            Self::InvalidCursor(reason) => write!(f, "Invalid cursor: {reason}"),
            Self::InvalidPageSize { requested, max } => {
                write!(
                    f,
                    "Invalid page size: {requested}. Must be between 1 and {max}"
                )
            }
            Self::InvalidEmail(value) => write!(f, "Invalid email address: '{value}'"),
            Self::InvalidName { field, reason } => write!(f, "Invalid {field}: {reason}"),
            Self::InvalidPrice { field, amount } => {
                write!(f, "Invalid {field}: {amount} must not be negative")
            }
            Self::InvalidTaxRate(value) => {
                write!(f, "Invalid tax rate: {value}. Must be between 0 and 100")
            }
            Self::InvalidQuantity { field, quantity } => {
                write!(f, "Invalid {field}: {quantity} must be greater than 0")
            }
            Self::InvalidCoordinates {
                latitude,
                longitude,
            } => {
                write!(
                    f,
                    "Invalid coordinates ({latitude}, {longitude}): latitude must be within \
                     [-90, 90] and longitude within [-180, 180]"
                )
            }
            Self::InvalidRole(value) => write!(f, "Invalid role: '{value}'"),
            Self::InvalidCommandStatus(value) => write!(f, "Invalid command status: '{value}'"),
            Self::InvalidPaymentMethod(value) => write!(f, "Invalid payment method: '{value}'"),
            Self::InvalidStatusTransition { from, to } => {
                write!(f, "Cannot change command status from {from} to {to}")
            }
            Self::EmptyPanier => write!(f, "A panier must contain at least one product"),
            Self::EmptyOrder(reason) => write!(f, "Empty order: {reason}"),
            Self::InvalidServiceCode(code) => write!(f, "Invalid service code: '{code}'"),
            Self::UnknownService(name) => write!(f, "Unknown service: '{name}'"),
            Self::ServiceAlreadySubscribed(name) => {
                write!(f, "Service '{name}' is already subscribed in this tier")
            }
            Self::ServiceNotSubscribed(name) => write!(f, "Service '{name}' is not subscribed"),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
