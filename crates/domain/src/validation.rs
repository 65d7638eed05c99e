// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{Commerce, GeoPoint, Panier, PanierItem, Product};

/// Longest accepted email address.
const MAX_EMAIL_LENGTH: usize = 254;

/// Longest accepted name-like text field.
const MAX_NAME_LENGTH: usize = 200;

/// Normalizes an email address for storage and comparison.
///
/// Surrounding whitespace is removed and the address is lower-cased, so
/// uniqueness checks are case-insensitive.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates the syntax of a normalized email address.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` if:
/// - The address is empty or longer than 254 characters
/// - The address contains whitespace
/// - The address does not contain exactly one `@`
/// - The local part is empty
/// - The domain part has no `.` or starts or ends with one
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::InvalidEmail(email.to_string());

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    if local.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a required, human-readable text field.
///
/// # Arguments
///
/// * `field` - The field name reported on failure
/// * `value` - The value to check
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the value is blank or too long.
pub fn validate_name(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidName {
            field,
            reason: String::from("cannot be empty"),
        });
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidName {
            field,
            reason: format!("cannot exceed {MAX_NAME_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Validates an amount in minor currency units.
///
/// # Errors
///
/// Returns `DomainError::InvalidPrice` if the amount is negative.
pub const fn validate_price(field: &'static str, amount: i64) -> Result<(), DomainError> {
    if amount < 0 {
        return Err(DomainError::InvalidPrice { field, amount });
    }
    Ok(())
}

/// Validates a tax rate in percent.
///
/// # Errors
///
/// Returns `DomainError::InvalidTaxRate` unless the rate is a finite number
/// within `0..=100`.
pub fn validate_tax_rate(rate: f64) -> Result<(), DomainError> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err(DomainError::InvalidTaxRate(rate.to_string()));
    }
    Ok(())
}

/// Validates a quantity that must be strictly positive.
///
/// # Errors
///
/// Returns `DomainError::InvalidQuantity` if the quantity is zero or negative.
pub const fn validate_quantity(field: &'static str, quantity: i64) -> Result<(), DomainError> {
    if quantity <= 0 {
        return Err(DomainError::InvalidQuantity { field, quantity });
    }
    Ok(())
}

/// Validates a WGS84 position.
///
/// # Errors
///
/// Returns `DomainError::InvalidCoordinates` if the latitude is outside
/// `[-90, 90]` or the longitude outside `[-180, 180]`.
pub fn validate_position(position: GeoPoint) -> Result<(), DomainError> {
    let latitude_ok: bool = (-90.0..=90.0).contains(&position.latitude);
    let longitude_ok: bool = (-180.0..=180.0).contains(&position.longitude);
    if !latitude_ok || !longitude_ok {
        return Err(DomainError::InvalidCoordinates {
            latitude: position.latitude.to_string(),
            longitude: position.longitude.to_string(),
        });
    }
    Ok(())
}

/// Validates the line items of a panier.
///
/// Ownership of the referenced products is checked against storage by the
/// caller.
///
/// # Errors
///
/// Returns an error if the list is empty or a line has a zero quantity.
pub fn validate_panier_items(items: &[PanierItem]) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::EmptyPanier);
    }
    for item in items {
        validate_quantity("item quantity", i64::from(item.quantity))?;
    }
    Ok(())
}

/// Validates the field constraints of a commerce.
///
/// # Errors
///
/// Returns an error if the name, email or position is invalid.
pub fn validate_commerce(commerce: &Commerce) -> Result<(), DomainError> {
    validate_name("commerce name", &commerce.name)?;
    validate_email(&commerce.email)?;
    validate_position(commerce.position)
}

/// Validates the field constraints of a product.
///
/// # Errors
///
/// Returns an error if the name, price or tax rate is invalid.
pub fn validate_product(product: &Product) -> Result<(), DomainError> {
    validate_name("product name", &product.name)?;
    validate_price("product price", product.price)?;
    validate_tax_rate(product.tax_rate)
}

/// Validates the field constraints of a panier.
///
/// A sold-out panier (quantity 0) is valid.
///
/// # Errors
///
/// Returns an error if the name, price, quantity or items are invalid.
pub fn validate_panier(panier: &Panier) -> Result<(), DomainError> {
    validate_name("panier name", &panier.name)?;
    validate_price("panier price", panier.price)?;
    if panier.quantity < 0 {
        return Err(DomainError::InvalidQuantity {
            field: "panier quantity",
            quantity: panier.quantity,
        });
    }
    validate_panier_items(&panier.items)
}
