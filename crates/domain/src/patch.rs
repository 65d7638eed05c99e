// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Typed partial updates.
//!
//! Every field of a patch is optional; absent fields keep their current
//! value. Scalar fields are overwritten, structured fields are merged.

use crate::error::DomainError;
use crate::subscription::{ServiceCatalog, ServiceUpdate, apply_service_update};
use crate::types::{
    Address, BankingDetails, Commerce, GeoPoint, Panier, PanierItem, Product, Role, User,
};
use crate::validation::{
    normalize_email, validate_commerce, validate_email, validate_name, validate_panier,
    validate_product,
};
use serde::{Deserialize, Serialize};
use time::Date;

/// Change applied to an optional image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageUpdate {
    /// Replace the image with the given reference.
    Set(String),
    /// Clear the image.
    Remove,
}

impl ImageUpdate {
    fn apply(&self, image: &mut Option<String>) {
        *image = match self {
            Self::Set(reference) => Some(reference.clone()),
            Self::Remove => None,
        };
    }
}

/// Partial update of a user.
///
/// The password is not applied here: it goes through the password policy
/// and is hashed by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    /// Returns true if the patch changes the user's role.
    #[must_use]
    pub fn changes_role(&self, user: &User) -> bool {
        self.role.is_some_and(|role| role != user.role)
    }
}

/// Applies the profile fields of a user patch.
///
/// The email is normalized before validation. An empty phone clears it.
///
/// # Errors
///
/// Returns an error if the resulting email or names are invalid.
pub fn apply_user_patch(user: &mut User, patch: &UserPatch) -> Result<(), DomainError> {
    if let Some(email) = &patch.email {
        let email: String = normalize_email(email);
        validate_email(&email)?;
        user.email = email;
    }
    if let Some(first_name) = &patch.first_name {
        validate_name("first name", first_name)?;
        user.first_name.clone_from(first_name);
    }
    if let Some(last_name) = &patch.last_name {
        validate_name("last name", last_name)?;
        user.last_name.clone_from(last_name);
    }
    if let Some(phone) = &patch.phone {
        user.phone = if phone.trim().is_empty() {
            None
        } else {
            Some(phone.clone())
        };
    }
    if let Some(role) = patch.role {
        user.role = role;
    }
    Ok(())
}

/// Partial update of an address; present fields replace the current ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressPatch {
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AddressPatch {
    fn apply(&self, address: &mut Address) {
        let merge = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                target.clone_from(value);
            }
        };
        merge(&mut address.street, &self.street);
        merge(&mut address.postal_code, &self.postal_code);
        merge(&mut address.city, &self.city);
        merge(&mut address.country, &self.country);
    }
}

/// Partial update of a position; a single coordinate may be changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPatch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoPatch {
    fn apply(self, position: &mut GeoPoint) {
        if let Some(latitude) = self.latitude {
            position.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            position.longitude = longitude;
        }
    }
}

/// Partial update of a commerce.
///
/// Balances, billing state and ownership cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommercePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<AddressPatch>,
    pub position: Option<GeoPatch>,
    pub image: Option<ImageUpdate>,
    pub banking: Option<BankingDetails>,
    pub services: Vec<ServiceUpdate>,
}

/// Applies a commerce patch and returns the subscription charge it caused.
///
/// Subscription changes are applied in order; the total prorated charge is
/// added to the commerce's due balance and returned.
///
/// # Arguments
///
/// * `commerce` - The commerce to modify
/// * `patch` - The requested changes
/// * `catalog` - The service catalog
/// * `today` - The current date
///
/// # Errors
///
/// Returns an error if a field is invalid or a subscription change is
/// rejected. The commerce must be discarded on error.
pub fn apply_commerce_patch(
    commerce: &mut Commerce,
    patch: &CommercePatch,
    catalog: &ServiceCatalog,
    today: Date,
) -> Result<i64, DomainError> {
    if let Some(name) = &patch.name {
        commerce.name.clone_from(name);
    }
    if let Some(description) = &patch.description {
        commerce.description.clone_from(description);
    }
    if let Some(email) = &patch.email {
        commerce.email = normalize_email(email);
    }
    if let Some(phone) = &patch.phone {
        commerce.phone.clone_from(phone);
    }
    if let Some(address) = &patch.address {
        address.apply(&mut commerce.address);
    }
    if let Some(position) = patch.position {
        position.apply(&mut commerce.position);
    }
    if let Some(image) = &patch.image {
        image.apply(&mut commerce.image);
    }
    if let Some(banking) = &patch.banking {
        commerce.banking = Some(banking.clone());
    }

    validate_commerce(commerce)?;

    let mut charge: i64 = 0;
    for update in &patch.services {
        charge += apply_service_update(
            &mut commerce.services,
            update,
            catalog,
            commerce.last_billing,
            today,
        )?;
    }
    commerce.due_balance += charge;

    Ok(charge)
}

/// Partial update of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub tax_rate: Option<f64>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<ImageUpdate>,
    pub is_available: Option<bool>,
}

/// Applies a product patch.
///
/// # Errors
///
/// Returns an error if the resulting product is invalid.
pub fn apply_product_patch(product: &mut Product, patch: &ProductPatch) -> Result<(), DomainError> {
    if let Some(name) = &patch.name {
        product.name.clone_from(name);
    }
    if let Some(description) = &patch.description {
        product.description.clone_from(description);
    }
    if let Some(price) = patch.price {
        product.price = price;
    }
    if let Some(tax_rate) = patch.tax_rate {
        product.tax_rate = tax_rate;
    }
    if let Some(category) = &patch.category {
        product.category.clone_from(category);
    }
    if let Some(tags) = &patch.tags {
        product.tags.clone_from(tags);
    }
    if let Some(image) = &patch.image {
        image.apply(&mut product.image);
    }
    if let Some(is_available) = patch.is_available {
        product.is_available = is_available;
    }
    validate_product(product)
}

/// Partial update of a panier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanierPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub items: Option<Vec<PanierItem>>,
    pub quantity: Option<i64>,
    pub image: Option<ImageUpdate>,
}

/// Applies a panier patch.
///
/// # Errors
///
/// Returns an error if the resulting panier is invalid.
pub fn apply_panier_patch(panier: &mut Panier, patch: &PanierPatch) -> Result<(), DomainError> {
    if let Some(name) = &patch.name {
        panier.name.clone_from(name);
    }
    if let Some(description) = &patch.description {
        panier.description.clone_from(description);
    }
    if let Some(price) = patch.price {
        panier.price = price;
    }
    if let Some(items) = &patch.items {
        panier.items.clone_from(items);
    }
    if let Some(quantity) = patch.quantity {
        panier.quantity = quantity;
    }
    if let Some(image) = &patch.image {
        image.apply(&mut panier.image);
    }
    validate_panier(panier)
}
