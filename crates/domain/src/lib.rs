// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod command_status;
mod cursor;
mod error;
mod id;
mod patch;
mod subscription;
mod timestamps;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use command_status::{CommandStatus, aggregate_command_status};
pub use cursor::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, decode_cursor, encode_cursor};
pub use id::EntityId;
pub use patch::{
    AddressPatch, CommercePatch, GeoPatch, ImageUpdate, PanierPatch, ProductPatch, UserPatch,
    apply_commerce_patch, apply_panier_patch, apply_product_patch, apply_user_patch,
};
pub use subscription::{
    BILLING_CYCLE_DAYS, PendingChange, ServiceAction, ServiceCatalog, ServiceInfo,
    ServiceSubscription, ServiceTier, ServiceUpdate, apply_service_update, billable_amount,
    billing_anchor, is_billing_due, prorated_charge, remaining_cycle_days,
    settle_pending_changes,
};
pub use timestamps::{
    current_timestamp, format_date, format_timestamp, parse_date, parse_timestamp,
};

// Re-export public types
pub use error::DomainError;
pub use types::{
    Address, BankingDetails, BillingRecord, CcCommand, Command, Commerce, CommerceCommand,
    GeoPoint, LineItem, Panier, PanierCommand, PanierItem, PaymentMethod, Product, Role, User,
};
pub use validation::{
    normalize_email, validate_commerce, validate_email, validate_name, validate_panier,
    validate_panier_items, validate_position, validate_price, validate_product,
    validate_quantity, validate_tax_rate,
};
