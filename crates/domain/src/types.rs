// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command_status::CommandStatus;
use crate::error::DomainError;
use crate::id::EntityId;
use crate::subscription::ServiceSubscription;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Privilege level of a user.
///
/// Roles are strictly ordered: `Admin` includes everything a `Storekeeper`
/// may do, and `Storekeeper` includes everything a `User` may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Marketplace administrator.
    Admin,
    /// Owner of a commerce.
    Storekeeper,
    /// End user browsing and ordering.
    #[default]
    User,
}

impl Role {
    /// Returns the string representation used in storage and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Storekeeper => "STOREKEEPER",
            Self::User => "USER",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Admin => 2,
            Self::Storekeeper => 1,
            Self::User => 0,
        }
    }

    /// Returns true if this role grants at least the privileges of `required`.
    #[must_use]
    pub const fn includes(self, required: Self) -> bool {
        self.rank() >= required.rank()
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "STOREKEEPER" => Ok(Self::Storekeeper),
            "USER" => Ok(Self::User),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a commerce command is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Paid online at checkout through the payment provider.
    Card,
    /// Paid to the storekeeper at pickup.
    OnSite,
}

impl PaymentMethod {
    /// Returns the string representation used in storage and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "CARD",
            Self::OnSite => "ON_SITE",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CARD" => Ok(Self::Card),
            "ON_SITE" => Ok(Self::OnSite),
            _ => Err(DomainError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: EntityId,
    /// Lower-case normalized, unique across users.
    pub email: String,
    /// Bcrypt hash of the password.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Customer reference at the payment provider.
    pub payment_customer_id: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Postal address of a commerce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

/// WGS84 position of a commerce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Bank account receiving the commerce's transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankingDetails {
    pub holder: String,
    pub iban: String,
    pub bic: String,
}

/// One past billing pass of a commerce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub billed_at: OffsetDateTime,
    /// Amount charged, in minor currency units.
    pub amount: i64,
    /// Subscription codes that were billed.
    pub services: Vec<String>,
    /// Charge reference returned by the payment provider.
    pub charge_id: String,
}

/// A storekeeper's shop.
#[derive(Debug, Clone, PartialEq)]
pub struct Commerce {
    pub id: EntityId,
    pub storekeeper_id: EntityId,
    pub name: String,
    pub description: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    pub position: GeoPoint,
    pub image: Option<String>,
    pub banking: Option<BankingDetails>,
    pub services: Vec<ServiceSubscription>,
    /// Money owed to the commerce, in minor currency units.
    ///
    /// Only the banking routine changes this value.
    pub balance: i64,
    /// Money the commerce owes for its subscriptions, in minor currency units.
    ///
    /// Only subscription changes and the billing routine change this value.
    pub due_balance: i64,
    pub last_billing: Date,
    pub billing_history: Vec<BillingRecord>,
    pub created_at: OffsetDateTime,
}

/// A product sold by one commerce.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: EntityId,
    pub commerce_id: EntityId,
    pub name: String,
    pub description: String,
    /// Unit price in minor currency units.
    pub price: i64,
    /// Tax rate in percent.
    pub tax_rate: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub is_available: bool,
    pub created_at: OffsetDateTime,
}

/// One product line of a panier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanierItem {
    pub product_id: EntityId,
    pub quantity: u32,
}

/// A fixed-price basket of products sold as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panier {
    pub id: EntityId,
    pub commerce_id: EntityId,
    pub name: String,
    pub description: String,
    /// Price of the whole basket in minor currency units.
    pub price: i64,
    pub items: Vec<PanierItem>,
    /// Units still available for ordering.
    pub quantity: i64,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

/// A user's checkout-level order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: EntityId,
    pub user_id: EntityId,
    /// Cached aggregate of the children's statuses.
    ///
    /// Refreshed whenever a child changes; readers that need an
    /// authoritative value re-aggregate.
    pub status: CommandStatus,
    pub created_at: OffsetDateTime,
}

/// The part of a command addressed to one commerce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommerceCommand {
    pub id: EntityId,
    pub command_id: EntityId,
    pub commerce_id: EntityId,
    /// The user who placed the command.
    pub user_id: EntityId,
    pub pickup_date: OffsetDateTime,
    /// Total in minor currency units.
    pub price: i64,
    pub payment_method: PaymentMethod,
    pub status: CommandStatus,
    /// Set once the banking routine has credited the price to the commerce.
    pub transferred: bool,
    pub created_at: OffsetDateTime,
}

/// One ordered product with the unit price at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: EntityId,
    pub quantity: u32,
    pub unit_price: i64,
}

impl LineItem {
    /// Price of the line in minor currency units.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// Click-and-collect part of a commerce command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcCommand {
    pub id: EntityId,
    pub commerce_command_id: EntityId,
    pub items: Vec<LineItem>,
    pub pickup_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Panier part of a commerce command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanierCommand {
    pub id: EntityId,
    pub commerce_command_id: EntityId,
    pub panier_id: EntityId,
    pub quantity: u32,
    pub pickup_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
