// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{
    CcCommand, Command, CommandStatus, CommerceCommand, EntityId, PanierCommand, Role,
};
use time::OffsetDateTime;

/// One page of rows read from storage.
///
/// `items` holds up to `first + 1` rows: the extra row only signals that a
/// further page exists and is dropped by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    /// Number of rows matching the scope and filters, ignoring the cursor.
    pub total_count: i64,
}

/// Fields of a user account to create.
#[derive(Debug, Clone)]
pub struct NewUserData {
    pub email: String,
    /// Plain-text password, hashed before storage.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub payment_customer_id: Option<String>,
}

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_token: String,
    pub user_id: EntityId,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// Filters for listing users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
}

/// Filters for listing commerces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommerceFilter {
    /// Exact city match.
    pub city: Option<String>,
    /// Catalog service name subscribed in any tier.
    pub service: Option<String>,
}

/// Filters for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub commerce_id: Option<EntityId>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub is_available: Option<bool>,
}

/// Filters for listing paniers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanierFilter {
    pub commerce_id: Option<EntityId>,
    /// Only paniers with units left.
    pub in_stock: Option<bool>,
}

/// Filters for listing commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFilter {
    /// Owner scope; `None` lists every user's commands.
    pub user_id: Option<EntityId>,
}

/// Filters for listing commerce commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommerceCommandFilter {
    pub commerce_id: Option<EntityId>,
    pub command_id: Option<EntityId>,
    pub status: Option<CommandStatus>,
    /// Inclusive lower bound on the pickup date.
    pub pickup_from: Option<OffsetDateTime>,
    /// Exclusive upper bound on the pickup date.
    pub pickup_until: Option<OffsetDateTime>,
}

/// The records written by one checkout.
#[derive(Debug, Clone)]
pub struct CheckoutData {
    pub command: Command,
    pub parts: Vec<CheckoutPart>,
}

/// The records addressed to one commerce within a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutPart {
    pub commerce_command: CommerceCommand,
    pub cc_command: Option<CcCommand>,
    pub panier_commands: Vec<PanierCommand>,
}

/// Result of crediting finished commerce commands to a commerce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSummary {
    /// Number of commerce commands newly flagged as transferred.
    pub transferred_commands: usize,
    /// Amount credited by this pass, in minor currency units.
    pub credited: i64,
    /// Commerce balance after crediting.
    pub balance: i64,
}
