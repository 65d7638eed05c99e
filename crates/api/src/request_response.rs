// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests deserialize from the `variables` object of an operation and
//! responses serialize into its `data`. Field names are camelCase on the wire.

use localmarket_domain::{
    Address, BankingDetails, BillingRecord, CcCommand, Command, CommandStatus, Commerce,
    CommerceCommand, CommercePatch, GeoPoint, LineItem, Panier, PanierCommand, PanierItem,
    PanierPatch, PaymentMethod, Product, ProductPatch, Role, ServiceInfo, ServiceTier, User,
    UserPatch, format_date, format_timestamp,
};

use crate::pagination::Connection;

/// Pagination arguments shared by every list operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct PageArgs {
    /// Page size, 1 to 100.
    pub first: Option<i64>,
    /// Cursor of the last item of the previous page.
    pub after: Option<String>,
}

/// Request addressing a single entity by identifier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct IdRequest {
    pub id: String,
}

/// Response carrying a single message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Users
// ============================================================================

/// API request to create a user account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Defaults to `USER`; other roles require an administrator.
    #[serde(default)]
    pub role: Option<Role>,
}

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// API response for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    pub expires_at: String,
    pub user: UserView,
}

/// API request to update a user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UpdateUserRequest {
    /// The user to update; defaults to the caller.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub patch: UserPatch,
}

/// API request to read a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct GetUserRequest {
    /// Defaults to the caller.
    pub id: Option<String>,
}

/// API request to list users.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ListUsersRequest {
    pub role: Option<Role>,
    #[serde(flatten)]
    pub page: PageArgs,
}

/// Public view of a user. The password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            created_at: format_timestamp(user.created_at),
        }
    }
}

// ============================================================================
// Commerces
// ============================================================================

/// A service requested when creating a commerce.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ServiceRequest {
    pub service: String,
    pub tier: ServiceTier,
}

/// API request to create a commerce.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommerceRequest {
    /// Required when an administrator creates the commerce.
    #[serde(default)]
    pub storekeeper_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub address: Address,
    pub position: GeoPoint,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub banking: Option<BankingDetails>,
    #[serde(default)]
    pub services: Vec<ServiceRequest>,
}

/// API request to update a commerce.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct UpdateCommerceRequest {
    pub id: String,
    #[serde(flatten)]
    pub patch: CommercePatch,
}

/// API request to list commerces.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ListCommercesRequest {
    pub city: Option<String>,
    /// Catalog service name the commerce subscribes to.
    pub service: Option<String>,
    #[serde(flatten)]
    pub page: PageArgs,
}

/// View of a commerce.
///
/// Money and banking fields are only filled for the owner and administrators.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceView {
    pub id: String,
    pub storekeeper_id: String,
    pub name: String,
    pub description: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    pub position: GeoPoint,
    pub image: Option<String>,
    /// Subscription codes such as `PANIER_C`.
    pub services: Vec<String>,
    pub balance: Option<i64>,
    pub due_balance: Option<i64>,
    pub last_billing: Option<String>,
    pub banking: Option<BankingDetails>,
    pub billing_history: Option<Vec<BillingRecord>>,
    pub created_at: String,
}

impl CommerceView {
    /// Builds the view, hiding private fields unless `include_private`.
    #[must_use]
    pub fn new(commerce: &Commerce, include_private: bool) -> Self {
        let private = |value| if include_private { Some(value) } else { None };
        Self {
            id: commerce.id.to_string(),
            storekeeper_id: commerce.storekeeper_id.to_string(),
            name: commerce.name.clone(),
            description: commerce.description.clone(),
            email: commerce.email.clone(),
            phone: commerce.phone.clone(),
            address: commerce.address.clone(),
            position: commerce.position,
            image: commerce.image.clone(),
            services: commerce.services.iter().map(|s| s.code()).collect(),
            balance: private(commerce.balance),
            due_balance: private(commerce.due_balance),
            last_billing: include_private.then(|| format_date(commerce.last_billing)),
            banking: if include_private {
                commerce.banking.clone()
            } else {
                None
            },
            billing_history: include_private.then(|| commerce.billing_history.clone()),
            created_at: format_timestamp(commerce.created_at),
        }
    }
}

/// API response for a commerce update.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommerceResponse {
    pub commerce: CommerceView,
    /// Prorated amount added to the due balance by this update.
    pub charged: i64,
}

// ============================================================================
// Products
// ============================================================================

const fn default_available() -> bool {
    true
}

/// Fields of a product to create.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

/// API request to create one product.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Required for administrators; storekeepers use their own commerce.
    #[serde(default)]
    pub commerce_id: Option<String>,
    #[serde(flatten)]
    pub product: ProductInput,
}

/// API request to create several products at once.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductsRequest {
    #[serde(default)]
    pub commerce_id: Option<String>,
    pub products: Vec<ProductInput>,
}

/// API request to update one product.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct UpdateProductRequest {
    pub id: String,
    #[serde(flatten)]
    pub patch: ProductPatch,
}

/// API request to update several products at once.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct UpdateProductsRequest {
    pub products: Vec<UpdateProductRequest>,
}

/// API request to list products.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListProductsRequest {
    pub commerce_id: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub is_available: Option<bool>,
    #[serde(flatten)]
    pub page: PageArgs,
}

/// View of a product.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub commerce_id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub tax_rate: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub is_available: bool,
    pub created_at: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            commerce_id: product.commerce_id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            tax_rate: product.tax_rate,
            category: product.category.clone(),
            tags: product.tags.clone(),
            image: product.image.clone(),
            is_available: product.is_available,
            created_at: format_timestamp(product.created_at),
        }
    }
}

// ============================================================================
// Paniers
// ============================================================================

/// API request to create a panier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePanierRequest {
    #[serde(default)]
    pub commerce_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub items: Vec<PanierItem>,
    pub quantity: i64,
    #[serde(default)]
    pub image: Option<String>,
}

/// API request to update a panier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UpdatePanierRequest {
    pub id: String,
    #[serde(flatten)]
    pub patch: PanierPatch,
}

/// API request to list paniers.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListPaniersRequest {
    pub commerce_id: Option<String>,
    pub in_stock: Option<bool>,
    #[serde(flatten)]
    pub page: PageArgs,
}

/// View of a panier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanierView {
    pub id: String,
    pub commerce_id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub items: Vec<PanierItem>,
    pub quantity: i64,
    pub image: Option<String>,
    pub created_at: String,
}

impl From<&Panier> for PanierView {
    fn from(panier: &Panier) -> Self {
        Self {
            id: panier.id.to_string(),
            commerce_id: panier.commerce_id.to_string(),
            name: panier.name.clone(),
            description: panier.description.clone(),
            price: panier.price,
            items: panier.items.clone(),
            quantity: panier.quantity,
            image: panier.image.clone(),
            created_at: format_timestamp(panier.created_at),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// A product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLineInput {
    pub product_id: String,
    pub quantity: u32,
}

/// A panier line of an order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanierLineInput {
    pub panier_id: String,
    pub quantity: u32,
}

/// The part of an order addressed to one commerce.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceOrderInput {
    pub commerce_id: String,
    /// RFC 3339 pickup date and time.
    pub pickup_date: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub products: Vec<ProductLineInput>,
    #[serde(default)]
    pub paniers: Vec<PanierLineInput>,
}

/// API request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommandRequest {
    pub orders: Vec<CommerceOrderInput>,
    /// Stored payment method used for card parts.
    #[serde(default)]
    pub payment_method_id: Option<String>,
}

/// API response for a placed order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommandResponse {
    pub command: CommandView,
    pub commerce_commands: Vec<CommerceCommandView>,
    /// Amount charged by card at checkout.
    pub card_total: i64,
}

/// API request to list commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListCommandsRequest {
    /// Administrators may list another user's commands, or all of them.
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub page: PageArgs,
}

/// View of a command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandView {
    pub id: String,
    pub user_id: String,
    pub status: CommandStatus,
    pub created_at: String,
}

impl CommandView {
    /// Builds the view with an explicitly computed status.
    #[must_use]
    pub fn with_status(command: &Command, status: CommandStatus) -> Self {
        Self {
            id: command.id.to_string(),
            user_id: command.user_id.to_string(),
            status,
            created_at: format_timestamp(command.created_at),
        }
    }
}

/// API request to list commerce commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListCommerceCommandsRequest {
    /// Defaults to the caller's commerce for storekeepers.
    pub commerce_id: Option<String>,
    pub command_id: Option<String>,
    pub status: Option<CommandStatus>,
    /// RFC 3339 lower bound on the pickup date, inclusive.
    pub pickup_from: Option<String>,
    /// RFC 3339 upper bound on the pickup date, inclusive.
    pub pickup_until: Option<String>,
    #[serde(flatten)]
    pub page: PageArgs,
}

/// API request to change the status of a commerce command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UpdateCommerceCommandRequest {
    pub id: String,
    pub status: CommandStatus,
}

/// API response for a status change.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommerceCommandResponse {
    pub commerce_command: CommerceCommandView,
    /// Status of the parent command after the change.
    pub command_status: CommandStatus,
}

/// View of a commerce command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceCommandView {
    pub id: String,
    pub command_id: String,
    pub commerce_id: String,
    pub user_id: String,
    pub pickup_date: String,
    pub price: i64,
    pub payment_method: PaymentMethod,
    pub status: CommandStatus,
    pub created_at: String,
}

impl From<&CommerceCommand> for CommerceCommandView {
    fn from(cc: &CommerceCommand) -> Self {
        Self {
            id: cc.id.to_string(),
            command_id: cc.command_id.to_string(),
            commerce_id: cc.commerce_id.to_string(),
            user_id: cc.user_id.to_string(),
            pickup_date: format_timestamp(cc.pickup_date),
            price: cc.price,
            payment_method: cc.payment_method,
            status: cc.status,
            created_at: format_timestamp(cc.created_at),
        }
    }
}

/// API request to list the children of a commerce command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChildCommandsRequest {
    pub commerce_command_id: String,
    #[serde(flatten)]
    pub page: PageArgs,
}

/// View of a click-and-collect command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CcCommandView {
    pub id: String,
    pub commerce_command_id: String,
    pub items: Vec<LineItem>,
    pub total: i64,
    pub pickup_date: String,
    pub created_at: String,
}

impl From<&CcCommand> for CcCommandView {
    fn from(command: &CcCommand) -> Self {
        Self {
            id: command.id.to_string(),
            commerce_command_id: command.commerce_command_id.to_string(),
            items: command.items.clone(),
            total: command.items.iter().map(LineItem::total).sum(),
            pickup_date: format_timestamp(command.pickup_date),
            created_at: format_timestamp(command.created_at),
        }
    }
}

/// View of a panier command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanierCommandView {
    pub id: String,
    pub commerce_command_id: String,
    pub panier_id: String,
    pub quantity: u32,
    pub pickup_date: String,
    pub created_at: String,
}

impl From<&PanierCommand> for PanierCommandView {
    fn from(command: &PanierCommand) -> Self {
        Self {
            id: command.id.to_string(),
            commerce_command_id: command.commerce_command_id.to_string(),
            panier_id: command.panier_id.to_string(),
            quantity: command.quantity,
            pickup_date: format_timestamp(command.pickup_date),
            created_at: format_timestamp(command.created_at),
        }
    }
}

// ============================================================================
// Services
// ============================================================================

/// API request to read one catalog service.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ServiceInfoRequest {
    pub name: String,
}

/// View of a catalog service.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfoView {
    pub name: String,
    pub description: String,
    pub month_price: i64,
    pub consumption_price: i64,
}

impl From<&ServiceInfo> for ServiceInfoView {
    fn from(info: &ServiceInfo) -> Self {
        Self {
            name: info.name.clone(),
            description: info.description.clone(),
            month_price: info.month_price,
            consumption_price: info.consumption_price,
        }
    }
}

// ============================================================================
// Routines
// ============================================================================

/// A commerce the routine could not process.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineFailure {
    pub commerce_id: String,
    pub message: String,
}

/// One commerce billed by the billing routine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BilledCommerce {
    pub commerce_id: String,
    pub amount: i64,
    /// Subscription codes that were billed.
    pub services: Vec<String>,
    /// Empty when nothing was charged.
    pub charge_id: String,
}

/// Outcome of a billing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BillingRunResponse {
    pub billed: Vec<BilledCommerce>,
    pub failures: Vec<RoutineFailure>,
}

/// One commerce processed by the banking routine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferView {
    pub commerce_id: String,
    /// Commerce commands credited during this run.
    pub transferred_commands: usize,
    /// Amount put on a transfer card, 0 if none was created.
    pub amount: i64,
    pub card_id: Option<String>,
}

/// Outcome of a banking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BankingRunResponse {
    pub transfers: Vec<TransferView>,
    pub failures: Vec<RoutineFailure>,
}

/// Connection of users.
pub type UserConnection = Connection<UserView>;
/// Connection of commerces.
pub type CommerceConnection = Connection<CommerceView>;
/// Connection of products.
pub type ProductConnection = Connection<ProductView>;
/// Connection of paniers.
pub type PanierConnection = Connection<PanierView>;
/// Connection of commands.
pub type CommandConnection = Connection<CommandView>;
/// Connection of commerce commands.
pub type CommerceCommandConnection = Connection<CommerceCommandView>;
/// Connection of click-and-collect commands.
pub type CcCommandConnection = Connection<CcCommandView>;
/// Connection of panier commands.
pub type PanierCommandConnection = Connection<PanierCommandView>;
