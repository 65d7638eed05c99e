// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Service layer of the local marketplace.
//!
//! Operations authenticate and authorize the caller, validate input with the
//! domain rules, read and write through the persistence layer, call the
//! external providers, and return API views. Nothing here knows about HTTP.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod config;
mod error;
mod handlers;
mod integrations;
mod pagination;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedUser, AuthenticationService, AuthorizationService};
pub use config::{ApiConfig, DEFAULT_SESSION_LIFETIME};
pub use error::{ApiError, AuthError, translate_domain_error, translate_persistence_error};
pub use handlers::{
    all_services_info, create_command, create_commerce, create_panier, create_product,
    create_products, create_user, get_command, get_commerce, get_commerce_command, get_panier,
    get_product, get_user, list_cc_commands, list_commands, list_commerce_commands,
    list_commerces, list_paniers, list_panier_commands, list_products, list_users, login, logout,
    payment_methods, run_banking_transfers, run_billing, service_info, update_commerce,
    update_commerce_command, update_panier, update_product, update_products, update_user,
};
pub use integrations::{
    Attachment, BankingBoard, EmailMessage, EmailTemplate, IntegrationError, Integrations,
    Invoice, InvoiceLine, InvoiceRenderer, LogBankingBoard, LogNotifier, Notifier,
    OfflinePayments, PaymentMethodSummary, PaymentProvider, PlainTextInvoices, RecordedCall,
    Recorder, TransferCard, format_amount,
};
pub use pagination::{Connection, Edge, PageInfo};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    BankingRunResponse, BilledCommerce, BillingRunResponse, CcCommandConnection, CcCommandView,
    CommandConnection, CommandView, CommerceCommandConnection, CommerceCommandView,
    CommerceConnection, CommerceOrderInput, CommerceView, CreateCommandRequest,
    CreateCommandResponse, CreateCommerceRequest, CreatePanierRequest, CreateProductRequest,
    CreateProductsRequest, CreateUserRequest, GetUserRequest, IdRequest, ListChildCommandsRequest,
    ListCommandsRequest, ListCommerceCommandsRequest, ListCommercesRequest, ListPaniersRequest,
    ListProductsRequest, ListUsersRequest, LoginRequest, LoginResponse, MessageResponse,
    PageArgs, PanierCommandConnection, PanierCommandView, PanierConnection, PanierLineInput,
    PanierView, ProductConnection, ProductInput, ProductLineInput, ProductView, RoutineFailure,
    ServiceInfoRequest, ServiceInfoView, ServiceRequest, TransferView, UpdateCommerceCommandRequest,
    UpdateCommerceCommandResponse, UpdateCommerceRequest, UpdateCommerceResponse,
    UpdatePanierRequest, UpdateProductRequest, UpdateProductsRequest, UpdateUserRequest,
    UserConnection, UserView,
};
