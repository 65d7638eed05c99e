// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod catalog_tests;
mod order_tests;
mod user_tests;

use localmarket_domain::{
    Address, CcCommand, Command, CommandStatus, Commerce, CommerceCommand, EntityId, GeoPoint,
    LineItem, Panier, PanierCommand, PanierItem, PaymentMethod, Product, Role, User,
    current_timestamp,
};
use time::{Date, Duration, Month, OffsetDateTime};

use crate::{CheckoutData, CheckoutPart, NewUserData, Persistence};

/// Lowest cost bcrypt accepts; keeps password hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Opens an isolated in-memory database with the cheapest bcrypt cost.
pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory()
        .expect("Failed to open in-memory database")
        .with_password_cost(TEST_BCRYPT_COST)
}

/// Returns 2026-03-01, the reference date of the billing tests.
pub fn create_test_today() -> Date {
    Date::from_calendar_date(2026, Month::March, 1).expect("Valid test date")
}

pub fn create_test_user(persistence: &mut Persistence, email: &str, role: Role) -> User {
    persistence
        .create_user(&NewUserData {
            email: email.to_string(),
            password: String::from("Correct-Horse-42"),
            first_name: String::from("Test"),
            last_name: String::from("User"),
            phone: None,
            role,
            payment_customer_id: None,
        })
        .expect("Failed to create user")
}

pub fn build_test_commerce(storekeeper_id: &EntityId, name: &str, city: &str) -> Commerce {
    Commerce {
        id: EntityId::generate(),
        storekeeper_id: storekeeper_id.clone(),
        name: name.to_string(),
        description: String::from("Fresh local produce"),
        email: String::from("shop@example.com"),
        phone: String::from("0102030405"),
        address: Address {
            street: String::from("1 rue du Marché"),
            postal_code: String::from("69001"),
            city: city.to_string(),
            country: String::from("France"),
        },
        position: GeoPoint {
            latitude: 45.76,
            longitude: 4.83,
        },
        image: None,
        banking: None,
        services: Vec::new(),
        balance: 0,
        due_balance: 0,
        last_billing: Date::from_calendar_date(2026, Month::January, 1).expect("Valid date"),
        billing_history: Vec::new(),
        created_at: current_timestamp(),
    }
}

/// Creates a storekeeper and the commerce it owns.
pub fn create_test_commerce(persistence: &mut Persistence, email: &str) -> Commerce {
    let storekeeper: User = create_test_user(persistence, email, Role::Storekeeper);
    let commerce: Commerce = build_test_commerce(&storekeeper.id, "La Ferme", "Lyon");
    persistence
        .create_commerce(&commerce)
        .expect("Failed to create commerce");
    commerce
}

pub fn build_test_product(commerce_id: &EntityId, name: &str, price: i64) -> Product {
    Product {
        id: EntityId::generate(),
        commerce_id: commerce_id.clone(),
        name: name.to_string(),
        description: String::new(),
        price,
        tax_rate: 5.5,
        category: String::from("vegetables"),
        tags: vec![String::from("organic")],
        image: None,
        is_available: true,
        created_at: current_timestamp(),
    }
}

pub fn create_test_product(
    persistence: &mut Persistence,
    commerce_id: &EntityId,
    name: &str,
    price: i64,
) -> Product {
    let product: Product = build_test_product(commerce_id, name, price);
    persistence
        .create_products(std::slice::from_ref(&product))
        .expect("Failed to create product");
    product
}

pub fn create_test_panier(
    persistence: &mut Persistence,
    commerce_id: &EntityId,
    product_id: &EntityId,
    quantity: i64,
) -> Panier {
    let panier: Panier = Panier {
        id: EntityId::generate(),
        commerce_id: commerce_id.clone(),
        name: String::from("Weekly basket"),
        description: String::new(),
        price: 1_800,
        items: vec![PanierItem {
            product_id: product_id.clone(),
            quantity: 2,
        }],
        quantity,
        image: None,
        created_at: current_timestamp(),
    };
    persistence
        .create_panier(&panier)
        .expect("Failed to create panier");
    panier
}

pub fn build_test_command(user_id: &EntityId) -> Command {
    Command {
        id: EntityId::generate(),
        user_id: user_id.clone(),
        status: CommandStatus::InProgress,
        created_at: current_timestamp(),
    }
}

/// Builds the checkout part addressed to one commerce.
///
/// The part carries a click-and-collect line for `product` when given, and
/// one panier line per `(panier, quantity)` pair.
pub fn build_test_part(
    command: &Command,
    commerce_id: &EntityId,
    product: Option<&Product>,
    paniers: &[(&Panier, u32)],
) -> CheckoutPart {
    let pickup_date: OffsetDateTime = current_timestamp() + Duration::days(2);
    let commerce_command_id: EntityId = EntityId::generate();

    let cc_command: Option<CcCommand> = product.map(|product| CcCommand {
        id: EntityId::generate(),
        commerce_command_id: commerce_command_id.clone(),
        items: vec![LineItem {
            product_id: product.id.clone(),
            quantity: 1,
            unit_price: product.price,
        }],
        pickup_date,
        created_at: command.created_at,
    });

    let panier_commands: Vec<PanierCommand> = paniers
        .iter()
        .map(|(panier, quantity)| PanierCommand {
            id: EntityId::generate(),
            commerce_command_id: commerce_command_id.clone(),
            panier_id: panier.id.clone(),
            quantity: *quantity,
            pickup_date,
            created_at: command.created_at,
        })
        .collect();

    let cc_price: i64 = cc_command
        .as_ref()
        .map_or(0, |cc| cc.items.iter().map(LineItem::total).sum());
    let panier_price: i64 = paniers
        .iter()
        .map(|(panier, quantity)| panier.price * i64::from(*quantity))
        .sum();

    CheckoutPart {
        commerce_command: CommerceCommand {
            id: commerce_command_id,
            command_id: command.id.clone(),
            commerce_id: commerce_id.clone(),
            user_id: command.user_id.clone(),
            pickup_date,
            price: cc_price + panier_price,
            payment_method: PaymentMethod::OnSite,
            status: CommandStatus::InProgress,
            transferred: false,
            created_at: command.created_at,
        },
        cc_command,
        panier_commands,
    }
}

/// Places a checkout with one click-and-collect line per commerce.
pub fn create_test_checkout(
    persistence: &mut Persistence,
    user_id: &EntityId,
    lines: &[(&EntityId, &Product)],
) -> CheckoutData {
    let command: Command = build_test_command(user_id);
    let parts: Vec<CheckoutPart> = lines
        .iter()
        .map(|(commerce_id, product)| build_test_part(&command, commerce_id, Some(product), &[]))
        .collect();
    let checkout: CheckoutData = CheckoutData { command, parts };
    persistence
        .create_checkout(&checkout)
        .expect("Failed to create checkout");
    checkout
}
