// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test module for the API crate.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod catalog_tests;
mod user_tests;

use localmarket_domain::{Address, GeoPoint, Role, ServiceTier, User};
use localmarket_persistence::{NewUserData, Persistence};
use time::{Date, Duration, Month};

use crate::{
    ApiConfig, AuthenticatedUser, CommerceView, CreateCommerceRequest, CreatePanierRequest,
    CreateProductRequest, CreateUserRequest, Integrations, PanierView, ProductInput, ProductView,
    Recorder, ServiceRequest, UserView, create_commerce, create_panier, create_product,
    create_user,
};

pub const TEST_PASSWORD: &str = "Correct-Horse-42";

/// Lowest cost bcrypt accepts; keeps password hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Opens an isolated in-memory database with the cheapest bcrypt cost.
pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory()
        .expect("Failed to open in-memory database")
        .with_password_cost(TEST_BCRYPT_COST)
}

/// Returns 2026-01-01, the day test commerces open.
pub fn create_test_today() -> Date {
    Date::from_calendar_date(2026, Month::January, 1).expect("Valid test date")
}

/// Returns the first day a commerce opened on [`create_test_today`] is due.
pub fn create_test_billing_day() -> Date {
    create_test_today() + Duration::days(30)
}

/// Returns a pickup timestamp one week from now.
pub fn create_test_pickup_date() -> String {
    localmarket_domain::format_timestamp(
        localmarket_domain::current_timestamp() + Duration::days(7),
    )
}

/// Inserts an administrator directly; no operation creates the first one.
pub fn create_test_admin(persistence: &mut Persistence) -> AuthenticatedUser {
    let admin: User = persistence
        .create_user(&NewUserData {
            email: String::from("admin@example.com"),
            password: TEST_PASSWORD.to_string(),
            first_name: String::from("Ada"),
            last_name: String::from("Admin"),
            phone: None,
            role: Role::Admin,
            payment_customer_id: None,
        })
        .expect("Failed to create admin");
    AuthenticatedUser::from_user(&admin)
}

pub fn create_test_user_request(email: &str, role: Option<Role>) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        first_name: String::from("Camille"),
        last_name: String::from("Martin"),
        phone: Some(String::from("0601020304")),
        role,
    }
}

/// Registers a buyer through the public operation.
pub fn create_test_user(
    persistence: &mut Persistence,
    integrations: &Integrations,
    email: &str,
) -> AuthenticatedUser {
    let view: UserView = create_user(
        persistence,
        integrations,
        &ApiConfig::default(),
        None,
        create_test_user_request(email, None),
    )
    .expect("Failed to create user");
    authenticated(persistence, &view.id)
}

/// Creates a storekeeper account on behalf of an administrator.
pub fn create_test_storekeeper(
    persistence: &mut Persistence,
    integrations: &Integrations,
    admin: &AuthenticatedUser,
    email: &str,
) -> AuthenticatedUser {
    let view: UserView = create_user(
        persistence,
        integrations,
        &ApiConfig::default(),
        Some(admin),
        create_test_user_request(email, Some(Role::Storekeeper)),
    )
    .expect("Failed to create storekeeper");
    authenticated(persistence, &view.id)
}

pub fn authenticated(persistence: &mut Persistence, id: &str) -> AuthenticatedUser {
    let id = localmarket_domain::EntityId::parse(id).expect("Valid id");
    let user: User = persistence
        .get_user_by_id(&id)
        .unwrap()
        .expect("User should exist");
    AuthenticatedUser::from_user(&user)
}

pub fn create_test_commerce_request(services: Vec<ServiceRequest>) -> CreateCommerceRequest {
    CreateCommerceRequest {
        storekeeper_id: None,
        name: String::from("La Ferme du Coin"),
        description: String::from("Fresh local produce"),
        email: String::from("ferme@example.com"),
        phone: String::from("0478000000"),
        address: Address {
            street: String::from("1 rue du Marché"),
            postal_code: String::from("69001"),
            city: String::from("Lyon"),
            country: String::from("France"),
        },
        position: GeoPoint {
            latitude: 45.76,
            longitude: 4.83,
        },
        image: None,
        banking: None,
        services,
    }
}

/// Opens a commerce on [`create_test_today`] with a monthly click-and-collect
/// subscription.
pub fn create_test_commerce(
    persistence: &mut Persistence,
    storekeeper: &AuthenticatedUser,
) -> CommerceView {
    create_commerce(
        persistence,
        &ApiConfig::default(),
        Some(storekeeper),
        create_test_commerce_request(vec![ServiceRequest {
            service: String::from("CLICKANDCOLLECT"),
            tier: ServiceTier::Monthly,
        }]),
        create_test_today(),
    )
    .expect("Failed to create commerce")
}

pub fn create_test_product_input(name: &str, price: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: String::new(),
        price,
        tax_rate: 5.5,
        category: String::from("Épicerie"),
        tags: vec![String::from("bio")],
        image: None,
        is_available: true,
    }
}

pub fn create_test_product(
    persistence: &mut Persistence,
    storekeeper: &AuthenticatedUser,
    name: &str,
    price: i64,
) -> ProductView {
    create_product(
        persistence,
        Some(storekeeper),
        CreateProductRequest {
            commerce_id: None,
            product: create_test_product_input(name, price),
        },
    )
    .expect("Failed to create product")
}

pub fn create_test_panier(
    persistence: &mut Persistence,
    storekeeper: &AuthenticatedUser,
    product: &ProductView,
    quantity: i64,
) -> PanierView {
    create_panier(
        persistence,
        Some(storekeeper),
        CreatePanierRequest {
            commerce_id: None,
            name: String::from("Panier de saison"),
            description: String::new(),
            price: 1_800,
            items: vec![localmarket_domain::PanierItem {
                product_id: localmarket_domain::EntityId::parse(&product.id).expect("Valid id"),
                quantity: 2,
            }],
            quantity,
            image: None,
        },
    )
    .expect("Failed to create panier")
}

/// Everything most order and routine tests need.
pub struct Marketplace {
    pub persistence: Persistence,
    pub recorder: Recorder,
    pub integrations: Integrations,
    pub admin: AuthenticatedUser,
    pub storekeeper: AuthenticatedUser,
    pub commerce: CommerceView,
    pub buyer: AuthenticatedUser,
}

pub fn create_test_marketplace() -> Marketplace {
    let mut persistence: Persistence = create_test_persistence();
    let recorder: Recorder = Recorder::new();
    let integrations: Integrations = recorder.integrations();
    let admin: AuthenticatedUser = create_test_admin(&mut persistence);
    let storekeeper: AuthenticatedUser =
        create_test_storekeeper(&mut persistence, &integrations, &admin, "shop@example.com");
    let commerce: CommerceView = create_test_commerce(&mut persistence, &storekeeper);
    let buyer: AuthenticatedUser =
        create_test_user(&mut persistence, &integrations, "buyer@example.com");

    Marketplace {
        persistence,
        recorder,
        integrations,
        admin,
        storekeeper,
        commerce,
        buyer,
    }
}
