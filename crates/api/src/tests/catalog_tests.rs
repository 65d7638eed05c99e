// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use localmarket_domain::{EntityId, PanierItem, PanierPatch, ProductPatch};

use super::{
    Marketplace, create_test_commerce, create_test_marketplace, create_test_panier,
    create_test_product, create_test_product_input, create_test_storekeeper,
};
use crate::{
    ApiError, AuthenticatedUser, CreatePanierRequest, CreateProductRequest,
    CreateProductsRequest, IdRequest, ListPaniersRequest, ListProductsRequest, PageArgs,
    PanierConnection, PanierView, ProductConnection, ProductView, UpdatePanierRequest,
    UpdateProductRequest, UpdateProductsRequest, create_panier, create_product, create_products,
    get_product, list_paniers, list_products, update_panier, update_product, update_products,
};

fn list_page(market: &mut Marketplace, after: Option<String>) -> ProductConnection {
    list_products(
        &mut market.persistence,
        &ListProductsRequest {
            commerce_id: Some(market.commerce.id.clone()),
            category: None,
            tag: None,
            is_available: None,
            page: PageArgs {
                first: Some(2),
                after,
            },
        },
    )
    .unwrap()
}

#[test]
fn test_product_listing_pages_forward() {
    let mut market: Marketplace = create_test_marketplace();
    let storekeeper: AuthenticatedUser = market.storekeeper.clone();
    for (name, price) in [("Eggs", 420), ("Honey", 850), ("Apples", 300)] {
        create_test_product(&mut market.persistence, &storekeeper, name, price);
    }

    let first: ProductConnection = list_page(&mut market, None);
    assert_eq!(first.total_count, 3);
    assert_eq!(first.edges.len(), 2);
    assert!(first.page_info.has_next_page);
    assert_eq!(first.page_info.start_cursor, first.edges[0].cursor);

    let second: ProductConnection =
        list_page(&mut market, Some(first.page_info.end_cursor.clone()));
    assert_eq!(second.edges.len(), 1);
    assert!(!second.page_info.has_next_page);

    let mut names: Vec<String> = first
        .nodes()
        .into_iter()
        .chain(second.nodes())
        .map(|product| product.name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Apples", "Eggs", "Honey"]);
}

#[test]
fn test_malformed_cursor_is_invalid_input() {
    let mut market: Marketplace = create_test_marketplace();

    let result = list_products(
        &mut market.persistence,
        &ListProductsRequest {
            commerce_id: None,
            category: None,
            tag: None,
            is_available: None,
            page: PageArgs {
                first: None,
                after: Some(String::from("not a cursor")),
            },
        },
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { ref field, .. }) if field == "after"));
}

#[test]
fn test_plain_user_cannot_create_product() {
    let mut market: Marketplace = create_test_marketplace();

    let result = create_product(
        &mut market.persistence,
        Some(&market.buyer),
        CreateProductRequest {
            commerce_id: None,
            product: create_test_product_input("Eggs", 420),
        },
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_storekeeper_cannot_create_under_another_commerce() {
    let mut market: Marketplace = create_test_marketplace();
    let other: AuthenticatedUser = create_test_storekeeper(
        &mut market.persistence,
        &market.integrations,
        &market.admin,
        "other@example.com",
    );
    create_test_commerce(&mut market.persistence, &other);

    let result = create_product(
        &mut market.persistence,
        Some(&other),
        CreateProductRequest {
            commerce_id: Some(market.commerce.id.clone()),
            product: create_test_product_input("Eggs", 420),
        },
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_batch_create_is_all_or_nothing() {
    let mut market: Marketplace = create_test_marketplace();

    let result = create_products(
        &mut market.persistence,
        Some(&market.storekeeper),
        CreateProductsRequest {
            commerce_id: None,
            products: vec![
                create_test_product_input("Eggs", 420),
                create_test_product_input("Honey", -1),
            ],
        },
    );

    let Err(ApiError::InvalidInput { field, .. }) = result else {
        panic!("Expected InvalidInput, got {result:?}");
    };
    assert!(field.starts_with("products[1]."));

    let listed: ProductConnection = list_page(&mut market, None);
    assert_eq!(listed.total_count, 0);
}

#[test]
fn test_batch_update_rejects_duplicates() {
    let mut market: Marketplace = create_test_marketplace();
    let storekeeper: AuthenticatedUser = market.storekeeper.clone();
    let product: ProductView =
        create_test_product(&mut market.persistence, &storekeeper, "Eggs", 420);
    let update = UpdateProductRequest {
        id: product.id.clone(),
        patch: ProductPatch {
            price: Some(450),
            ..ProductPatch::default()
        },
    };

    let result = update_products(
        &mut market.persistence,
        Some(&storekeeper),
        &UpdateProductsRequest {
            products: vec![update.clone(), update],
        },
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    let stored: ProductView = get_product(
        &mut market.persistence,
        &IdRequest {
            id: product.id.clone(),
        },
    )
    .unwrap();
    assert_eq!(stored.price, 420);
}

#[test]
fn test_update_product_applies_patch() {
    let mut market: Marketplace = create_test_marketplace();
    let storekeeper: AuthenticatedUser = market.storekeeper.clone();
    let product: ProductView =
        create_test_product(&mut market.persistence, &storekeeper, "Eggs", 420);

    let updated: ProductView = update_product(
        &mut market.persistence,
        Some(&storekeeper),
        &UpdateProductRequest {
            id: product.id.clone(),
            patch: ProductPatch {
                is_available: Some(false),
                tags: Some(vec![String::from("plein-air")]),
                ..ProductPatch::default()
            },
        },
    )
    .unwrap();

    assert!(!updated.is_available);
    assert_eq!(updated.tags, vec!["plein-air"]);
    assert_eq!(updated.price, 420);
}

#[test]
fn test_buyer_cannot_update_product() {
    let mut market: Marketplace = create_test_marketplace();
    let storekeeper: AuthenticatedUser = market.storekeeper.clone();
    let product: ProductView =
        create_test_product(&mut market.persistence, &storekeeper, "Eggs", 420);

    let result = update_product(
        &mut market.persistence,
        Some(&market.buyer),
        &UpdateProductRequest {
            id: product.id,
            patch: ProductPatch::default(),
        },
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_panier_items_must_belong_to_the_commerce() {
    let mut market: Marketplace = create_test_marketplace();
    let other: AuthenticatedUser = create_test_storekeeper(
        &mut market.persistence,
        &market.integrations,
        &market.admin,
        "other@example.com",
    );
    create_test_commerce(&mut market.persistence, &other);
    let foreign: ProductView = create_test_product(&mut market.persistence, &other, "Cheese", 600);

    let result = create_panier(
        &mut market.persistence,
        Some(&market.storekeeper),
        CreatePanierRequest {
            commerce_id: None,
            name: String::from("Plateau"),
            description: String::new(),
            price: 2_000,
            items: vec![PanierItem {
                product_id: EntityId::parse(&foreign.id).unwrap(),
                quantity: 1,
            }],
            quantity: 3,
            image: None,
        },
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { ref field, .. }) if field == "items"));
}

#[test]
fn test_panier_stock_filter() {
    let mut market: Marketplace = create_test_marketplace();
    let storekeeper: AuthenticatedUser = market.storekeeper.clone();
    let product: ProductView =
        create_test_product(&mut market.persistence, &storekeeper, "Eggs", 420);
    let stocked: PanierView =
        create_test_panier(&mut market.persistence, &storekeeper, &product, 5);
    let sold_out: PanierView =
        create_test_panier(&mut market.persistence, &storekeeper, &product, 1);

    let emptied: PanierView = update_panier(
        &mut market.persistence,
        Some(&storekeeper),
        &UpdatePanierRequest {
            id: sold_out.id.clone(),
            patch: PanierPatch {
                quantity: Some(0),
                ..PanierPatch::default()
            },
        },
    )
    .unwrap();
    assert_eq!(emptied.quantity, 0);

    let in_stock: PanierConnection = list_paniers(
        &mut market.persistence,
        &ListPaniersRequest {
            commerce_id: Some(market.commerce.id.clone()),
            in_stock: Some(true),
            page: PageArgs::default(),
        },
    )
    .unwrap();

    assert_eq!(in_stock.total_count, 1);
    assert_eq!(in_stock.edges[0].node.id, stocked.id);
}
